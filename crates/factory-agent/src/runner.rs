use std::time::{Duration, Instant};

use crate::error::{AgentError, Result};
use crate::exec::AgentExec;
use crate::types::{AgentOptions, RoleSpec, TaskSpec};

// ─── RateLimiter ──────────────────────────────────────────────────────────

/// Spaces agent calls to a requests-per-minute limit. One limiter is shared
/// across a pipeline run and passed explicitly to each task.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last: Option<Instant>,
}

impl RateLimiter {
    pub fn new(max_rpm: u32) -> Self {
        let min_interval = if max_rpm == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(60.0 / f64::from(max_rpm))
        };
        Self {
            min_interval,
            last: None,
        }
    }

    pub fn unlimited() -> Self {
        Self {
            min_interval: Duration::ZERO,
            last: None,
        }
    }

    pub fn from_options(opts: &AgentOptions) -> Self {
        match opts.max_rpm {
            Some(rpm) => Self::new(rpm),
            None => Self::unlimited(),
        }
    }

    /// Block until the next call is allowed, then stamp it.
    pub fn wait(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                std::thread::sleep(self.min_interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

// ─── Prompt composition ───────────────────────────────────────────────────

/// Fold a role record and a task into the single prompt the agent CLI
/// receives. Roles carry no behavior of their own.
pub fn compose_prompt(role: &RoleSpec, task: &TaskSpec) -> String {
    let mut prompt = format!("You are a {}. Your goal: {}", role.role, role.goal);
    if !role.backstory.is_empty() {
        prompt.push_str(&format!("\nBackground: {}", role.backstory));
    }
    prompt.push_str(&format!(
        "\n\nTask:\n{}\n\nExpected output:\n{}",
        task.description, task.expected_output
    ));
    prompt
}

// ─── Quota detection ──────────────────────────────────────────────────────

/// Whether an error message indicates provider quota/rate exhaustion, the
/// one failure class worth retrying after a pause.
pub fn is_quota_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    message.contains("ResourceExhausted")
        || message.contains("429")
        || lower.contains("quota")
        || lower.contains("rate limit")
}

// ─── run_task ─────────────────────────────────────────────────────────────

/// Drive one role/task pair to completion through `exec`, retrying quota
/// failures up to `opts.max_attempts` with `opts.retry_delay` between tries.
/// Non-quota failures propagate immediately.
pub fn run_task(
    exec: &dyn AgentExec,
    limiter: &mut RateLimiter,
    opts: &AgentOptions,
    role: &RoleSpec,
    task: &TaskSpec,
) -> Result<String> {
    let prompt = compose_prompt(role, task);
    let attempts = opts.max_attempts.max(1);

    for attempt in 1..=attempts {
        limiter.wait();
        tracing::info!(role = %role.role, attempt, "running agent task");
        match exec.execute(&prompt) {
            Ok(text) => return Ok(text),
            Err(e) if is_quota_error(&e.to_string()) && attempt < attempts => {
                tracing::warn!(
                    role = %role.role,
                    attempt,
                    delay_secs = opts.retry_delay.as_secs(),
                    "provider quota exceeded; waiting before retry"
                );
                std::thread::sleep(opts.retry_delay);
            }
            Err(e) if is_quota_error(&e.to_string()) => {
                return Err(AgentError::QuotaExhausted { attempts });
            }
            Err(e) => return Err(e),
        }
    }
    Err(AgentError::QuotaExhausted { attempts })
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Scripted executor: pops one canned response per call.
    struct Scripted {
        responses: RefCell<Vec<Result<String>>>,
        calls: RefCell<u32>,
    }

    impl Scripted {
        fn new(mut responses: Vec<Result<String>>) -> Self {
            responses.reverse();
            Self {
                responses: RefCell::new(responses),
                calls: RefCell::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            *self.calls.borrow()
        }
    }

    impl AgentExec for Scripted {
        fn execute(&self, _prompt: &str) -> Result<String> {
            *self.calls.borrow_mut() += 1;
            self.responses
                .borrow_mut()
                .pop()
                .unwrap_or_else(|| Err(AgentError::TaskFailed("script exhausted".into())))
        }
    }

    fn fast_opts() -> AgentOptions {
        AgentOptions {
            max_attempts: 3,
            retry_delay: Duration::ZERO,
            max_rpm: None,
            ..AgentOptions::default()
        }
    }

    fn role() -> RoleSpec {
        RoleSpec::new("Code Generator", "Generate code", "Experienced developer")
    }

    fn task() -> TaskSpec {
        TaskSpec::new("Generate the files", "Sentinel-delimited file blocks")
    }

    #[test]
    fn compose_prompt_includes_role_and_task() {
        let prompt = compose_prompt(&role(), &task());
        assert!(prompt.contains("You are a Code Generator"));
        assert!(prompt.contains("Background: Experienced developer"));
        assert!(prompt.contains("Generate the files"));
        assert!(prompt.contains("Sentinel-delimited file blocks"));
    }

    #[test]
    fn compose_prompt_omits_empty_backstory() {
        let role = RoleSpec::new("Planner", "Plan", "");
        assert!(!compose_prompt(&role, &task()).contains("Background:"));
    }

    #[test]
    fn quota_error_detection() {
        assert!(is_quota_error("429 ResourceExhausted: quota exceeded"));
        assert!(is_quota_error("agent task failed: ResourceExhausted"));
        assert!(is_quota_error("Rate limit reached, slow down"));
        assert!(!is_quota_error("syntax error in generated file"));
    }

    #[test]
    fn success_on_first_attempt() {
        let exec = Scripted::new(vec![Ok("result text".into())]);
        let mut limiter = RateLimiter::unlimited();
        let out = run_task(&exec, &mut limiter, &fast_opts(), &role(), &task()).unwrap();
        assert_eq!(out, "result text");
        assert_eq!(exec.call_count(), 1);
    }

    #[test]
    fn quota_error_retries_then_succeeds() {
        let exec = Scripted::new(vec![
            Err(AgentError::TaskFailed("ResourceExhausted".into())),
            Err(AgentError::TaskFailed("429 too many requests".into())),
            Ok("eventually".into()),
        ]);
        let mut limiter = RateLimiter::unlimited();
        let out = run_task(&exec, &mut limiter, &fast_opts(), &role(), &task()).unwrap();
        assert_eq!(out, "eventually");
        assert_eq!(exec.call_count(), 3);
    }

    #[test]
    fn quota_errors_exhaust_attempts() {
        let exec = Scripted::new(vec![
            Err(AgentError::TaskFailed("ResourceExhausted".into())),
            Err(AgentError::TaskFailed("ResourceExhausted".into())),
            Err(AgentError::TaskFailed("ResourceExhausted".into())),
        ]);
        let mut limiter = RateLimiter::unlimited();
        let err = run_task(&exec, &mut limiter, &fast_opts(), &role(), &task()).unwrap_err();
        assert!(matches!(err, AgentError::QuotaExhausted { attempts: 3 }));
        assert_eq!(exec.call_count(), 3);
    }

    #[test]
    fn non_quota_error_fails_fast() {
        let exec = Scripted::new(vec![Err(AgentError::TaskFailed("model refused".into()))]);
        let mut limiter = RateLimiter::unlimited();
        let err = run_task(&exec, &mut limiter, &fast_opts(), &role(), &task()).unwrap_err();
        assert!(matches!(err, AgentError::TaskFailed(_)));
        assert_eq!(exec.call_count(), 1);
    }

    #[test]
    fn rate_limiter_spaces_calls() {
        // 6000 rpm → 10ms interval; two waits must span at least one interval.
        let mut limiter = RateLimiter::new(6000);
        limiter.wait();
        let start = Instant::now();
        limiter.wait();
        assert!(start.elapsed() >= Duration::from_millis(9));
    }

    #[test]
    fn unlimited_limiter_does_not_block() {
        let mut limiter = RateLimiter::unlimited();
        let start = Instant::now();
        limiter.wait();
        limiter.wait();
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
