use serde::{Deserialize, Serialize};
use std::time::Duration;

// ─── RoleSpec ─────────────────────────────────────────────────────────────

/// An agent role as a data-only record: no behavior, no hierarchy. The
/// generic runner folds these fields into the prompt it sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSpec {
    pub role: String,
    pub goal: String,
    #[serde(default)]
    pub backstory: String,
}

impl RoleSpec {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
        }
    }
}

// ─── TaskSpec ─────────────────────────────────────────────────────────────

/// One unit of work for an agent: what to do and what shape the answer
/// should take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub description: String,
    pub expected_output: String,
}

impl TaskSpec {
    pub fn new(description: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
        }
    }
}

// ─── AgentOptions ─────────────────────────────────────────────────────────

/// How to reach the agent CLI and how hard to retry it. Passed explicitly to
/// the runner; there is no process-wide agent handle.
#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// The agent CLI binary.
    pub command: String,
    pub model: Option<String>,
    /// Extra arguments appended after the built-in ones.
    pub extra_args: Vec<String>,
    /// Total attempts when the provider reports quota exhaustion.
    pub max_attempts: u32,
    /// Pause between quota retries.
    pub retry_delay: Duration,
    /// Requests per minute across one pipeline run.
    pub max_rpm: Option<u32>,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            model: None,
            extra_args: Vec::new(),
            max_attempts: 3,
            retry_delay: Duration::from_secs(60),
            max_rpm: Some(10),
        }
    }
}

impl AgentOptions {
    /// Options from the environment: `WEBFACTORY_AGENT_CMD` overrides the
    /// binary, `WEBFACTORY_AGENT_MODEL` the model, and
    /// `WEBFACTORY_AGENT_RPM` the request rate (0 disables limiting).
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        if let Ok(cmd) = std::env::var("WEBFACTORY_AGENT_CMD") {
            if !cmd.is_empty() {
                opts.command = cmd;
            }
        }
        if let Ok(model) = std::env::var("WEBFACTORY_AGENT_MODEL") {
            if !model.is_empty() {
                opts.model = Some(model);
            }
        }
        if let Ok(rpm) = std::env::var("WEBFACTORY_AGENT_RPM") {
            if let Ok(rpm) = rpm.parse::<u32>() {
                opts.max_rpm = if rpm == 0 { None } else { Some(rpm) };
            }
        }
        opts
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_expectations() {
        let opts = AgentOptions::default();
        assert_eq!(opts.command, "claude");
        assert_eq!(opts.max_attempts, 3);
        assert_eq!(opts.retry_delay, Duration::from_secs(60));
        assert_eq!(opts.max_rpm, Some(10));
    }

    #[test]
    fn role_and_task_constructors() {
        let role = RoleSpec::new("Code Generator", "Generate code", "Seasoned engineer");
        assert_eq!(role.role, "Code Generator");
        assert_eq!(role.backstory, "Seasoned engineer");

        let task = TaskSpec::new("do it", "done");
        assert_eq!(task.description, "do it");
        assert_eq!(task.expected_output, "done");
    }
}
