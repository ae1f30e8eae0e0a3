use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{AgentError, Result};
use crate::types::AgentOptions;

// ─── AgentExec ────────────────────────────────────────────────────────────

/// Seam between the runner and the real agent CLI, so pipeline logic can be
/// tested against scripted executors.
pub trait AgentExec {
    /// Drive one prompt to completion and return the agent's final text.
    fn execute(&self, prompt: &str) -> Result<String>;
}

// ─── CliAgent ─────────────────────────────────────────────────────────────

/// Runs the agent CLI as a blocking subprocess: prompt on stdin, final text
/// on stdout. Stderr is captured and surfaced when the process fails.
#[derive(Debug, Clone)]
pub struct CliAgent {
    command: String,
    args: Vec<String>,
    workdir: Option<std::path::PathBuf>,
}

impl CliAgent {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            workdir: None,
        }
    }

    /// Build the standard invocation from options:
    /// `<command> --print [--model <m>] <extra args…>`.
    pub fn from_options(opts: &AgentOptions) -> Self {
        let mut args = vec!["--print".to_string()];
        if let Some(model) = &opts.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        args.extend(opts.extra_args.iter().cloned());
        Self::new(opts.command.clone(), args)
    }

    pub fn in_dir(mut self, dir: &Path) -> Self {
        self.workdir = Some(dir.to_path_buf());
        self
    }
}

impl AgentExec for CliAgent {
    fn execute(&self, prompt: &str) -> Result<String> {
        tracing::debug!(command = %self.command, "spawning agent subprocess");

        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| AgentError::Spawn {
            command: self.command.clone(),
            message: e.to_string(),
        })?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(prompt.as_bytes())?;
        }
        // Drop stdin so the agent sees EOF and starts the turn.
        drop(child.stdin.take());

        let output = child.wait_with_output()?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let hint: String = if stderr.trim().is_empty() {
                stdout.chars().take(500).collect()
            } else {
                stderr.chars().take(500).collect()
            };
            return Err(AgentError::TaskFailed(format!(
                "agent exited with {}: {}",
                output.status,
                hint.trim()
            )));
        }

        Ok(stdout)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_from_subprocess() {
        // `cat` echoes the prompt back, standing in for a real agent.
        let agent = CliAgent::new("cat", vec![]);
        let out = agent.execute("--- f.txt ---\nhello").unwrap();
        assert_eq!(out, "--- f.txt ---\nhello");
    }

    #[test]
    fn nonzero_exit_surfaces_stderr() {
        let agent = CliAgent::new(
            "sh",
            vec!["-c".to_string(), "echo boom >&2; exit 1".to_string()],
        );
        let err = agent.execute("ignored").unwrap_err();
        match err {
            AgentError::TaskFailed(msg) => assert!(msg.contains("boom")),
            other => panic!("expected TaskFailed, got {other:?}"),
        }
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let agent = CliAgent::new("__no_such_agent_binary__", vec![]);
        let err = agent.execute("hi").unwrap_err();
        assert!(matches!(err, AgentError::Spawn { .. }));
    }

    #[test]
    fn from_options_builds_print_invocation() {
        let opts = AgentOptions {
            model: Some("sonnet".to_string()),
            extra_args: vec!["--max-turns".to_string(), "10".to_string()],
            ..AgentOptions::default()
        };
        let agent = CliAgent::from_options(&opts);
        assert_eq!(agent.command, "claude");
        assert_eq!(
            agent.args,
            vec!["--print", "--model", "sonnet", "--max-turns", "10"]
        );
    }

    #[test]
    fn runs_in_requested_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let agent = CliAgent::new("pwd", vec![]).in_dir(dir.path());
        let out = agent.execute("").unwrap();
        assert_eq!(
            std::fs::canonicalize(out.trim()).unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }
}
