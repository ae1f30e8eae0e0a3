//! Framework-specific shell commands for testing and deploying generated
//! projects, plus git bootstrap for the deploy step.
//!
//! Commands run through `sh -c` in the project directory with captured
//! output. Stage policy lives with the caller: a failing test run is
//! reported, not raised.

use crate::error::{FactoryError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use std::str::FromStr;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Framework
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Framework {
    #[serde(rename = "nextjs")]
    NextJs,
    #[serde(rename = "flask")]
    Flask,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::NextJs => "Next.js",
            Framework::Flask => "Flask",
        }
    }

    /// The command that installs dependencies and runs the generated tests.
    pub fn test_command(&self) -> &'static str {
        match self {
            Framework::NextJs => "npm install && npm test",
            Framework::Flask => "pip install -r requirements.txt && pytest",
        }
    }

    /// The command that deploys to the framework's default platform.
    pub fn deploy_command(&self) -> &'static str {
        match self {
            Framework::NextJs => "vercel --prod",
            Framework::Flask => "render deploy",
        }
    }
}

impl FromStr for Framework {
    type Err = FactoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "next.js" | "nextjs" | "next" => Ok(Framework::NextJs),
            "flask" => Ok(Framework::Flask),
            other => Err(FactoryError::UnknownFramework(other.to_string())),
        }
    }
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Shell execution
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Run `command` through `sh -c` in `dir`, capturing output. A non-zero exit
/// is returned in the output, not as an error; only a spawn failure errors.
pub fn run_shell(dir: &Path, command: &str) -> Result<CommandOutput> {
    tracing::info!(command, dir = %dir.display(), "running shell command");
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(dir)
        .output()
        .map_err(|e| FactoryError::CommandFailed {
            command: command.to_string(),
            message: e.to_string(),
        })?;

    let result = CommandOutput {
        status: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    if !result.success() {
        tracing::warn!(command, status = result.status, "shell command exited non-zero");
    }
    Ok(result)
}

/// Initialize a git repository in `dir` and commit everything in it.
///
/// Best-effort: `git init` on an existing repository is harmless, and a
/// failing commit (nothing staged, unset identity) is logged, not raised.
/// Only a missing `git` binary or a spawn failure is an error.
pub fn git_bootstrap(dir: &Path) -> Result<()> {
    which::which("git").map_err(|_| FactoryError::ToolMissing("git".to_string()))?;

    for command in ["git init", "git add .", "git commit -m \"Initial commit\""] {
        let output = run_shell(dir, command)?;
        if !output.success() {
            tracing::warn!(command, stderr = %output.stderr.trim(), "git step did not succeed");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Deployment URL extraction
// ---------------------------------------------------------------------------

static URL_RE: OnceLock<Regex> = OnceLock::new();

fn url_re() -> &'static Regex {
    URL_RE.get_or_init(|| Regex::new(r"https://[^\s]+").unwrap())
}

/// Scan deploy command output for the resulting deployment URL. Deploy CLIs
/// print many URLs (docs, dashboards); only production hosts count.
pub fn extract_deployment_url(output: &str) -> Option<String> {
    url_re()
        .find_iter(output)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ')', ']', '"']))
        .find(|url| url.contains(".vercel.app") || url.contains(".onrender.com"))
        .map(|url| url.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn framework_parses_common_spellings() {
        assert_eq!(Framework::from_str("Next.js").unwrap(), Framework::NextJs);
        assert_eq!(Framework::from_str("nextjs").unwrap(), Framework::NextJs);
        assert_eq!(Framework::from_str("NEXT").unwrap(), Framework::NextJs);
        assert_eq!(Framework::from_str("flask").unwrap(), Framework::Flask);
        assert!(Framework::from_str("django").is_err());
    }

    #[test]
    fn framework_commands_are_stable() {
        assert_eq!(Framework::NextJs.test_command(), "npm install && npm test");
        assert_eq!(
            Framework::Flask.test_command(),
            "pip install -r requirements.txt && pytest"
        );
        assert_eq!(Framework::NextJs.deploy_command(), "vercel --prod");
        assert_eq!(Framework::Flask.deploy_command(), "render deploy");
    }

    #[test]
    fn run_shell_captures_stdout() {
        let dir = TempDir::new().unwrap();
        let out = run_shell(dir.path(), "echo hello").unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[test]
    fn run_shell_nonzero_exit_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let out = run_shell(dir.path(), "exit 3").unwrap();
        assert!(!out.success());
        assert_eq!(out.status, 3);
    }

    #[test]
    fn run_shell_runs_in_given_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
        let out = run_shell(dir.path(), "ls").unwrap();
        assert!(out.stdout.contains("marker.txt"));
    }

    #[test]
    fn extracts_vercel_url() {
        let output = "Inspect: https://vercel.com/acme/todo/xyz\n\
                      Production: https://todo-acme.vercel.app [2s]";
        assert_eq!(
            extract_deployment_url(output).as_deref(),
            Some("https://todo-acme.vercel.app")
        );
    }

    #[test]
    fn extracts_render_url() {
        let output = "deployed to https://todo.onrender.com.";
        assert_eq!(
            extract_deployment_url(output).as_deref(),
            Some("https://todo.onrender.com")
        );
    }

    #[test]
    fn no_production_url_is_none() {
        assert!(extract_deployment_url("see https://example.com/docs").is_none());
        assert!(extract_deployment_url("no urls at all").is_none());
    }
}
