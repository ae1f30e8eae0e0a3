use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub result: String,
}

const PROMPT_KEYWORDS: &[&str] = &["add", "create", "generate", "build", "make", "edit"];

/// The prompt must either be a pre-tokenized argument string (`--project …`)
/// or free text that plausibly asks for generation or an edit.
pub fn validate_prompt(prompt: &str) -> Result<(), String> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err("prompt is required".to_string());
    }
    let lower = trimmed.to_lowercase();
    if trimmed.starts_with("--") || PROMPT_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Ok(())
    } else {
        Err("prompt does not look like a generation request".to_string())
    }
}

/// POST /api/generate — validate the prompt and hand it to the CLI as a
/// subprocess, returning its stdout. The server stays a thin facade; the
/// pipeline itself runs in the spawned process.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    validate_prompt(&request.prompt).map_err(AppError::bad_request)?;

    tracing::info!(prompt = %request.prompt, "dispatching generation to cli");
    let output = tokio::process::Command::new(&state.cli_bin)
        .arg("--projects-root")
        .arg(&state.projects_root)
        .arg("prompt")
        .arg(&request.prompt)
        .output()
        .await
        .map_err(|e| anyhow::anyhow!("failed to spawn {}: {e}", state.cli_bin.display()))?;

    if output.status.success() {
        Ok(Json(GenerateResponse {
            result: String::from_utf8_lossy(&output.stdout).into_owned(),
        }))
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(AppError(anyhow::anyhow!(
            "generation failed: {}",
            stderr.trim()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_argument_style_prompts() {
        validate_prompt("--project todo --framework flask --features auth").unwrap();
    }

    #[test]
    fn accepts_keyword_prompts() {
        validate_prompt("create a todo app with auth").unwrap();
        validate_prompt("Add a dark mode toggle").unwrap();
        validate_prompt("edit project todo and fix the header").unwrap();
    }

    #[test]
    fn rejects_empty_prompt() {
        assert!(validate_prompt("   ").is_err());
    }

    #[test]
    fn rejects_unrelated_text() {
        assert!(validate_prompt("what is the weather today?").is_err());
    }
}
