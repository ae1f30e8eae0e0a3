//! Edit mode: run the project editor agent against an existing project and
//! materialize whichever files it returns.

use anyhow::Context;
use factory_agent::{roles, run_task, AgentOptions, CliAgent, RateLimiter, RoleSpec, TaskSpec};
use factory_core::config::RolesFile;
use factory_core::materialize::{self, SkippedFile};
use factory_core::runs::{RunStatus, RunStore};
use factory_core::{blocks, io, paths, webhook};
use serde::Serialize;
use std::path::Path;

use crate::output;

#[derive(Debug, Serialize)]
struct EditSummary {
    status: String,
    project_name: String,
    changes: String,
    files_written: Vec<String>,
    files_skipped: Vec<SkippedFile>,
}

pub fn run(
    projects_root: &Path,
    project: &str,
    changes: &str,
    roles_path: Option<&Path>,
) -> anyhow::Result<()> {
    anyhow::ensure!(!changes.trim().is_empty(), "--changes must not be empty");
    paths::validate_project_name(project)?;

    let project_dir = paths::project_dir(projects_root, project);
    if !project_dir.exists() {
        tracing::warn!(dir = %project_dir.display(), "project directory does not exist; creating");
    }
    io::ensure_dir(&project_dir)
        .with_context(|| format!("cannot prepare project directory {}", project_dir.display()))?;

    // Framework context from the run history, when this project was
    // generated here before.
    let store = RunStore::open(&paths::runs_db_path(projects_root))?;
    let metadata = store.latest_for_project(project)?;
    let framework = metadata
        .as_ref()
        .map(|m| m.framework.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let run_id = store.record_start(project, &framework, changes)?;

    let role = editor_role(roles_path)?;
    let task = edit_task(project, &project_dir, changes, metadata.as_ref());

    let opts = AgentOptions::from_env();
    let exec = CliAgent::from_options(&opts).in_dir(&project_dir);
    let mut limiter = RateLimiter::from_options(&opts);

    tracing::info!(%project, "starting edit");
    let raw = match run_task(&exec, &mut limiter, &opts, &role, &task) {
        Ok(raw) => raw,
        Err(e) => {
            let notes = format!("{e:#}");
            if let Err(db_err) = store.mark_failed(run_id, &notes) {
                tracing::error!(error = %db_err, "could not record run failure");
            }
            return Err(e).context("edit agent failed");
        }
    };

    materialize::persist_raw(&project_dir, &raw);
    let (file_blocks, format) = blocks::extract_blocks(&raw, project);
    if file_blocks.is_empty() {
        tracing::warn!("no file blocks parsed from agent output; check debug_result.txt");
    } else {
        tracing::info!(
            count = file_blocks.len(),
            format = format.as_str(),
            "parsed file blocks"
        );
    }
    let report = materialize::materialize(&project_dir, file_blocks)?;

    store.finish(run_id, RunStatus::Edited, None, None)?;

    let summary = EditSummary {
        status: RunStatus::Edited.as_str().to_string(),
        project_name: project.to_string(),
        changes: changes.to_string(),
        files_written: report.written,
        files_skipped: report.skipped,
    };
    io::atomic_write(
        &paths::summary_path(&project_dir),
        serde_json::to_string_pretty(&summary)?.as_bytes(),
    )?;

    match webhook::url_from_env() {
        Some(url) => {
            webhook::notify(
                &url,
                &webhook::WebhookPayload {
                    project_name: summary.project_name.clone(),
                    framework: None,
                    features: None,
                    changes: Some(summary.changes.clone()),
                    status: summary.status.clone(),
                    deployment_url: None,
                },
            );
        }
        None => tracing::debug!("N8N_WEBHOOK_URL not set; skipping webhook"),
    }

    output::print_json(&summary)
}

/// The editor role, overridable from a YAML roles file.
fn editor_role(roles_path: Option<&Path>) -> anyhow::Result<RoleSpec> {
    let builtin = roles::project_editor();
    let Some(path) = roles_path else {
        return Ok(builtin);
    };
    let roles_file = RolesFile::load(path)?;
    Ok(roles_file
        .find(&builtin.role)
        .map(|cfg| RoleSpec::new(&cfg.role, &cfg.goal, &cfg.backstory))
        .unwrap_or(builtin))
}

fn edit_task(
    project: &str,
    project_dir: &Path,
    changes: &str,
    metadata: Option<&factory_core::runs::ProjectMetadata>,
) -> TaskSpec {
    let context = metadata
        .map(|m| format!(" The project uses {} and was generated with: {}.", m.framework, m.features))
        .unwrap_or_default();
    TaskSpec::new(
        format!(
            "Apply the following change to project {} in directory '{}':\n{}\n{}\n\
             Return every modified file in full, in the format:\n\
             --- <path relative to the project directory> ---\n\
             <content>",
            project,
            project_dir.display(),
            changes,
            context,
        ),
        "The full content of every modified file in the '--- <path> --- <content>' format.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builtin_editor_role_when_no_override() {
        let role = editor_role(None).unwrap();
        assert_eq!(role.role, "Project Editor");
    }

    #[test]
    fn roles_file_overrides_editor_goal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agents.yaml");
        std::fs::write(
            &path,
            "agents:\n  - role: Project Editor\n    goal: Only change CSS\n",
        )
        .unwrap();

        let role = editor_role(Some(path.as_path())).unwrap();
        assert_eq!(role.goal, "Only change CSS");
    }

    #[test]
    fn missing_roles_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(editor_role(Some(&dir.path().join("absent.yaml"))).is_err());
    }

    #[test]
    fn edit_task_includes_metadata_context() {
        let metadata = factory_core::runs::ProjectMetadata {
            framework: "Flask".to_string(),
            features: "auth".to_string(),
        };
        let task = edit_task("todo", Path::new("/p/todo"), "fix header", Some(&metadata));
        assert!(task.description.contains("uses Flask"));
        assert!(task.description.contains("fix header"));
    }
}
