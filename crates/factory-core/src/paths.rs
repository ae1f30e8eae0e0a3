use crate::error::{FactoryError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// File and directory constants
// ---------------------------------------------------------------------------

/// Default directory, relative to the working directory, that holds one
/// subdirectory per generated project.
pub const PROJECTS_DIR: &str = "projects";

/// Raw agent output is persisted to this file inside the project directory
/// on every invocation, independent of parse success.
pub const DEBUG_RESULT_FILE: &str = "debug_result.txt";

/// Generation run metadata database, stored next to the project directories.
pub const RUNS_DB_FILE: &str = "projects.db";

/// Per-run summary written into the project directory after generate/edit.
pub const SUMMARY_FILE: &str = "generation-summary.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn project_dir(projects_root: &Path, project_name: &str) -> PathBuf {
    projects_root.join(project_name)
}

pub fn debug_result_path(project_dir: &Path) -> PathBuf {
    project_dir.join(DEBUG_RESULT_FILE)
}

pub fn runs_db_path(projects_root: &Path) -> PathBuf {
    projects_root.join(RUNS_DB_FILE)
}

pub fn summary_path(project_dir: &Path) -> PathBuf {
    project_dir.join(SUMMARY_FILE)
}

// ---------------------------------------------------------------------------
// Project name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap())
}

/// Project names become directory names under the projects root, so they must
/// be a single safe path component.
pub fn validate_project_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 64 || !name_re().is_match(name) {
        return Err(FactoryError::InvalidProjectName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_project_names() {
        for name in ["SupabaseToDo", "my-app", "app_2", "a", "v1.2-beta"] {
            validate_project_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_project_names() {
        for name in ["", "has space", "../escape", ".hidden", "-leading", "a/b"] {
            assert!(validate_project_name(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/projects");
        assert_eq!(
            project_dir(root, "todo"),
            PathBuf::from("/tmp/projects/todo")
        );
        assert_eq!(
            debug_result_path(&project_dir(root, "todo")),
            PathBuf::from("/tmp/projects/todo/debug_result.txt")
        );
        assert_eq!(runs_db_path(root), PathBuf::from("/tmp/projects/projects.db"));
    }
}
