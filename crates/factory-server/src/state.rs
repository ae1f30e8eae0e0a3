use std::path::PathBuf;

/// Shared state for all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Directory holding generated projects and the run database.
    pub projects_root: PathBuf,
    /// The CLI binary the generate route dispatches to. Defaults to the
    /// currently running executable, since `webfactory serve` is a mode of
    /// the same binary.
    pub cli_bin: PathBuf,
}

impl AppState {
    pub fn new(projects_root: PathBuf) -> Self {
        let cli_bin = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("webfactory"));
        Self {
            projects_root,
            cli_bin,
        }
    }
}
