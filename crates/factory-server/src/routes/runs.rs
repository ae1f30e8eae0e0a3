use axum::extract::State;
use axum::Json;
use factory_core::runs::{RunRecord, RunStore};
use factory_core::paths;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/runs — run history, most recent first.
pub async fn list_runs(State(state): State<AppState>) -> Result<Json<Vec<RunRecord>>, AppError> {
    let store = RunStore::open(&paths::runs_db_path(&state.projects_root))?;
    Ok(Json(store.list()?))
}
