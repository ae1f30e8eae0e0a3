pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(projects_root: PathBuf) -> Router {
    let app_state = state::AppState::new(projects_root);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/generate", post(routes::generate::generate))
        .route("/api/runs", get(routes::runs::list_runs))
        .route("/api/health", get(routes::health))
        .layer(cors)
        .with_state(app_state)
}

/// Start the webfactory HTTP facade on `port`.
pub async fn serve(projects_root: PathBuf, port: u16) -> anyhow::Result<()> {
    let router = build_router(projects_root);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "webfactory server listening");
    axum::serve(listener, router).await?;
    Ok(())
}
