//! Read-only HTTP API over stored commits.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/commits?group=<g>` | Recent commits, optionally for one group |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Errors use one JSON shape:
//!
//! ```json
//! { "error": { "code": "internal", "message": "..." } }
//! ```

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::config::Config;
use crate::models::CommitWithAuthor;
use crate::store::Store;

#[derive(Clone)]
struct AppState {
    store: Arc<dyn Store>,
}

/// Build the router. Split out from [`run_server`] so tests can serve it on
/// an ephemeral port.
pub fn router(store: Arc<dyn Store>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/commits", get(handle_commits))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { store })
}

/// Serve on `[server].bind` until the process is terminated.
pub async fn run_server(config: &Config, store: Arc<dyn Store>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!(addr = %bind_addr, "server listening");
    println!("Serving commits on http://{}", bind_addr);

    axum::serve(listener, router(store)).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn internal(err: anyhow::Error) -> AppError {
    error!(error = %err, "request failed");
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: err.to_string(),
    }
}

// ============ Handlers ============

#[derive(Deserialize)]
struct CommitsQuery {
    #[serde(default)]
    group: String,
}

async fn handle_commits(
    State(state): State<AppState>,
    Query(query): Query<CommitsQuery>,
) -> Result<Json<Vec<CommitWithAuthor>>, AppError> {
    let commits = state
        .store
        .recent_commits_by_group(query.group.trim())
        .await
        .map_err(internal)?;
    Ok(Json(commits))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
