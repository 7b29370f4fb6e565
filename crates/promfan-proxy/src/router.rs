//! Axum router wiring.

use axum::{routing::get, Router};
use tokio::net::TcpListener;

use promfan_core::error::{PromfanError, Result};

use crate::{app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(ops::metrics))
        .route("/healthz", get(ops::healthz))
        .with_state(state)
}

/// Bind the listen socket. `listen` is `host:port`; host names are resolved here.
pub async fn bind(listen: &str) -> Result<TcpListener> {
    TcpListener::bind(listen)
        .await
        .map_err(|e| PromfanError::Internal(format!("failed to bind {listen}: {e}")))
}
