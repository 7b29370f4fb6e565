//! promfan: serves many Prometheus targets as one.
//!
//! - Config path from `PROMFAN_CONFIG`
//! - `GET /metrics` fans out to every target, merges, and re-serializes
//! - Any startup failure exits non-zero with one diagnostic line

use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use promfan_core::error::{PromfanError, Result};
use promfan_proxy::{app_state, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(kind = e.kind().as_str(), "{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = config::path_from_env()?;
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.listen_addr()?;
    let targets = cfg.targets.len();

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state);

    let listener = router::bind(&listen).await?;
    let local = listener
        .local_addr()
        .map_err(|e| PromfanError::Internal(format!("failed to read bound address: {e}")))?;

    tracing::info!(listen = %local, targets, "listening on http://{local}/metrics");
    axum::serve(listener, app)
        .await
        .map_err(|e| PromfanError::Internal(format!("server failed: {e}")))
}
