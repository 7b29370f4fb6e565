//! HTTP endpoints.
//!
//! - `/metrics` : merged scrape of every target, exposition text
//! - `/healthz` : liveness, no upstream traffic

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::warn;

use promfan_core::exposition::CONTENT_TYPE;

use crate::app_state::AppState;
use crate::scrape::{self, serialize};

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Always `200`: failed targets and encode failures only show up in logs.
/// An encode failure ends the body early; blocks already streamed stand.
pub async fn metrics(State(state): State<AppState>) -> Response {
    let merged = scrape::collect_and_merge(state.collector()).await;

    let blocks = serialize::chunks(merged).map_while(|chunk| match chunk {
        Ok(bytes) => Some(Ok::<_, Infallible>(bytes)),
        Err(e) => {
            warn!(kind = e.kind().as_str(), error = %e, "failed to serialize metrics; response truncated");
            None
        }
    });

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, CONTENT_TYPE)],
        Body::from_stream(futures_util::stream::iter(blocks)),
    )
        .into_response()
}
