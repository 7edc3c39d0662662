//! Ingest and scrape handlers.
//!
//! `ingest` turns one agent push into a store merge; `scrape` renders the
//! merged store for a pull-based collector. Rejections are plain-text 4xx
//! responses and never touch the store.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use tracing::debug;

use metrelay_store::{MetricPayload, render_exposition};

use crate::ApiState;

/// Content type of the scrape response.
const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// POST /push
///
/// Requires a non-empty `node` header and a JSON object body mapping
/// metric names to numbers. The body is decoded regardless of any
/// `Content-Type` header, and decoding is all-or-nothing: a malformed
/// body is rejected before the store is touched, so it can never leave
/// a partial merge behind.
pub async fn ingest(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let node = match headers.get("node").and_then(|v| v.to_str().ok()) {
        Some(node) if !node.is_empty() => node.to_owned(),
        _ => return (StatusCode::BAD_REQUEST, "missing node header\n").into_response(),
    };

    let payload: MetricPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            debug!(%node, error = %e, "rejected malformed push body");
            return (StatusCode::BAD_REQUEST, format!("invalid metrics payload: {e}\n"))
                .into_response();
        }
    };

    debug!(%node, metrics = payload.len(), "push accepted");
    state.store.merge(&node, payload).await;

    StatusCode::OK.into_response()
}

/// GET /metrics
///
/// Always `200 OK`; an empty store renders an empty body.
pub async fn scrape(State(state): State<ApiState>) -> impl IntoResponse {
    let snapshots = state.store.snapshot().await;
    let body = render_exposition(&snapshots);

    (
        StatusCode::OK,
        [("content-type", EXPOSITION_CONTENT_TYPE)],
        body,
    )
}
