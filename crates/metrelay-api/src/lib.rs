//! metrelay-api — HTTP boundary of the aggregation proxy.
//!
//! Two routes make up the whole surface: agents push snapshots in,
//! a collector scrapes the merged view out. Handler logic lives in
//! [`handlers`]; this module only wires the router.
//!
//! # Routes
//!
//! | Method | Path       | Description                              |
//! |--------|------------|------------------------------------------|
//! | POST   | `/push`    | Ingest one node's metric snapshot        |
//! | GET    | `/metrics` | Render the merged store as scrape text   |

pub mod handlers;

use axum::Router;
use axum::routing::{get, post};
use metrelay_store::MetricStore;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiState {
    pub store: MetricStore,
}

/// Build the relay router over the given store.
///
/// `/push` mounts POST only; axum answers any other method on that
/// path with `405 Method Not Allowed`.
pub fn build_router(store: MetricStore) -> Router {
    let state = ApiState { store };

    Router::new()
        .route("/push", post(handlers::ingest))
        .route("/metrics", get(handlers::scrape))
        .with_state(state)
}
