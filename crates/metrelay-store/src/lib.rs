//! metrelay-store — the relay's in-memory metric store.
//!
//! Holds the latest pushed snapshot for every node and renders the merged
//! view in scrape text form. The store is the only stateful, concurrent
//! part of the relay; everything else is a stateless boundary around it.
//!
//! # Architecture
//!
//! ```text
//! MetricStore
//!   ├── merge(node, payload) ← ingest path, per-key overwrite
//!   └── snapshot()           → per-node-atomic copies
//!
//! exposition
//!   └── render_exposition() → text/plain for /metrics
//! ```

pub mod exposition;
pub mod store;

pub use exposition::render_exposition;
pub use store::{MetricPayload, MetricStore, NodeId, NodeSnapshot};
