//! metrelay-agent — node-side half of the relay.
//!
//! Each worker node runs one agent. On a fixed cadence it samples host
//! and process gauges, serializes them as a flat JSON object, and
//! POSTs the snapshot to the aggregation proxy with the node's
//! identity in the `node` header.
//!
//! ```text
//!   SystemSampler ──sample()──▶ MetricPayload ──push_snapshot()──▶ proxy /push
//!         ▲                                                            │
//!         └──────────────── PushAgent::run loop ◀─────────────────────┘
//! ```
//!
//! The loop is deliberately forgiving: a push failure is logged and the
//! next tick tries again with a fresh sample.

pub mod agent;
pub mod collector;
pub mod push;

pub use agent::{AgentConfig, PushAgent};
pub use collector::SystemSampler;
pub use push::{PushError, push_snapshot};
