//! Scrape-format text rendering.
//!
//! Renders the merged store into the flat text form a pull-based
//! collector consumes: one `name{node="id"} value` line per stored
//! (node, metric) pair. Aggregated entries carry no `# HELP`/`# TYPE`
//! metadata — the relay cannot know the types it merged.

use crate::store::NodeSnapshot;

/// Render node snapshots into scrape text.
///
/// Values are written in fixed notation with six fractional digits. Line
/// order is unspecified (collectors treat the format as
/// order-insensitive); an empty slice renders an empty string.
pub fn render_exposition(snapshots: &[NodeSnapshot]) -> String {
    let mut out = String::new();
    for snap in snapshots {
        for (name, value) in &snap.metrics {
            out.push_str(&format!("{}{{node=\"{}\"}} {:.6}\n", name, snap.node, value));
        }
    }
    out
}
