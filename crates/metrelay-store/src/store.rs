//! The concurrent metric store.
//!
//! Two-level locking: an outer lock guards the node map's key set, and
//! each node entry carries its own lock for its snapshot values. Pushes
//! for different nodes never contend once their entries exist, and a
//! scrape of one node never blocks a push to another.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

/// Node identifier as supplied in the agent's `node` header, used
/// verbatim as the label value on scrape.
pub type NodeId = String;

/// A pushed set of metric values: metric name → scalar value.
///
/// All metric kinds collapse to a plain `f64` here; counter/gauge
/// semantics belong to the agent-side collection library.
pub type MetricPayload = HashMap<String, f64>;

/// The latest known metrics for one node, guarded by that node's own lock.
struct NodeEntry {
    snapshot: RwLock<MetricPayload>,
}

impl NodeEntry {
    fn new() -> Self {
        Self {
            snapshot: RwLock::new(MetricPayload::new()),
        }
    }
}

/// A per-node-consistent copy of one node's metrics, as read on scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    pub node: NodeId,
    pub metrics: MetricPayload,
}

/// Concurrent store of every node's latest metric snapshot.
///
/// `Clone` + `Send` + `Sync` (everything behind `Arc`); construct once and
/// hand to the HTTP layer. Entries are created lazily on a node's first
/// push and live for the process lifetime — there is no eviction.
#[derive(Clone, Default)]
pub struct MetricStore {
    /// Node map. The lock here covers only the key set; values are
    /// updated under each entry's own lock.
    nodes: Arc<RwLock<HashMap<NodeId, Arc<NodeEntry>>>>,
}

impl MetricStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a pushed payload into `node`'s snapshot.
    ///
    /// Each incoming key overwrites the stored value or adds it; keys
    /// absent from `incoming` keep their previous values. Pushes for the
    /// same node serialize on the node's lock in arrival order. The
    /// ingest boundary validates that `node` is non-empty before calling.
    pub async fn merge(&self, node: &str, incoming: MetricPayload) {
        let entry = self.entry(node).await;
        let mut snapshot = entry.snapshot.write().await;
        for (name, value) in incoming {
            snapshot.insert(name, value);
        }
        debug!(%node, stored = snapshot.len(), "snapshot merged");
    }

    /// Look up `node`'s entry, creating it on the node's first push.
    ///
    /// The map lock is held only while touching the key set and is
    /// released before the caller takes the entry's own lock. A new entry
    /// is fully constructed before it is published in the map.
    async fn entry(&self, node: &str) -> Arc<NodeEntry> {
        {
            let nodes = self.nodes.read().await;
            if let Some(entry) = nodes.get(node) {
                return entry.clone();
            }
        }

        let mut nodes = self.nodes.write().await;
        nodes
            .entry(node.to_string())
            .or_insert_with(|| Arc::new(NodeEntry::new()))
            .clone()
    }

    /// Copy out every node's current snapshot.
    ///
    /// Each node is read atomically under its own lock, but there is no
    /// cross-node atomicity: a scrape concurrent with pushes sees each
    /// node either fully before or fully after its in-flight push. Order
    /// is unspecified.
    pub async fn snapshot(&self) -> Vec<NodeSnapshot> {
        let entries: Vec<(NodeId, Arc<NodeEntry>)> = {
            let nodes = self.nodes.read().await;
            nodes
                .iter()
                .map(|(node, entry)| (node.clone(), entry.clone()))
                .collect()
        };

        let mut snapshots = Vec::with_capacity(entries.len());
        for (node, entry) in entries {
            let metrics = entry.snapshot.read().await.clone();
            snapshots.push(NodeSnapshot { node, metrics });
        }
        snapshots
    }

    /// The current metrics for one node, if it has ever pushed.
    pub async fn get(&self, node: &str) -> Option<MetricPayload> {
        let entry = {
            let nodes = self.nodes.read().await;
            nodes.get(node).cloned()
        };
        match entry {
            Some(entry) => Some(entry.snapshot.read().await.clone()),
            None => None,
        }
    }

    /// Number of nodes that have pushed at least once.
    pub async fn node_count(&self) -> usize {
        self.nodes.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(pairs: &[(&str, f64)]) -> MetricPayload {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[tokio::test]
    async fn merge_creates_entry_on_first_push() {
        let store = MetricStore::new();
        assert_eq!(store.node_count().await, 0);

        store.merge("x", payload(&[("a", 1.0)])).await;

        assert_eq!(store.node_count().await, 1);
        assert_eq!(store.get("x").await.unwrap()["a"], 1.0);
    }

    #[tokio::test]
    async fn merge_is_per_key_overwrite_not_replace() {
        let store = MetricStore::new();
        store.merge("x", payload(&[("a", 1.0)])).await;
        store.merge("x", payload(&[("b", 2.0)])).await;

        // The second push must not wipe keys it doesn't mention.
        let metrics = store.get("x").await.unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics["a"], 1.0);
        assert_eq!(metrics["b"], 2.0);
    }

    #[tokio::test]
    async fn merge_overwrites_known_keys() {
        let store = MetricStore::new();
        store.merge("x", payload(&[("a", 1.0)])).await;
        store.merge("x", payload(&[("a", 5.0)])).await;

        let metrics = store.get("x").await.unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics["a"], 5.0);
    }

    #[tokio::test]
    async fn merge_is_idempotent() {
        let store = MetricStore::new();
        store.merge("x", payload(&[("a", 1.0), ("b", 2.0)])).await;
        let once = store.get("x").await.unwrap();

        store.merge("x", payload(&[("a", 1.0), ("b", 2.0)])).await;
        let twice = store.get("x").await.unwrap();

        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn nodes_do_not_interfere() {
        let store = MetricStore::new();
        store.merge("x", payload(&[("a", 1.0)])).await;
        store.merge("y", payload(&[("a", 2.0)])).await;

        assert_eq!(store.get("x").await.unwrap()["a"], 1.0);
        assert_eq!(store.get("y").await.unwrap()["a"], 2.0);
    }

    #[tokio::test]
    async fn get_unknown_node_is_none() {
        let store = MetricStore::new();
        assert!(store.get("nope").await.is_none());
    }

    #[tokio::test]
    async fn snapshot_of_empty_store_is_empty() {
        let store = MetricStore::new();
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn snapshot_covers_every_node() {
        let store = MetricStore::new();
        store.merge("x", payload(&[("a", 1.0), ("b", 2.0)])).await;
        store.merge("y", payload(&[("a", 3.0)])).await;

        let mut snapshots = store.snapshot().await;
        snapshots.sort_by(|l, r| l.node.cmp(&r.node));

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].node, "x");
        assert_eq!(snapshots[0].metrics.len(), 2);
        assert_eq!(snapshots[1].node, "y");
        assert_eq!(snapshots[1].metrics["a"], 3.0);
    }

    #[tokio::test]
    async fn snapshot_is_a_copy_not_a_view() {
        let store = MetricStore::new();
        store.merge("x", payload(&[("a", 1.0)])).await;

        let before = store.snapshot().await;
        store.merge("x", payload(&[("a", 9.0)])).await;

        assert_eq!(before[0].metrics["a"], 1.0);
        assert_eq!(store.get("x").await.unwrap()["a"], 9.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_distinct_node_merges_commute() {
        let store = MetricStore::new();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let s = store.clone();
            handles.push(tokio::spawn(async move {
                s.merge("x", payload(&[("a", 1.0)])).await;
            }));
            let s = store.clone();
            handles.push(tokio::spawn(async move {
                s.merge("y", payload(&[("a", 2.0)])).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Whatever the interleaving, each node ends with its own value.
        assert_eq!(store.node_count().await, 2);
        assert_eq!(store.get("x").await.unwrap()["a"], 1.0);
        assert_eq!(store.get("y").await.unwrap()["a"], 2.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_same_node_merges_all_land() {
        let store = MetricStore::new();

        let mut handles = Vec::new();
        for i in 0..32u32 {
            let s = store.clone();
            handles.push(tokio::spawn(async move {
                let mut incoming = MetricPayload::new();
                incoming.insert(format!("m{i}"), f64::from(i));
                s.merge("x", incoming).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let metrics = store.get("x").await.unwrap();
        assert_eq!(metrics.len(), 32);
        for i in 0..32u32 {
            assert_eq!(metrics[&format!("m{i}")], f64::from(i));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn reads_never_observe_a_partial_merge() {
        let store = MetricStore::new();
        store.merge("x", payload(&[("a", 0.0), ("b", 0.0)])).await;

        let writer = {
            let s = store.clone();
            tokio::spawn(async move {
                for i in 1..=200 {
                    s.merge("x", payload(&[("a", f64::from(i)), ("b", f64::from(i))])).await;
                }
            })
        };
        let reader = {
            let s = store.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    // Both keys are written under one lock hold, so any
                    // observed snapshot must have them equal.
                    let metrics = s.get("x").await.unwrap();
                    assert_eq!(metrics["a"], metrics["b"]);
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();
    }
}
