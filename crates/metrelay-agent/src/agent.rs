//! The sample-and-push loop.
//!
//! Owns a [`SystemSampler`] and drives it on a fixed cadence, relaying
//! every snapshot to the proxy until shutdown is signalled.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::collector::SystemSampler;
use crate::push::push_snapshot;

/// Configuration for the push agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// `host:port` of the aggregation proxy.
    pub proxy_addr: String,
    /// Node identity sent in the `node` header of every push.
    pub node_id: String,
    /// Interval between samples.
    pub push_interval: Duration,
    /// Per-push timeout, connect included.
    pub push_timeout: Duration,
}

/// The push agent that relays this node's gauges to the proxy.
pub struct PushAgent {
    config: AgentConfig,
    sampler: SystemSampler,
}

impl PushAgent {
    /// Create a new push agent.
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            sampler: SystemSampler::new(),
        }
    }

    /// Run the push loop until the shutdown flag flips.
    ///
    /// Each tick takes a fresh sample, so a failed push is never
    /// retried as-is; the next tick relays newer data instead. The
    /// proxy being down only costs log noise.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            proxy = %self.config.proxy_addr,
            node = %self.config.node_id,
            interval = ?self.config.push_interval,
            "push loop started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.config.push_interval) => {
                    let payload = self.sampler.sample();
                    match push_snapshot(
                        &self.config.proxy_addr,
                        &self.config.node_id,
                        &payload,
                        self.config.push_timeout,
                    )
                    .await
                    {
                        Ok(()) => {
                            debug!(
                                node = %self.config.node_id,
                                metrics = payload.len(),
                                "snapshot relayed"
                            );
                        }
                        Err(e) => {
                            warn!(node = %self.config.node_id, error = %e, "push failed");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    info!(node = %self.config.node_id, "push loop shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AgentConfig {
        AgentConfig {
            proxy_addr: "127.0.0.1:8080".to_string(),
            node_id: "test-node".to_string(),
            push_interval: Duration::from_secs(60),
            push_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn agent_creation() {
        let agent = PushAgent::new(test_config());
        assert_eq!(agent.config.node_id, "test-node");
    }

    #[tokio::test]
    async fn run_exits_on_shutdown_signal() {
        let agent = PushAgent::new(test_config());
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(agent.run(rx));

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("push loop did not stop on shutdown")
            .unwrap();
    }
}
