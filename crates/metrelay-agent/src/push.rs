//! Push client for the aggregation proxy.
//!
//! One connection per push: the snapshot is small, the cadence is slow,
//! and a fresh connection keeps failure handling trivial.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tracing::debug;

use metrelay_store::MetricPayload;

/// Why a push did not land.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("failed to encode metrics payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },
    #[error("http handshake failed: {0}")]
    Handshake(#[source] hyper::Error),
    #[error("malformed push request: {0}")]
    BuildRequest(#[from] http::Error),
    #[error("push request failed: {0}")]
    Request(#[source] hyper::Error),
    #[error("proxy rejected push: {status}")]
    Rejected { status: http::StatusCode },
    #[error("push timed out after {0:?}")]
    TimedOut(Duration),
}

/// POST one snapshot to `http://{proxy_addr}/push`.
///
/// The node's identity travels in the `node` header; the body is the
/// payload as a flat JSON object. The timeout covers the whole
/// exchange, connect included. Any non-2xx status is an error.
pub async fn push_snapshot(
    proxy_addr: &str,
    node: &str,
    payload: &MetricPayload,
    timeout: Duration,
) -> Result<(), PushError> {
    let body = serde_json::to_vec(payload)?;
    let uri = format!("http://{proxy_addr}/push");

    tokio::time::timeout(timeout, async move {
        let stream = tokio::net::TcpStream::connect(proxy_addr)
            .await
            .map_err(|source| PushError::Connect {
                addr: proxy_addr.to_owned(),
                source,
            })?;

        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(PushError::Handshake)?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = http::Request::builder()
            .method("POST")
            .uri(&uri)
            .header("host", proxy_addr)
            .header("content-type", "application/json")
            .header("node", node)
            .body(Full::new(Bytes::from(body)))?;

        let resp = sender.send_request(req).await.map_err(PushError::Request)?;
        if !resp.status().is_success() {
            return Err(PushError::Rejected {
                status: resp.status(),
            });
        }

        debug!(%node, %uri, "snapshot pushed");
        Ok(())
    })
    .await
    .map_err(|_| PushError::TimedOut(timeout))?
}
