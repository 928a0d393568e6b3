//! Background fetching.
//!
//! Item sources never touch the network themselves.  They hand a
//! [`FetchRequest`] to the worker started by [`spawn`], which runs every
//! request as its own task on the tokio runtime and sends the outcome back
//! to the UI thread over an [`mpsc`] channel as a [`FetchMsg`].
//!
//! Requests are fire-and-forget: nothing here cancels an in-flight request
//! when a newer one is issued.  Discarding superseded answers is the
//! receiving [`ItemSource`](crate::source::ItemSource)'s job, using the
//! sequence number carried through unchanged.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::{debug, warn};

use crate::source::{payload, Item, SourceKind};

/// Why a fetch produced no items.  Never fatal; the next query retries.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend answered HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("fetch worker is not running")]
    WorkerGone,
}

/// One request issued by an item source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub kind: SourceKind,
    pub endpoint: String,
    pub query: String,
    /// Monotonic per source; echoed back in [`FetchMsg::seq`].
    pub seq: u64,
}

/// A completed request, sent from the worker to the UI thread.
#[derive(Debug)]
pub struct FetchMsg {
    pub kind: SourceKind,
    pub seq: u64,
    pub query: String,
    pub outcome: Result<Vec<Item>, FetchError>,
}

/// Asynchronous request/response to the search backend.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the items `endpoint` returns for `query`.
    async fn get(&self, endpoint: &str, query: &str) -> Result<Vec<Item>, FetchError>;
}

/// [`Transport`] over HTTP: `GET {base_url}{endpoint}?query=...`.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, endpoint: &str, query: &str) -> Result<Vec<Item>, FetchError> {
        let response = self
            .client
            .get(self.url(endpoint))
            .query(&[("query", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(payload::decode(&body)?)
    }
}

/// Start the fetch worker on `runtime`.
///
/// Returns the sender item sources issue requests on, and the receiver the
/// main loop drains on every tick.  The worker stops once every request
/// sender has been dropped.
pub fn spawn(
    runtime: &Handle,
    transport: Arc<dyn Transport>,
) -> (UnboundedSender<FetchRequest>, mpsc::Receiver<FetchMsg>) {
    let (req_tx, mut req_rx) = unbounded_channel::<FetchRequest>();
    let (tx, rx) = mpsc::channel();

    runtime.spawn(async move {
        while let Some(req) = req_rx.recv().await {
            let transport = Arc::clone(&transport);
            let tx = tx.clone();
            tokio::spawn(async move {
                debug!(kind = %req.kind, seq = req.seq, query = %req.query, "fetch started");
                let outcome = transport.get(&req.endpoint, &req.query).await;
                if let Err(e) = &outcome {
                    warn!(kind = %req.kind, seq = req.seq, error = %e, "fetch failed");
                }
                // The UI thread has exited if this fails; nothing left to do.
                let _ = tx.send(FetchMsg {
                    kind: req.kind,
                    seq: req.seq,
                    query: req.query,
                    outcome,
                });
            });
        }
    });

    (req_tx, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubTransport;

    #[async_trait]
    impl Transport for StubTransport {
        async fn get(&self, endpoint: &str, query: &str) -> Result<Vec<Item>, FetchError> {
            match query {
                "fail" => Err(FetchError::Status(503)),
                _ => Ok(vec![Item::suggestion(endpoint, query)]),
            }
        }
    }

    fn request(query: &str, seq: u64) -> FetchRequest {
        FetchRequest {
            kind: SourceKind::Suggestions,
            endpoint: "/ac".into(),
            query: query.into(),
            seq,
        }
    }

    #[test]
    fn worker_echoes_request_identity_with_outcome() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (req_tx, rx) = spawn(rt.handle(), Arc::new(StubTransport));

        req_tx.send(request("lost", 7)).unwrap();
        let msg = rx.recv_timeout(Duration::from_secs(5)).unwrap();

        assert_eq!(msg.kind, SourceKind::Suggestions);
        assert_eq!(msg.seq, 7);
        assert_eq!(msg.query, "lost");
        assert_eq!(msg.outcome.unwrap(), vec![Item::suggestion("/ac", "lost")]);
    }

    #[test]
    fn worker_reports_transport_failures() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (req_tx, rx) = spawn(rt.handle(), Arc::new(StubTransport));

        req_tx.send(request("fail", 1)).unwrap();
        let msg = rx.recv_timeout(Duration::from_secs(5)).unwrap();

        assert!(matches!(msg.outcome, Err(FetchError::Status(503))));
    }

    #[test]
    fn http_url_joins_base_and_endpoint() {
        let t = HttpTransport::new("http://localhost:8000/").unwrap();
        assert_eq!(t.url("/search/find"), "http://localhost:8000/search/find");
        let t = HttpTransport::new("http://localhost:8000").unwrap();
        assert_eq!(t.url("search/autocomplete"), "http://localhost:8000/search/autocomplete");
    }

    fn respond(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\n\
             content-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Answer one HTTP request on a local port with `response`, returning
    /// the base URL and a handle yielding the request head that was read.
    async fn serve_once(response: String) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
            String::from_utf8_lossy(&head).into_owned()
        });
        (base, handle)
    }

    #[test]
    fn http_non_success_status_is_a_failure() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (base, server) = serve_once(respond("500 Internal Server Error", "")).await;
            let t = HttpTransport::new(base).unwrap();

            let outcome = t.get("/search/find", "lost").await;

            assert!(matches!(outcome, Err(FetchError::Status(500))), "{outcome:?}");
            server.await.unwrap();
        });
    }

    #[test]
    fn http_grouped_body_decodes_in_provider_order() {
        let body = r#"{"netflix":["lost"],"hulu":["lost girl"]}"#;
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (base, server) = serve_once(respond("200 OK", body)).await;
            let t = HttpTransport::new(base).unwrap();

            let items = t.get("/search/autocomplete", "lost").await.unwrap();

            assert_eq!(
                items,
                vec![
                    Item::suggestion("netflix", "lost"),
                    Item::suggestion("hulu", "lost girl"),
                ]
            );
            let head = server.await.unwrap();
            assert!(
                head.starts_with("GET /search/autocomplete?query=lost "),
                "{head}"
            );
        });
    }

    #[test]
    fn status_errors_render_readably() {
        assert_eq!(FetchError::Status(502).to_string(), "backend answered HTTP 502");
    }
}
