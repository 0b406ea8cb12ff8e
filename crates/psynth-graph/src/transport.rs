//! The request/response seam between the graph and the Psynth server.

use async_trait::async_trait;
use serde_json::Value;

use psynth_core::ServerConfig;

/// Errors from the underlying network exchange, as opposed to a command the
/// server answered with the failure sentinel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Undecodable response body: {0}")]
    Body(String),

    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// Sends one request document and waits for its response document.
///
/// Implementations are called by at most one in-flight command per graph;
/// they need not serialize calls themselves.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a graph command.
    async fn send(&self, request: Value) -> Result<Value, TransportError>;

    /// Send a graph-creation request. Servers that take these on the same
    /// endpoint as graph commands can rely on the default.
    async fn provision(&self, request: Value) -> Result<Value, TransportError> {
        self.send(request).await
    }
}

/// HTTPS transport: `GET {url}crunch/{json}` for graph commands and
/// `GET {url}p/{json}` for graph creation.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ServerConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url(),
        })
    }

    /// The request URL for `request` under `endpoint`.
    pub fn request_url(&self, endpoint: &str, request: &Value) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            endpoint,
            urlencoding::encode(&request.to_string())
        )
    }

    async fn get(&self, endpoint: &str, request: &Value) -> Result<Value, TransportError> {
        let url = self.request_url(endpoint, request);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| TransportError::Body(e.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Value) -> Result<Value, TransportError> {
        self.get("crunch", &request).await
    }

    async fn provision(&self, request: Value) -> Result<Value, TransportError> {
        self.get("p", &request).await
    }
}
