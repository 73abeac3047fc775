use crate::types::{RawUpstreamResponse, UpstreamPayload};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Hard bound on a single engine call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Public Piston deployment
pub const DEFAULT_ENGINE_URL: &str = "https://emkc.org/api/v2/piston/execute";

/// Failure talking to the execution engine
#[derive(Debug, Error)]
pub enum ClientFailure {
    #[error("Execution timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error("Failed to reach execution engine: {0}")]
    Transport(String),

    #[error("Execution engine returned HTTP {status}: {detail}")]
    UpstreamHttp { status: u16, detail: String },

    #[error("Execution engine returned an unreadable body: {detail}")]
    MalformedResponse { status: u16, detail: String },
}

impl ClientFailure {
    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ClientFailure::Timeout(timeout)
        } else {
            ClientFailure::Transport(err.to_string())
        }
    }
}

/// Outbound seam to the remote sandbox.
///
/// Implementations make exactly one call per invocation and never retry:
/// running code is not safe to replay.
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    async fn execute(
        &self,
        payload: &UpstreamPayload,
        timeout: Duration,
    ) -> Result<RawUpstreamResponse, ClientFailure>;
}

#[async_trait]
impl<T: ExecutionClient + ?Sized> ExecutionClient for std::sync::Arc<T> {
    async fn execute(
        &self,
        payload: &UpstreamPayload,
        timeout: Duration,
    ) -> Result<RawUpstreamResponse, ClientFailure> {
        (**self).execute(payload, timeout).await
    }
}

/// Client for a Piston-compatible `POST /execute` endpoint
#[derive(Debug, Clone)]
pub struct PistonClient {
    client: Client,
    endpoint: String,
}

impl PistonClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ClientFailure> {
        let client = Client::builder()
            .build()
            .map_err(|e| ClientFailure::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ExecutionClient for PistonClient {
    async fn execute(
        &self,
        payload: &UpstreamPayload,
        timeout: Duration,
    ) -> Result<RawUpstreamResponse, ClientFailure> {
        debug!(
            endpoint = %self.endpoint,
            language = %payload.language,
            version = %payload.version,
            "Dispatching to execution engine"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| ClientFailure::from_reqwest(e, timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientFailure::from_reqwest(e, timeout))?;

        let parsed = serde_json::from_str::<RawUpstreamResponse>(&body);
        match parsed {
            Ok(raw) if status.is_success() || raw.has_stages() => Ok(raw),
            Ok(raw) => {
                warn!(status = status.as_u16(), "Execution engine rejected the job");
                Err(ClientFailure::UpstreamHttp {
                    status: status.as_u16(),
                    detail: raw.message.unwrap_or(body),
                })
            }
            Err(_) if status.is_success() => Err(ClientFailure::MalformedResponse {
                status: status.as_u16(),
                detail: truncate(&body, 512),
            }),
            Err(_) => {
                warn!(status = status.as_u16(), "Execution engine returned an error status");
                let detail = if body.is_empty() {
                    status.canonical_reason().unwrap_or("Unknown error").to_string()
                } else {
                    truncate(&body, 512)
                };
                Err(ClientFailure::UpstreamHttp {
                    status: status.as_u16(),
                    detail,
                })
            }
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
