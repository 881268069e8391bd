//! HTTP implementation of [`CompilerClient`].

use async_trait::async_trait;
use promptdesk_core::{CompileError, CompileRequest, CompileResult, CompilerClient};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default compiler service address.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8080";

/// Talks to `POST {base}/compile`.
#[derive(Debug, Clone)]
pub struct HttpCompilerClient {
    client: Client,
    base_url: String,
}

impl HttpCompilerClient {
    /// Client for the service at `base_url` (e.g. `http://127.0.0.1:8080`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, CompileError> {
        // Loopback service; bypass system proxies
        let client = Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| CompileError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, request: &CompileRequest) -> Result<CompileResult, CompileError> {
        let url = format!("{}/compile", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request.body())
            .send()
            .await
            .map_err(|e| map_client_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CompileError::Status {
                code: status.as_u16(),
            });
        }

        let result: CompileResult = response.json().await.map_err(|e| {
            if e.is_decode() {
                CompileError::Decode(e.to_string())
            } else {
                map_client_error(&e)
            }
        })?;
        Ok(result.with_phase(request.phase))
    }
}

/// Transport failures only; deadlines are enforced by the pipeline.
fn map_client_error(e: &reqwest::Error) -> CompileError {
    if e.is_connect() {
        // Renders as "Connection Failed"
        return CompileError::Transport(String::new());
    }
    CompileError::Transport(e.to_string())
}

#[async_trait]
impl CompilerClient for HttpCompilerClient {
    async fn compile(
        &self,
        request: &CompileRequest,
        cancel: &CancellationToken,
    ) -> Result<CompileResult, CompileError> {
        debug!(
            correlation_id = %request.correlation_id,
            phase = %request.phase,
            chars = request.text.len(),
            "sending compile request"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(correlation_id = %request.correlation_id, "compile request cancelled");
                Err(CompileError::Cancelled)
            }
            result = self.send(request) => result,
        }
    }
}
