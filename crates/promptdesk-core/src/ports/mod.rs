//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that orchestration code expects from
//! infrastructure. They use only domain types so the pipeline can be driven
//! by an HTTP client in production and by in-memory fakes in tests.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::compile::{CompileRequest, CompileResult};
use crate::settings::{Settings, SettingsError};

/// Message used when a transport failure carries no detail.
pub const CONNECTION_FAILED: &str = "Connection Failed";

/// Failure of a single compile phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Could not reach the service or the connection broke mid-request.
    #[error("{}", transport_message(.0))]
    Transport(String),

    /// The phase did not complete before its deadline.
    #[error("Timeout: AI Model took too long to respond.")]
    Timeout { after: Duration },

    /// The service answered with a non-success status.
    #[error("API Error: {code}")]
    Status { code: u16 },

    /// The response body could not be decoded.
    #[error("Invalid response: {0}")]
    Decode(String),

    /// The request was abandoned because its attempt was superseded.
    #[error("Request cancelled")]
    Cancelled,
}

impl CompileError {
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

fn transport_message(detail: &str) -> &str {
    if detail.is_empty() {
        CONNECTION_FAILED
    } else {
        detail
    }
}

/// Client for the compiler service.
///
/// Implementations must return promptly with [`CompileError::Cancelled`]
/// once `cancel` fires, dropping any in-flight request.
#[async_trait]
pub trait CompilerClient: Send + Sync {
    async fn compile(
        &self,
        request: &CompileRequest,
        cancel: &CancellationToken,
    ) -> Result<CompileResult, CompileError>;
}

/// Errors from settings persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Settings I/O failed for {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Settings could not be encoded: {0}")]
    Encode(String),

    #[error(transparent)]
    Invalid(#[from] SettingsError),
}

/// Persistence for user [`Settings`].
pub trait SettingsStore: Send + Sync {
    /// Load settings, falling back to defaults when nothing usable is stored.
    fn load(&self) -> Settings;

    /// Validate and persist `settings`.
    fn save(&self, settings: &Settings) -> Result<(), StoreError>;
}
