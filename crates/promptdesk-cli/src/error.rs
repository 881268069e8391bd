//! CLI-specific error types and mappings.
//!
//! This module maps library errors to exit codes and user-facing messages.

use promptdesk_core::{CompileError, PathError, SettingsError, StoreError};
use promptdesk_runtime::{ProbeError, SupervisorError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// A supervised service failed to start.
    #[error("{0}")]
    Startup(String),

    /// A compile attempt failed.
    #[error("{0}")]
    Compile(String),

    /// Argument error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Process management error.
    #[error("Process error: {0}")]
    Process(String),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow sysexits.h where one fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Compile(_) | Self::Internal(_) => 1,
            Self::Arguments(_) => 2,  // EX_USAGE
            Self::Startup(_) => 69,   // EX_UNAVAILABLE
            Self::Process(_) => 71,   // EX_OSERR
            Self::Io(_) => 74,        // EX_IOERR
            Self::Config(_) => 78,    // EX_CONFIG
        }
    }
}

impl From<SupervisorError> for CliError {
    fn from(err: SupervisorError) -> Self {
        Self::Startup(err.to_string())
    }
}

impl From<ProbeError> for CliError {
    fn from(err: ProbeError) -> Self {
        Self::Process(err.to_string())
    }
}

impl From<CompileError> for CliError {
    fn from(err: CompileError) -> Self {
        Self::Compile(err.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Invalid(e) => e.into(),
            other => Self::Config(other.to_string()),
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Arguments(err.to_string())
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<tokio::task::JoinError> for CliError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_failure_keeps_message_and_code() {
        let err: CliError = SupervisorError::StartFailed {
            service: "Backend".into(),
            reason: "process exited early (code=1)".into(),
            remediation: "Install the dependencies in core/requirements.txt.".into(),
        }
        .into();

        assert_eq!(err.exit_code(), 69);
        assert_eq!(
            err.to_string(),
            "Backend failed to start: process exited early (code=1). Install the dependencies in core/requirements.txt."
        );
    }

    #[test]
    fn invalid_settings_are_usage_errors() {
        let err: CliError = StoreError::Invalid(SettingsError::InvalidBaseUrl("x".into())).into();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn compile_errors_use_status_text() {
        let err: CliError = CompileError::Status { code: 503 }.into();
        assert_eq!(err.to_string(), "API Error: 503");
        assert_eq!(err.exit_code(), 1);
    }
}
