//! Progress statuses reported by the compile pipeline.
//!
//! The status stream is the only progress signal the display layer gets,
//! so every variant renders to the exact text shown to the user.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compile::CompileMode;
use crate::ports::CompileError;

/// Discrete pipeline status.
///
/// Sequence: `Queued` → `DraftInFlight` (manual only) → `RefinedInFlight` →
/// one of `Done`, `Error` or `Timeout`. Both failure variants render with an
/// `Error: ` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompileStatus {
    Queued { mode: CompileMode },
    DraftInFlight,
    RefinedInFlight { mode: CompileMode },
    Done { processing_ms: u64 },
    Error { message: String },
    Timeout,
}

impl CompileStatus {
    /// Terminal status for a failed phase.
    ///
    /// Returns `None` for cancellation, which is never shown.
    #[must_use]
    pub fn from_error(err: &CompileError) -> Option<Self> {
        match err {
            CompileError::Cancelled => None,
            CompileError::Timeout { .. } => Some(Self::Timeout),
            CompileError::Status { .. } | CompileError::Transport(_) | CompileError::Decode(_) => {
                Some(Self::Error {
                    message: err.to_string(),
                })
            }
        }
    }
}

impl fmt::Display for CompileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued {
                mode: CompileMode::Live,
            } => write!(f, "Live Compiling..."),
            Self::Queued {
                mode: CompileMode::Manual,
            }
            | Self::DraftInFlight => write!(f, "Generating (Fast)..."),
            Self::RefinedInFlight {
                mode: CompileMode::Live,
            } => write!(f, "AI Thinking..."),
            Self::RefinedInFlight {
                mode: CompileMode::Manual,
            } => write!(f, "Reasoning with Advanced AI..."),
            Self::Done { processing_ms } => write!(f, "Done in {processing_ms}ms"),
            Self::Error { message } => write!(f, "Error: {message}"),
            Self::Timeout => write!(f, "Error: Timeout: AI Model took too long to respond."),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn status_texts() {
        assert_eq!(
            CompileStatus::Queued {
                mode: CompileMode::Live
            }
            .to_string(),
            "Live Compiling..."
        );
        assert_eq!(
            CompileStatus::RefinedInFlight {
                mode: CompileMode::Live
            }
            .to_string(),
            "AI Thinking..."
        );
        assert_eq!(
            CompileStatus::RefinedInFlight {
                mode: CompileMode::Manual
            }
            .to_string(),
            "Reasoning with Advanced AI..."
        );
        assert_eq!(
            CompileStatus::Done { processing_ms: 840 }.to_string(),
            "Done in 840ms"
        );
    }

    #[test]
    fn errors_map_to_terminal_statuses() {
        let status = CompileStatus::from_error(&CompileError::Status { code: 502 }).unwrap();
        assert_eq!(status.to_string(), "Error: API Error: 502");

        let status = CompileStatus::from_error(&CompileError::Transport(String::new())).unwrap();
        assert_eq!(status.to_string(), "Error: Connection Failed");

        let status = CompileStatus::from_error(&CompileError::Timeout {
            after: Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(status, CompileStatus::Timeout);
        assert_eq!(
            status.to_string(),
            "Error: Timeout: AI Model took too long to respond."
        );

        let status =
            CompileStatus::from_error(&CompileError::Decode("missing field".into())).unwrap();
        assert!(status.to_string().starts_with("Error: Invalid response"));

        assert!(CompileStatus::from_error(&CompileError::Cancelled).is_none());
    }
}
