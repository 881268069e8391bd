//! In-flight tokens: which compile attempt is authoritative.
//!
//! Every attempt gets a token from a [`TokenIssuer`]. Issuing a new token
//! cancels the previous one and bumps the generation counter, so at most one
//! token is current at any time. Work holding a stale token must drop its
//! results on arrival.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::trace;

#[derive(Debug, Default)]
struct IssuerState {
    latest: AtomicU64,
    cancel: Mutex<Option<CancellationToken>>,
}

/// Hands out [`InFlightToken`]s, invalidating the previous one each time.
///
/// Cheap to clone; clones share the same sequence.
#[derive(Debug, Clone, Default)]
pub struct TokenIssuer {
    state: Arc<IssuerState>,
}

impl TokenIssuer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate the current token and return a fresh authoritative one.
    pub fn issue(&self) -> InFlightToken {
        let cancel = CancellationToken::new();
        let mut slot = self
            .state
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Bump under the lock so generation order matches cancellation order
        let generation = self.state.latest.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = slot.replace(cancel.clone()) {
            previous.cancel();
        }
        drop(slot);

        trace!(generation, "issued in-flight token");
        InFlightToken {
            generation,
            cancel,
            state: Arc::clone(&self.state),
        }
    }

    /// Invalidate the current token without issuing a new one.
    pub fn invalidate(&self) {
        let mut slot = self
            .state
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.state.latest.fetch_add(1, Ordering::SeqCst);
        if let Some(previous) = slot.take() {
            previous.cancel();
        }
    }

    /// Generation of the most recent issue or invalidation.
    #[must_use]
    pub fn current_generation(&self) -> u64 {
        self.state.latest.load(Ordering::SeqCst)
    }
}

/// Handle for one compile attempt.
#[derive(Debug, Clone)]
pub struct InFlightToken {
    generation: u64,
    cancel: CancellationToken,
    state: Arc<IssuerState>,
}

impl InFlightToken {
    /// Monotonic sequence number; newer attempts have larger values.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this token is still the authoritative one.
    #[must_use]
    pub fn is_current(&self) -> bool {
        !self.cancel.is_cancelled() && self.state.latest.load(Ordering::SeqCst) == self.generation
    }

    /// Cancellation fired when this token is superseded.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_token_invalidates_previous() {
        let issuer = TokenIssuer::new();
        let first = issuer.issue();
        assert!(first.is_current());

        let second = issuer.issue();
        assert!(!first.is_current());
        assert!(first.cancellation().is_cancelled());
        assert!(second.is_current());
        assert!(second.generation() > first.generation());
    }

    #[test]
    fn clones_share_sequence() {
        let issuer = TokenIssuer::new();
        let other = issuer.clone();
        let first = issuer.issue();
        let second = other.issue();

        assert!(!first.is_current());
        assert!(second.is_current());
        assert_eq!(issuer.current_generation(), second.generation());
    }

    #[test]
    fn invalidate_leaves_nothing_current() {
        let issuer = TokenIssuer::new();
        let token = issuer.issue();
        issuer.invalidate();
        assert!(!token.is_current());
    }

    #[tokio::test]
    async fn invalidate_wakes_cancellation_waiters() {
        let issuer = TokenIssuer::new();
        let token = issuer.issue();
        let waiter = {
            let cancel = token.cancellation().clone();
            tokio::spawn(async move { cancel.cancelled().await })
        };
        issuer.invalidate();
        waiter.await.unwrap();
        assert!(token.cancellation().is_cancelled());
    }
}
