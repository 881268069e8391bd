//! Display-side state fed by [`CompileEvent`]s.
//!
//! Events carry the generation of the token that produced them. Once an
//! event of some generation has been accepted, anything older is ignored,
//! so a slow response for a superseded attempt can never overwrite what a
//! newer attempt already put on screen.

use promptdesk_core::{CompileResult, CompileStatus, PromptField};
use tracing::trace;

use crate::pipeline::{CompileEvent, CompileEventKind};
use crate::token::TokenIssuer;

/// What the user currently sees.
#[derive(Debug, Clone, Default)]
pub struct DisplayState {
    accepted_generation: u64,
    status: Option<CompileStatus>,
    result: Option<CompileResult>,
    issuer: Option<TokenIssuer>,
}

impl DisplayState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also reject events from generations the issuer has moved past, even
    /// before an event from the newer generation arrives.
    #[must_use]
    pub fn with_issuer(mut self, issuer: TokenIssuer) -> Self {
        self.issuer = Some(issuer);
        self
    }

    /// Apply `event`; returns `false` if it was stale and ignored.
    pub fn apply(&mut self, event: &CompileEvent) -> bool {
        let floor = self
            .issuer
            .as_ref()
            .map_or(self.accepted_generation, |i| {
                i.current_generation().max(self.accepted_generation)
            });
        if event.generation < floor {
            trace!(generation = event.generation, floor, "dropping stale compile event");
            return false;
        }

        self.accepted_generation = event.generation;
        match &event.kind {
            CompileEventKind::Status(status) => self.status = Some(status.clone()),
            // The refined response carries the base fields too, so the
            // latest result replaces the previous one wholesale
            CompileEventKind::Result(result) => self.result = Some(result.clone()),
        }
        true
    }

    #[must_use]
    pub const fn status(&self) -> Option<&CompileStatus> {
        self.status.as_ref()
    }

    #[must_use]
    pub const fn result(&self) -> Option<&CompileResult> {
        self.result.as_ref()
    }

    /// Displayed value of `field` (refined wins when present).
    #[must_use]
    pub fn field(&self, field: PromptField) -> Option<&str> {
        self.result.as_ref().map(|r| r.display(field))
    }

    #[must_use]
    pub const fn accepted_generation(&self) -> u64 {
        self.accepted_generation
    }
}
