//! Two-phase compile pipeline.
//!
//! One [`CompileRequestPipeline::run`] call handles one [`InFlightToken`] and
//! ends in exactly one [`PipelineOutcome`]. Progress is reported as
//! [`CompileEvent`]s on a single channel; nothing is emitted for a token once
//! it stops being current.

use std::sync::Arc;
use std::time::Duration;

use promptdesk_core::{
    CompileError, CompileMode, CompilePhase, CompileRequest, CompileResult, CompileStatus,
    CompilerClient, Settings,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::token::InFlightToken;

/// Hard deadline for the refined phase.
pub const DEFAULT_REFINED_TIMEOUT: Duration = Duration::from_secs(190);

/// Progress or result of one compile attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileEvent {
    /// Generation of the token that produced this event.
    pub generation: u64,
    pub correlation_id: Uuid,
    pub kind: CompileEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompileEventKind {
    Status(CompileStatus),
    /// A phase response; `result.phase` says which one.
    Result(CompileResult),
}

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Completed(CompileResult),
    Failed(CompileError),
    /// The token was superseded; nothing further was reported.
    Superseded,
}

/// Issues draft and refined requests for a token and reports progress.
#[derive(Clone)]
pub struct CompileRequestPipeline {
    client: Arc<dyn CompilerClient>,
    events: mpsc::UnboundedSender<CompileEvent>,
    refined_timeout: Duration,
}

impl std::fmt::Debug for CompileRequestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileRequestPipeline")
            .field("refined_timeout", &self.refined_timeout)
            .finish_non_exhaustive()
    }
}

impl CompileRequestPipeline {
    /// Pipeline over `client`, returning the receiving end of its event stream.
    pub fn new(client: Arc<dyn CompilerClient>) -> (Self, mpsc::UnboundedReceiver<CompileEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                client,
                events,
                refined_timeout: DEFAULT_REFINED_TIMEOUT,
            },
            rx,
        )
    }

    #[must_use]
    pub const fn with_refined_timeout(mut self, timeout: Duration) -> Self {
        self.refined_timeout = timeout;
        self
    }

    /// Run one attempt for `token`.
    ///
    /// Manual mode issues a draft then a refined request; live mode goes
    /// straight to refined. A failed draft does not stop the refined phase.
    pub async fn run(
        &self,
        token: InFlightToken,
        text: &str,
        settings: &Settings,
        mode: CompileMode,
    ) -> PipelineOutcome {
        let base = CompileRequest::new(text, settings.llm.clone(), CompilePhase::Draft)
            .with_diagnostics(settings.diagnostics);
        let id = base.correlation_id;
        info!(generation = token.generation(), correlation_id = %id, ?mode, "compile attempt started");

        if !self.emit_status(&token, id, CompileStatus::Queued { mode }) {
            return PipelineOutcome::Superseded;
        }

        if mode.phases().contains(&CompilePhase::Draft) {
            if !self.emit_status(&token, id, CompileStatus::DraftInFlight) {
                return PipelineOutcome::Superseded;
            }
            let draft = self.client.compile(&base, token.cancellation()).await;
            if !token.is_current() {
                debug!(generation = token.generation(), "draft arrived for superseded token, discarding");
                return PipelineOutcome::Superseded;
            }
            match draft {
                Ok(result) => {
                    self.emit(&token, id, CompileEventKind::Result(result));
                }
                Err(CompileError::Cancelled) => return PipelineOutcome::Superseded,
                Err(e) => warn!(correlation_id = %id, error = %e, "draft phase failed, continuing with refined"),
            }
        }

        // Reported even after a failed draft: every attempt that reaches the
        // refined call passes through `RefinedInFlight`

        if !self.emit_status(&token, id, CompileStatus::RefinedInFlight { mode }) {
            return PipelineOutcome::Superseded;
        }

        let refined = self.refine(&base.for_phase(CompilePhase::Refined), &token).await;
        if !token.is_current() {
            debug!(generation = token.generation(), "refined arrived for superseded token, discarding");
            return PipelineOutcome::Superseded;
        }

        match refined {
            Ok(result) => {
                let processing_ms = result.processing_ms;
                self.emit(&token, id, CompileEventKind::Result(result.clone()));
                self.emit_status(&token, id, CompileStatus::Done { processing_ms });
                info!(correlation_id = %id, processing_ms, "compile attempt finished");
                PipelineOutcome::Completed(result)
            }
            Err(CompileError::Cancelled) => PipelineOutcome::Superseded,
            Err(e) => {
                warn!(correlation_id = %id, error = %e, "refined phase failed");
                if let Some(status) = CompileStatus::from_error(&e) {
                    self.emit_status(&token, id, status);
                }
                PipelineOutcome::Failed(e)
            }
        }
    }

    /// Refined call bounded by the wall-clock deadline.
    async fn refine(
        &self,
        request: &CompileRequest,
        token: &InFlightToken,
    ) -> Result<CompileResult, CompileError> {
        let cancel = token.cancellation().child_token();
        match tokio::time::timeout(self.refined_timeout, self.client.compile(request, &cancel)).await
        {
            Ok(result) => result,
            Err(_) => {
                cancel.cancel();
                Err(CompileError::Timeout {
                    after: self.refined_timeout,
                })
            }
        }
    }

    fn emit_status(&self, token: &InFlightToken, id: Uuid, status: CompileStatus) -> bool {
        self.emit(token, id, CompileEventKind::Status(status))
    }

    /// Send an event if `token` is still current. Returns whether it was.
    fn emit(&self, token: &InFlightToken, id: Uuid, kind: CompileEventKind) -> bool {
        if !token.is_current() {
            return false;
        }
        let event = CompileEvent {
            generation: token.generation(),
            correlation_id: id,
            kind,
        };
        if self.events.send(event).is_err() {
            debug!("compile event receiver dropped");
        }
        true
    }
}
