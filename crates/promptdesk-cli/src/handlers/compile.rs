//! One-shot compile handler.
//!
//! Runs a manual attempt (draft, then refined) and prints each accepted event.

use std::sync::Arc;

use promptdesk_compile::{
    CompileEvent, CompileRequestPipeline, DisplayState, HttpCompilerClient, PipelineOutcome,
    TokenIssuer,
};
use promptdesk_core::CompileMode;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::print_event;

/// Execute the compile command.
///
/// # Arguments
///
/// * `ctx` - The CLI context
/// * `text` - Text to compile
pub async fn execute(ctx: &CliContext, text: &str) -> Result<(), CliError> {
    if text.trim().is_empty() {
        return Err(CliError::Arguments("nothing to compile".to_string()));
    }

    let settings = ctx.settings();
    let client = HttpCompilerClient::new(ctx.config.backend_url.clone())?;
    debug!(backend = client.base_url(), "compiling");
    let (pipeline, events) = CompileRequestPipeline::new(Arc::new(client));
    let issuer = TokenIssuer::new();
    let printer = tokio::spawn(render_events(events, issuer.clone()));

    let outcome = pipeline
        .run(issuer.issue(), text, &settings, CompileMode::Manual)
        .await;
    // Closing the last sender ends the printer
    drop(pipeline);
    printer.await?;

    match outcome {
        PipelineOutcome::Completed(_) | PipelineOutcome::Superseded => Ok(()),
        PipelineOutcome::Failed(err) => Err(err.into()),
    }
}

/// Print accepted events until every sender is gone.
pub(crate) async fn render_events(
    mut events: UnboundedReceiver<CompileEvent>,
    issuer: TokenIssuer,
) -> DisplayState {
    let mut display = DisplayState::new().with_issuer(issuer);
    while let Some(event) = events.recv().await {
        if display.apply(&event) {
            print_event(&display, &event);
        } else {
            debug!(generation = event.generation, "stale event not shown");
        }
    }
    display
}
