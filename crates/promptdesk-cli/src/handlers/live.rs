//! Interactive editing session.
//!
//! Each stdin line replaces the whole text. With live mode on, lines are
//! debounced and compiled in the background; with it off, every line is a
//! manual Generate.
//!
//! Stdin is read on a detached OS thread. A blocking read parked there does
//! not hold up runtime shutdown after Ctrl-C.

use std::io::BufRead;
use std::sync::Arc;

use promptdesk_compile::{
    CompileRequestPipeline, HttpCompilerClient, LiveEditController, PipelineOutcome, TokenIssuer,
    edits_from_channel,
};
use promptdesk_core::{CompileMode, Settings};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::compile::render_events;

/// Execute the live command; live mode is forced on for the session.
pub async fn execute(ctx: &CliContext) -> Result<(), CliError> {
    let mut settings = ctx.settings();
    settings.live_mode = true;
    session(ctx, settings).await
}

/// Read edits from stdin until EOF or Ctrl-C.
pub(crate) async fn session(ctx: &CliContext, settings: Settings) -> Result<(), CliError> {
    let client = HttpCompilerClient::new(ctx.config.backend_url.clone())?;
    info!(backend = client.base_url(), live = settings.live_mode, "starting edit session");
    let (pipeline, events) = CompileRequestPipeline::new(Arc::new(client));
    let issuer = TokenIssuer::new();
    let printer = tokio::spawn(render_events(events, issuer.clone()));

    if settings.live_mode {
        println!("Live mode: type text and press Enter; each line replaces the text. Ctrl-D to stop.");
        live_session(pipeline, issuer, settings).await?;
    } else {
        println!("Manual mode: each line is compiled (draft, then refined). Ctrl-D to stop.");
        manual_session(pipeline, issuer, settings).await?;
    }

    printer.await?;
    Ok(())
}

async fn live_session(
    pipeline: CompileRequestPipeline,
    issuer: TokenIssuer,
    settings: Settings,
) -> Result<(), CliError> {
    let (_settings_tx, settings_rx) = watch::channel(settings);
    let controller = LiveEditController::new(pipeline, settings_rx).with_issuer(issuer.clone());
    let lines = spawn_line_reader(std::io::BufReader::new(std::io::stdin()))?;

    tokio::select! {
        () = controller.run(edits_from_channel(lines)) => debug!("stdin closed"),
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, cancelling in-flight compile");
            issuer.invalidate();
        }
    }
    Ok(())
}

async fn manual_session(
    pipeline: CompileRequestPipeline,
    issuer: TokenIssuer,
    settings: Settings,
) -> Result<(), CliError> {
    let mut lines = spawn_line_reader(std::io::BufReader::new(std::io::stdin()))?;

    loop {
        let line = tokio::select! {
            line = lines.recv() => line,
            _ = tokio::signal::ctrl_c() => {
                issuer.invalidate();
                None
            }
        };
        let Some(text) = line else { break };
        if text.trim().is_empty() {
            continue;
        }
        if let PipelineOutcome::Failed(err) = pipeline
            .run(issuer.issue(), &text, &settings, CompileMode::Manual)
            .await
        {
            debug!(error = %err, "manual compile failed");
        }
    }
    Ok(())
}

/// Forward lines from `reader` on a detached thread.
///
/// The channel closes at EOF or on the first read error; the thread stops
/// once the receiver is dropped and the next line arrives.
fn spawn_line_reader<R>(reader: R) -> std::io::Result<mpsc::Receiver<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);
    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else {
                    break;
                };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}
