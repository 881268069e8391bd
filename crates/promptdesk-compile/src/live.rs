//! Live editing: debounce raw edits into compile triggers.
//!
//! The debouncer is a plain stream adapter. The controller consumes it,
//! suppresses blank triggers, and starts a live-mode pipeline run for each
//! remaining trigger after superseding whatever was in flight.

use std::time::Duration;

use async_stream::stream;
use futures_util::{Stream, StreamExt};
use promptdesk_core::{CompileMode, Settings};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::pipeline::CompileRequestPipeline;
use crate::token::TokenIssuer;

/// Quiescence window after the last edit.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(600);

/// Emit the latest edit once `window` has passed without another edit.
///
/// Every edit restarts the timer. When `edits` ends, a pending edit that
/// has not fired yet is dropped.
pub fn debounced<S>(edits: S, window: Duration) -> impl Stream<Item = String> + Send
where
    S: Stream<Item = String> + Send + 'static,
{
    stream! {
        let mut edits = Box::pin(edits);
        let mut pending: Option<String> = None;
        let timer = sleep(window);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                edit = edits.next() => {
                    let Some(text) = edit else {
                        if pending.is_some() {
                            debug!("edit source closed, dropping pending edit");
                        }
                        break;
                    };
                    pending = Some(text);
                    timer.as_mut().reset(Instant::now() + window);
                }
                () = &mut timer, if pending.is_some() => {
                    if let Some(text) = pending.take() {
                        yield text;
                    }
                }
            }
        }
    }
}

/// Adapt an mpsc receiver into an edit stream.
pub fn edits_from_channel(mut rx: mpsc::Receiver<String>) -> impl Stream<Item = String> + Send {
    stream! {
        while let Some(text) = rx.recv().await {
            yield text;
        }
    }
}

/// Turns debounced edits into live-mode compile attempts.
#[derive(Debug)]
pub struct LiveEditController {
    pipeline: CompileRequestPipeline,
    issuer: TokenIssuer,
    settings: watch::Receiver<Settings>,
    window: Duration,
}

impl LiveEditController {
    /// Controller reading the live-mode toggle and LLM config from `settings`.
    #[must_use]
    pub fn new(pipeline: CompileRequestPipeline, settings: watch::Receiver<Settings>) -> Self {
        Self {
            pipeline,
            issuer: TokenIssuer::new(),
            settings,
            window: DEFAULT_DEBOUNCE,
        }
    }

    /// Share an issuer with other triggers (e.g. manual generate).
    #[must_use]
    pub fn with_issuer(mut self, issuer: TokenIssuer) -> Self {
        self.issuer = issuer;
        self
    }

    #[must_use]
    pub const fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Consume `edits` until the source closes.
    ///
    /// Returns after the last started attempt has finished.
    pub async fn run<S>(self, edits: S)
    where
        S: Stream<Item = String> + Send + 'static,
    {
        let triggers = debounced(edits, self.window);
        tokio::pin!(triggers);
        let mut latest: Option<JoinHandle<()>> = None;

        while let Some(text) = triggers.next().await {
            if text.trim().is_empty() {
                debug!("blank edit, no compile");
                continue;
            }
            let settings = self.settings.borrow().clone();
            if !settings.live_mode {
                debug!("live mode disabled, ignoring trigger");
                continue;
            }

            let token = self.issuer.issue();
            info!(generation = token.generation(), chars = text.len(), "live compile triggered");

            let pipeline = self.pipeline.clone();
            // The previous task was cancelled by `issue` and winds down on its own
            latest = Some(tokio::spawn(async move {
                pipeline
                    .run(token, &text, &settings, CompileMode::Live)
                    .await;
            }));
        }

        if let Some(task) = latest {
            if let Err(e) = task.await {
                warn!(error = %e, "live compile task failed");
            }
        }
        debug!("live edit controller stopped");
    }
}
