//! HTTP readiness polling for supervised services.
//!
//! A probe repeatedly GETs a URL until it answers with a success status. The
//! owning process is checked before every attempt and on every poll tick
//! while an attempt is outstanding, so a crashed service is reported within
//! one interval even when its port accepts connections but never answers.

use std::time::Duration;

use promptdesk_core::DEFAULT_POLL_INTERVAL;
use reqwest::Client;
use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, info};

use crate::process::ProcessStatus;

/// Upper bound on a single health request.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);

/// Floor for the in-attempt liveness period; a zero interval would spin.
const MIN_LIVENESS_PERIOD: Duration = Duration::from_millis(10);

/// Terminal failure of a readiness wait.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The process died before the endpoint became healthy.
    #[error("process exited early (code={})", .code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    Exited { code: Option<i32> },

    /// The deadline passed without a successful response.
    #[error("did not become healthy within {}s", .after.as_secs_f32())]
    TimedOut { after: Duration },

    /// The HTTP client could not be constructed.
    #[error("health client unavailable: {0}")]
    Client(String),
}

/// Readiness poller with a fixed interval.
#[derive(Debug, Clone)]
pub struct HealthProbe {
    client: Client,
    interval: Duration,
    attempt_timeout: Duration,
}

impl HealthProbe {
    /// Probe polling every `interval`.
    pub fn new(interval: Duration) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| ProbeError::Client(e.to_string()))?;
        Ok(Self {
            client,
            interval,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        })
    }

    /// Probe with the default 1 s interval.
    pub fn with_defaults() -> Result<Self, ProbeError> {
        Self::new(DEFAULT_POLL_INTERVAL)
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// One GET; `true` only on a 2xx response within `timeout`.
    pub async fn check_once(&self, url: &str, timeout: Duration) -> bool {
        match self.client.get(url).timeout(timeout).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(url, status = %response.status(), "health check not ready");
                false
            }
            Err(e) => {
                debug!(url, error = %e, "health check failed, retrying");
                false
            }
        }
    }

    /// Poll `url` until healthy, the process exits, or `deadline` elapses.
    ///
    /// `liveness` is queried before every attempt and once per interval while
    /// an attempt is in flight. Transport errors and non-success statuses are
    /// retried silently.
    pub async fn wait_until_healthy<F>(
        &self,
        url: &str,
        deadline: Duration,
        mut liveness: F,
    ) -> Result<(), ProbeError>
    where
        F: FnMut() -> ProcessStatus,
    {
        let started = Instant::now();
        let give_up_at = started + deadline;
        let mut attempt: u32 = 0;

        loop {
            if let ProcessStatus::Exited(code) = liveness() {
                return Err(ProbeError::Exited { code });
            }

            let remaining = give_up_at.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ProbeError::TimedOut { after: deadline });
            }

            attempt += 1;
            let check = self.check_once(url, self.attempt_timeout.min(remaining));
            tokio::pin!(check);
            let period = self.interval.max(MIN_LIVENESS_PERIOD);
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let healthy = loop {
                tokio::select! {
                    healthy = &mut check => break healthy,
                    _ = ticks.tick() => {
                        if let ProcessStatus::Exited(code) = liveness() {
                            debug!(url, attempt, "process exited during health attempt");
                            return Err(ProbeError::Exited { code });
                        }
                    }
                }
            };
            if healthy {
                info!(url, attempt, elapsed_ms = started.elapsed().as_millis(), "service is healthy");
                return Ok(());
            }

            let remaining = give_up_at.saturating_duration_since(Instant::now());
            sleep(self.interval.min(remaining)).await;
        }
    }
}
