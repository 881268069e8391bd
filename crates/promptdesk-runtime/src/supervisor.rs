//! Service supervisor for the compiler backend and the UI server.
//!
//! The supervisor owns every spawned process and every service state. Callers
//! only ever see snapshots.
//!
//! Key behaviour:
//! - **Ordered startup**: each service must be healthy before the next starts
//! - **Fail fast**: a process that exits during startup fails its service at
//!   the next poll instead of after the full deadline
//! - **Single error**: a failed startup cleans up everything already started
//!   and reports one error naming the failing service
//! - **Idempotent shutdown**: safe before start, after failure, and repeatedly

use std::time::Duration;

use promptdesk_core::{ServiceSpec, ServiceState};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::health::{HealthProbe, ProbeError};
use crate::process::{DEFAULT_GRACE_PERIOD, ProcessHandle, reclaim_ports};

/// Error from supervisor operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SupervisorError {
    /// `start_all` was called on a supervisor that already ran.
    #[error("Services were already started")]
    AlreadyStarted,

    /// A service could not be launched or never became healthy.
    #[error("{service} failed to start: {reason}. {remediation}")]
    StartFailed {
        service: String,
        reason: String,
        remediation: String,
    },
}

impl SupervisorError {
    /// Name of the failing service, if any.
    #[must_use]
    pub fn service(&self) -> Option<&str> {
        match self {
            Self::StartFailed { service, .. } => Some(service),
            Self::AlreadyStarted => None,
        }
    }
}

struct Slot {
    spec: ServiceSpec,
    state: ServiceState,
    handle: Option<ProcessHandle>,
}

impl Slot {
    fn transition(&mut self, next: ServiceState) {
        if self.state.can_transition_to(&next) {
            debug!(service = %self.spec.name, from = %self.state, to = %next, "service state change");
            self.state = next;
        } else {
            warn!(service = %self.spec.name, from = %self.state, to = %next, "ignoring invalid state transition");
        }
    }
}

/// Starts services in order and tears them down in reverse.
///
/// # Example
///
/// ```ignore
/// let supervisor = ServiceSupervisor::new(vec![
///     ServiceSpec::backend(&root),
///     ServiceSpec::frontend(&root),
/// ])?;
/// supervisor.start_all().await?;
/// assert!(supervisor.readiness().await);
/// supervisor.shutdown().await;
/// ```
pub struct ServiceSupervisor {
    probe: HealthProbe,
    grace: Duration,
    slots: Mutex<Vec<Slot>>,
}

impl ServiceSupervisor {
    /// Supervisor for `specs`, started in the given order.
    pub fn new(specs: Vec<ServiceSpec>) -> Result<Self, ProbeError> {
        Ok(Self::with_probe(specs, HealthProbe::with_defaults()?))
    }

    #[must_use]
    pub fn with_probe(specs: Vec<ServiceSpec>, probe: HealthProbe) -> Self {
        let slots = specs
            .into_iter()
            .map(|spec| Slot {
                spec,
                state: ServiceState::NotStarted,
                handle: None,
            })
            .collect();
        Self {
            probe,
            grace: DEFAULT_GRACE_PERIOD,
            slots: Mutex::new(slots),
        }
    }

    /// Override how long each process gets to exit after SIGTERM.
    #[must_use]
    pub const fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Start every service in order, waiting for each to become healthy.
    ///
    /// On failure everything already started is terminated and the error
    /// names the service that failed.
    pub async fn start_all(&self) -> Result<(), SupervisorError> {
        let mut slots = self.slots.lock().await;

        if slots
            .iter()
            .any(|s| !matches!(s.state, ServiceState::NotStarted))
        {
            return Err(SupervisorError::AlreadyStarted);
        }

        reclaim_ports(&all_ports(&slots)).await;

        let mut failure = None;
        for slot in slots.iter_mut() {
            if let Err(err) = self.start_one(slot).await {
                failure = Some(err);
                break;
            }
        }
        if let Some(err) = failure {
            error!(%err, "service startup failed, cleaning up");
            self.stop_all(&mut slots).await;
            return Err(err);
        }

        info!(services = slots.len(), "all services ready");
        Ok(())
    }

    async fn start_one(&self, slot: &mut Slot) -> Result<(), SupervisorError> {
        slot.transition(ServiceState::Starting);
        let fail = |slot: &mut Slot, reason: String| {
            slot.transition(ServiceState::Failed(reason.clone()));
            SupervisorError::StartFailed {
                service: slot.spec.name.clone(),
                reason,
                remediation: slot.spec.remediation.clone(),
            }
        };

        let handle = match ProcessHandle::spawn(&slot.spec) {
            Ok(handle) => handle.with_grace_period(self.grace),
            Err(e) => return Err(fail(slot, format!("could not launch process: {e}"))),
        };
        let handle = slot.handle.insert(handle);

        info!(
            service = %handle.name(),
            pid = ?handle.pid(),
            url = %slot.spec.health_url,
            timeout_s = slot.spec.readiness_timeout.as_secs(),
            poll_ms = self.probe.interval().as_millis(),
            "waiting for service"
        );
        let outcome = self
            .probe
            .wait_until_healthy(&slot.spec.health_url, slot.spec.readiness_timeout, || {
                handle.status()
            })
            .await;

        match outcome {
            Ok(()) => {
                slot.transition(ServiceState::Ready);
                info!(service = %slot.spec.name, "service ready");
                Ok(())
            }
            Err(e) => Err(fail(slot, e.to_string())),
        }
    }

    /// Terminate every service in reverse order and reclaim their ports.
    ///
    /// Never fails. Safe to call before `start_all` and any number of times.
    pub async fn shutdown(&self) {
        let mut slots = self.slots.lock().await;
        self.stop_all(&mut slots).await;
    }

    async fn stop_all(&self, slots: &mut [Slot]) {
        for slot in slots.iter_mut().rev() {
            if let Some(mut handle) = slot.handle.take() {
                if let Err(e) = handle.terminate(false).await {
                    warn!(service = %slot.spec.name, error = %e, "graceful termination failed, forcing");
                    if let Err(e) = handle.terminate(true).await {
                        warn!(service = %slot.spec.name, error = %e, "forceful termination failed");
                    }
                }
            }

            match slot.state {
                ServiceState::Ready => slot.transition(ServiceState::Stopped),
                // Interrupted mid-startup
                ServiceState::Starting => {
                    slot.transition(ServiceState::Failed("startup interrupted".to_string()));
                }
                _ => {}
            }
        }

        let killed = reclaim_ports(&all_ports(slots)).await;
        if !killed.is_empty() {
            info!(?killed, "reclaimed ports after shutdown");
        }
    }

    /// `true` only when every service is ready.
    pub async fn readiness(&self) -> bool {
        let slots = self.slots.lock().await;
        !slots.is_empty() && slots.iter().all(|s| s.state.is_ready())
    }

    /// Snapshot of `(name, state)` in start order.
    pub async fn states(&self) -> Vec<(String, ServiceState)> {
        let slots = self.slots.lock().await;
        slots
            .iter()
            .map(|s| (s.spec.name.clone(), s.state.clone()))
            .collect()
    }
}

fn all_ports(slots: &[Slot]) -> Vec<u16> {
    let mut ports: Vec<u16> = Vec::new();
    for port in slots.iter().flat_map(|s| s.spec.ports.iter().copied()) {
        if !ports.contains(&port) {
            ports.push(port);
        }
    }
    ports
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supervisor(specs: Vec<ServiceSpec>) -> ServiceSupervisor {
        let probe = HealthProbe::new(Duration::from_millis(50)).unwrap();
        ServiceSupervisor::with_probe(specs, probe)
    }

    #[tokio::test]
    async fn shutdown_before_start_is_noop() {
        let sup = supervisor(vec![ServiceSpec::new("Backend", "true")]);
        sup.shutdown().await;
        sup.shutdown().await;

        assert_eq!(
            sup.states().await,
            vec![("Backend".to_string(), ServiceState::NotStarted)]
        );
        assert!(!sup.readiness().await);
    }

    #[tokio::test]
    async fn spawn_failure_names_service() {
        let spec = ServiceSpec::new("Backend", "/nonexistent/promptdesk-binary")
            .with_health_url("http://127.0.0.1:9/health")
            .with_remediation("Install it.");
        let sup = supervisor(vec![spec]);

        let err = sup.start_all().await.unwrap_err();
        assert_eq!(err.service(), Some("Backend"));
        assert!(err.to_string().starts_with("Backend failed to start: could not launch process"));
        assert!(err.to_string().ends_with("Install it."));
        assert!(matches!(sup.states().await[0].1, ServiceState::Failed(_)));

        assert_eq!(sup.start_all().await, Err(SupervisorError::AlreadyStarted));
    }

    #[test]
    fn ports_are_collected_in_order() {
        let slots = vec![
            Slot {
                spec: ServiceSpec::new("a", "x").with_ports([8080]),
                state: ServiceState::NotStarted,
                handle: None,
            },
            Slot {
                spec: ServiceSpec::new("b", "y").with_ports([3000]),
                state: ServiceState::NotStarted,
                handle: None,
            },
        ];
        assert_eq!(all_ports(&slots), vec![8080, 3000]);
    }

    #[test]
    fn shared_ports_are_listed_once() {
        let slot = |name: &str, ports: &[u16]| Slot {
            spec: ServiceSpec::new(name, "x").with_ports(ports.iter().copied()),
            state: ServiceState::NotStarted,
            handle: None,
        };
        let slots = vec![slot("a", &[8080]), slot("b", &[3000, 8080]), slot("c", &[3000])];
        assert_eq!(all_ports(&slots), vec![8080, 3000]);
    }
}
