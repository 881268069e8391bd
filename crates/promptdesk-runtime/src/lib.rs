//! Process supervision and OS-level concerns for promptdesk.
//!
//! Everything that touches processes, ports, HTTP readiness or the disk
//! lives here, behind the types defined in `promptdesk-core`.
#![deny(unsafe_code)]

pub mod health;
pub mod process;
mod settings_store;
pub mod supervisor;

pub use health::{DEFAULT_ATTEMPT_TIMEOUT, HealthProbe, ProbeError};
pub use process::{ProcessHandle, ProcessStatus, is_port_available, reclaim_ports};
pub use settings_store::JsonSettingsStore;
pub use supervisor::{ServiceSupervisor, SupervisorError};
