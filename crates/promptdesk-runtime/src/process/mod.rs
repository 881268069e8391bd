//! Process management for supervised services.
//!
//! # Structure
//!
//! - `ProcessHandle` - spawn, liveness query, graceful-then-forceful termination
//! - `shutdown` - termination strategies (owned child vs. bare PID)
//! - `ports` - port probing and platform-specific reclamation
//! - `stream` - lossy line forwarding of child output into the log

mod handle;
pub mod ports;
pub mod shutdown;
mod stream;

pub use handle::{ProcessHandle, ProcessStatus};
pub use ports::{is_port_available, listening_pids, reclaim_ports};
pub use shutdown::{DEFAULT_GRACE_PERIOD, kill_tree, shutdown_child};
