//! Process termination.
//!
//! Provides two strategies:
//! - `shutdown_child`: graceful-then-forceful for processes we spawned (includes reaping)
//! - `kill_tree`: forceful, PID-only, for leaked processes found holding a port

use std::time::Duration;

mod child;
mod tree;

pub use child::shutdown_child;
pub use tree::kill_tree;

/// How long a process gets to exit after the graceful signal.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);
