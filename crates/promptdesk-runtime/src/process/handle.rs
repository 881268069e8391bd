//! Handle to one spawned service process.

use std::fmt;
use std::io;
use std::process::Stdio;
use std::time::Duration;

use promptdesk_core::ServiceSpec;
use tokio::process::{Child, Command};
use tracing::{debug, info};

use super::shutdown::{DEFAULT_GRACE_PERIOD, kill_tree, shutdown_child};
use super::stream::{StreamKind, spawn_stream_reader};

/// Non-blocking liveness of a spawned process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Running,
    /// Exited; `None` when terminated by a signal.
    Exited(Option<i32>),
}

impl ProcessStatus {
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Exited(Some(code)) => write!(f, "exited (code={code})"),
            Self::Exited(None) => write!(f, "exited (signal)"),
        }
    }
}

/// A running external process built from a [`ServiceSpec`].
///
/// On Unix the child leads its own process group so termination reaches
/// anything the launch shell spawned. The child is killed if the handle is
/// dropped without [`ProcessHandle::terminate`].
pub struct ProcessHandle {
    name: String,
    pid: Option<u32>,
    child: Child,
    grace: Duration,
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("name", &self.name)
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

impl ProcessHandle {
    /// Spawn the process described by `spec`.
    pub fn spawn(spec: &ServiceSpec) -> io::Result<Self> {
        let mut cmd = build_command(spec);
        let mut child = cmd.spawn()?;
        let pid = child.id();

        info!(service = %spec.name, pid = ?pid, cwd = %spec.working_dir.display(), "spawned service process");

        if spec.forward_output {
            let prefix = spec.log_prefix();
            if let Some(stdout) = child.stdout.take() {
                spawn_stream_reader(stdout, prefix.clone(), StreamKind::Stdout);
            }
            if let Some(stderr) = child.stderr.take() {
                spawn_stream_reader(stderr, prefix, StreamKind::Stderr);
            }
        }

        Ok(Self {
            name: spec.name.clone(),
            pid,
            child,
            grace: DEFAULT_GRACE_PERIOD,
        })
    }

    /// Override the SIGTERM grace period.
    #[must_use]
    pub const fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// PID captured at spawn time.
    #[must_use]
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Query liveness without blocking.
    ///
    /// An OS error while querying is reported as still running; the health
    /// deadline bounds how long that can mislead a caller.
    pub fn status(&mut self) -> ProcessStatus {
        match self.child.try_wait() {
            Ok(Some(status)) => ProcessStatus::Exited(status.code()),
            Ok(None) => ProcessStatus::Running,
            Err(e) => {
                debug!(service = %self.name, error = %e, "try_wait failed");
                ProcessStatus::Running
            }
        }
    }

    /// Terminate the process.
    ///
    /// Graceful first with escalation after the grace period. With
    /// `forceful`, the tree is killed immediately.
    pub async fn terminate(&mut self, forceful: bool) -> io::Result<ProcessStatus> {
        if let ProcessStatus::Exited(code) = self.status() {
            debug!(service = %self.name, ?code, "process already exited");
            return Ok(ProcessStatus::Exited(code));
        }

        let status = if forceful {
            if let Some(pid) = self.pid {
                kill_tree(pid).await?;
            }
            // The tree kill may already have taken the child down
            let _ = self.child.start_kill();
            self.child.wait().await?
        } else {
            shutdown_child(&mut self.child, self.grace).await?
        };

        info!(service = %self.name, pid = ?self.pid, %status, "service process terminated");
        Ok(ProcessStatus::Exited(status.code()))
    }
}

fn build_command(spec: &ServiceSpec) -> Command {
    let mut cmd = if spec.shell {
        shell_command(&spec.command_line())
    } else {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        cmd
    };

    cmd.current_dir(&spec.working_dir)
        .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .kill_on_drop(true);

    if spec.forward_output {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    } else {
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
    }

    #[cfg(unix)]
    cmd.process_group(0);

    #[cfg(windows)]
    {
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }

    cmd
}

#[cfg(unix)]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(line);
    cmd
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(line);
    cmd
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn sh(script: &str) -> ServiceSpec {
        ServiceSpec::new("Test", script)
            .with_shell(true)
            .with_working_dir(std::env::temp_dir())
    }

    #[tokio::test]
    async fn status_reports_exit_code() {
        let mut handle = ProcessHandle::spawn(&sh("exit 3")).unwrap();
        for _ in 0..50 {
            if !handle.status().is_running() {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(handle.status(), ProcessStatus::Exited(Some(3)));
    }

    #[tokio::test]
    async fn terminate_running_process() {
        let mut handle = ProcessHandle::spawn(&sh("sleep 30")).unwrap();
        assert!(handle.pid().is_some());
        assert_eq!(handle.status(), ProcessStatus::Running);

        let status = handle.terminate(false).await.unwrap();
        assert!(!status.is_running());
        assert!(!handle.status().is_running());
    }

    #[tokio::test]
    async fn forceful_terminate_and_repeat() {
        let mut handle = ProcessHandle::spawn(&sh("sleep 30")).unwrap();
        handle.terminate(true).await.unwrap();
        // Second call sees the exited process and does nothing
        let status = handle.terminate(true).await.unwrap();
        assert!(!status.is_running());
    }

    #[tokio::test]
    async fn env_overlay_reaches_child() {
        let spec = sh("test \"$PD_PROBE\" = yes").with_env("PD_PROBE", "yes");
        let mut handle = ProcessHandle::spawn(&spec).unwrap();
        for _ in 0..50 {
            if !handle.status().is_running() {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(handle.status(), ProcessStatus::Exited(Some(0)));
    }
}
