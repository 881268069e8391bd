//! Forceful termination of a whole process tree by PID.
//!
//! Services are launched through a shell, so the PID we hold is usually the
//! shell and the real server is its child. Killing only the shell would leave
//! the server running with its port bound.

use std::io;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Kill `pid` and all of its descendants.
///
/// - Unix: `SIGKILL` to the process group led by `pid` (children are spawned
///   as group leaders), falling back to the single process.
/// - Windows: `taskkill /pid <pid> /T /F`.
///
/// A process that is already gone is not an error.
pub async fn kill_tree(pid: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        signal_tree(pid, Signal::SIGKILL)
    }

    #[cfg(not(unix))]
    {
        taskkill(pid).await
    }
}

/// Send `sig` to the process group led by `pid`, or to `pid` alone when it
/// is not a group leader.
#[cfg(unix)]
pub(crate) fn signal_tree(pid: u32, sig: Signal) -> io::Result<()> {
    let raw = i32::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("invalid pid {pid}")))?;
    let nix_pid = Pid::from_raw(raw);

    match signal::killpg(nix_pid, sig) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => return Err(io::Error::other(e)),
    }
    // Covers processes that were not spawned as group leaders
    match signal::kill(nix_pid, sig) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(io::Error::other(e)),
    }
}

#[cfg(not(unix))]
async fn taskkill(pid: u32) -> io::Result<()> {
    use std::process::Stdio;
    use tokio::process::Command;

    let status = Command::new("taskkill")
        .args(["/pid", &pid.to_string(), "/T", "/F"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;

    // 128: no such process
    if status.success() || status.code() == Some(128) {
        Ok(())
    } else {
        Err(io::Error::other(format!(
            "taskkill exited with {status} for pid {pid}"
        )))
    }
}
