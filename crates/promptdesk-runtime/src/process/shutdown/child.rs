//! Graceful shutdown of a `tokio::process::Child` with forceful escalation.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::timeout;
use tracing::debug;

use super::tree::kill_tree;

#[cfg(unix)]
use nix::sys::signal::Signal;

/// Shut down `child`, escalating to a forceful tree kill after `grace`.
///
/// # Strategy
/// 1. Unix: send SIGTERM to the child's process group and wait up to `grace`
/// 2. If still running (or on Windows), kill the whole tree by PID
/// 3. Wait for reaping so no zombie is left behind
pub async fn shutdown_child(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    // Already reaped or exited on its own
    if let Some(status) = child.try_wait()? {
        return Ok(status);
    }
    let Some(pid) = child.id() else {
        return child.wait().await;
    };

    #[cfg(unix)]
    {
        super::tree::signal_tree(pid, Signal::SIGTERM)?;
        if let Ok(result) = timeout(grace, child.wait()).await {
            return result;
        }
        debug!(pid, "grace period elapsed, escalating to SIGKILL");
    }

    #[cfg(not(unix))]
    {
        // No SIGTERM equivalent; go straight to the tree kill
        let _ = grace;
    }

    kill_tree(pid).await?;

    // taskkill may fail on a tree it cannot open; make sure the direct child dies
    match timeout(Duration::from_secs(2), child.wait()).await {
        Ok(result) => result,
        Err(_) => {
            debug!(pid, "tree kill did not reap child, killing directly");
            child.kill().await?;
            child.wait().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::process::Command;
    use tokio::time::sleep;

    #[tokio::test]
    #[cfg(unix)]
    async fn shutdown_responds_to_sigterm() {
        let mut child = Command::new("sleep")
            .arg("30")
            .process_group(0)
            .spawn()
            .expect("failed to spawn sleep");

        let result = shutdown_child(&mut child, Duration::from_secs(5)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn shutdown_escalates_when_sigterm_ignored() {
        let mut child = Command::new("sh")
            .args(["-c", "trap '' TERM; sleep 30"])
            .process_group(0)
            .spawn()
            .expect("failed to spawn sh");
        // Let the shell install its trap
        sleep(Duration::from_millis(200)).await;

        let started = std::time::Instant::now();
        let status = shutdown_child(&mut child, Duration::from_millis(300))
            .await
            .expect("shutdown failed");
        assert!(!status.success());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn shutdown_handles_already_exited() {
        let mut child = Command::new("echo")
            .arg("test")
            .stdout(std::process::Stdio::null())
            .spawn()
            .expect("failed to spawn echo");

        sleep(Duration::from_millis(100)).await;

        let status = shutdown_child(&mut child, Duration::from_secs(1))
            .await
            .expect("shutdown failed");
        assert!(status.success());
    }
}
