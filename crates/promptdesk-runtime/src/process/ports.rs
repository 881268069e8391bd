//! Listening-port probing and reclamation.
//!
//! On Windows, shell-spawned trees that outlive their parent keep the port
//! bound and the next launch fails. Reclamation finds the owning PIDs with
//! `netstat -ano` and tree-kills them. Elsewhere it is a no-op: the process
//! groups we spawn are torn down by signal.

use std::net::TcpListener;

#[cfg(not(windows))]
use tracing::debug;
#[cfg(windows)]
use tracing::{info, warn};

/// Check if a port is free by binding and immediately releasing it.
pub fn is_port_available(port: u16) -> bool {
    TcpListener::bind(("127.0.0.1", port)).is_ok_and(|listener| listener.local_addr().is_ok())
}

/// Best-effort reclamation of `ports`. Returns the PIDs that were killed.
///
/// Never fails; problems are logged and skipped.
pub async fn reclaim_ports(ports: &[u16]) -> Vec<u32> {
    if ports.is_empty() {
        return Vec::new();
    }

    #[cfg(windows)]
    {
        reclaim_windows(ports).await
    }

    #[cfg(not(windows))]
    {
        debug!(?ports, "port reclamation is a no-op on this platform");
        Vec::new()
    }
}

#[cfg(windows)]
async fn reclaim_windows(ports: &[u16]) -> Vec<u32> {
    use std::process::Stdio;
    use tokio::process::Command;

    let output = match Command::new("netstat")
        .arg("-ano")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, "netstat unavailable, skipping port reclamation");
            return Vec::new();
        }
    };
    let table = String::from_utf8_lossy(&output.stdout);
    let own_pid = std::process::id();

    let mut killed = Vec::new();
    for &port in ports {
        for pid in listening_pids(&table, port) {
            if pid == own_pid || killed.contains(&pid) {
                continue;
            }
            match super::shutdown::kill_tree(pid).await {
                Ok(()) => {
                    info!(port, pid, "reclaimed port from leftover process");
                    killed.push(pid);
                }
                Err(e) => warn!(port, pid, error = %e, "failed to reclaim port"),
            }
        }
    }
    killed
}

/// PIDs listening on `port` according to `netstat -ano` output.
///
/// Only TCP rows in the `LISTENING` state whose local address ends in
/// `:<port>` are considered. PID 0 (System Idle) is never returned.
pub fn listening_pids(netstat_output: &str, port: u16) -> Vec<u32> {
    let suffix = format!(":{port}");
    let mut pids = Vec::new();

    for line in netstat_output.lines() {
        let cols: Vec<&str> = line.split_whitespace().collect();
        let [proto, local, _remote, state, pid] = cols.as_slice() else {
            continue;
        };
        if !proto.eq_ignore_ascii_case("TCP") || !state.eq_ignore_ascii_case("LISTENING") {
            continue;
        }
        if !local.ends_with(&suffix) {
            continue;
        }
        match pid.parse::<u32>() {
            Ok(0) | Err(_) => {}
            Ok(pid) if !pids.contains(&pid) => pids.push(pid),
            Ok(_) => {}
        }
    }

    pids
}

#[cfg(test)]
mod tests {
    use super::*;

    const NETSTAT: &str = "
Active Connections

  Proto  Local Address          Foreign Address        State           PID
  TCP    0.0.0.0:135            0.0.0.0:0              LISTENING       1044
  TCP    127.0.0.1:8080         0.0.0.0:0              LISTENING       5120
  TCP    127.0.0.1:18080        0.0.0.0:0              LISTENING       7777
  TCP    127.0.0.1:8080         127.0.0.1:51234        ESTABLISHED     5120
  TCP    127.0.0.1:51234        127.0.0.1:8080         ESTABLISHED     9001
  TCP    [::]:3000              [::]:0                 LISTENING       6200
  TCP    [::1]:3000             [::]:0                 LISTENING       6200
  TCP    0.0.0.0:3000           0.0.0.0:0              LISTENING       0
  UDP    0.0.0.0:8080           *:*                                    4242
";

    #[test]
    fn finds_listener_for_port() {
        assert_eq!(listening_pids(NETSTAT, 8080), vec![5120]);
    }

    #[test]
    fn handles_ipv6_and_dedups() {
        assert_eq!(listening_pids(NETSTAT, 3000), vec![6200]);
    }

    #[test]
    fn no_listener_yields_empty() {
        assert!(listening_pids(NETSTAT, 9999).is_empty());
        assert!(listening_pids("", 8080).is_empty());
    }

    #[test]
    fn bound_port_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(!is_port_available(port));
        drop(listener);
    }

    #[tokio::test]
    #[cfg(not(windows))]
    async fn reclaim_is_noop_off_windows() {
        assert!(reclaim_ports(&[8080, 3000]).await.is_empty());
    }
}
