//! Cleanup command handler.

use promptdesk_runtime::{is_port_available, reclaim_ports};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the cleanup command.
///
/// Stops whatever still listens on the service ports, then reports any port
/// that remains busy.
pub async fn execute(ctx: &CliContext) -> Result<(), CliError> {
    let ports: Vec<u16> = ctx
        .config
        .service_specs(false)
        .iter()
        .flat_map(|spec| spec.ports.iter().copied())
        .collect();

    let killed = reclaim_ports(&ports).await;
    if !killed.is_empty() {
        println!("✓ Stopped {} leftover process(es): {killed:?}", killed.len());
    }

    let busy: Vec<u16> = ports
        .iter()
        .copied()
        .filter(|port| !is_port_available(*port))
        .collect();
    if busy.is_empty() {
        println!("✓ Ports {ports:?} are free");
        Ok(())
    } else {
        Err(CliError::Process(format!("ports still in use: {busy:?}")))
    }
}
