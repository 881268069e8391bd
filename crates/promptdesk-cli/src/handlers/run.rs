//! Run command handler.
//!
//! Starts the backend and then the UI server, hands the terminal to an
//! editing session, and stops both services on the way out, whatever the
//! outcome.

use promptdesk_core::DEFAULT_FRONTEND_PORT;
use promptdesk_runtime::ServiceSupervisor;
use tracing::info;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::live;

/// Execute the run command.
///
/// # Arguments
///
/// * `ctx` - The CLI context
/// * `forward_output` - Whether child stdout/stderr is forwarded into the log
pub async fn execute(ctx: &CliContext, forward_output: bool) -> Result<(), CliError> {
    let specs = ctx.config.service_specs(forward_output);
    for spec in &specs {
        info!(service = %spec.name, command = %spec.command_line(), cwd = %spec.working_dir.display(), "configured service");
    }
    let supervisor = ServiceSupervisor::new(specs)?;

    println!("Starting services...");
    let started = tokio::select! {
        result = supervisor.start_all() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    let result = match started {
        None => {
            println!("Interrupted during startup");
            Ok(())
        }
        Some(Err(e)) => Err(e.into()),
        Some(Ok(())) => {
            for (name, state) in supervisor.states().await {
                println!("✓ {name}: {state}");
            }
            println!("UI available at http://127.0.0.1:{DEFAULT_FRONTEND_PORT}");
            live::session(ctx, ctx.settings()).await
        }
    };

    supervisor.shutdown().await;
    println!("Services stopped");
    result
}
