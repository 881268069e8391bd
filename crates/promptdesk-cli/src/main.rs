//! CLI entry point.
//!
//! Loads `.env`, sets up logging, resolves configuration through bootstrap
//! and routes each command to its handler.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use promptdesk_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command.as_ref() else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    if let Err(err) = dispatch(&cli, command).await {
        eprintln!("Error: {err}");
        std::process::exit(err.exit_code());
    }
    Ok(())
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: &Cli, command: &Commands) -> Result<(), CliError> {
    let ctx = bootstrap(CliConfig::from_cli(cli)?)?;

    match command {
        Commands::Run { forward_output } => handlers::run::execute(&ctx, *forward_output).await,
        Commands::Compile { text } => handlers::compile::execute(&ctx, &text.join(" ")).await,
        Commands::Live => handlers::live::execute(&ctx).await,
        Commands::Config { command } => handlers::config::execute(&ctx, command.clone()),
        Commands::Cleanup => handlers::cleanup::execute(&ctx).await,
    }
}
