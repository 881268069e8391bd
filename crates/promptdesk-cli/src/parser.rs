//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;
use promptdesk_compile::DEFAULT_BACKEND_URL;

use crate::commands::Commands;

/// Command-line interface for the prompt compiler desktop shell.
///
/// Global options can also come from the environment (or a `.env` file).
#[derive(Parser)]
#[command(name = "promptdesk")]
#[command(about = "Supervise the prompt compiler services and compile prompts")]
#[command(version)]
pub struct Cli {
    /// Project root containing `core/` and `core/web/`
    #[arg(long, global = true, env = "PROMPTDESK_ROOT")]
    pub root: Option<PathBuf>,

    /// Base URL of the compiler service
    #[arg(long, global = true, env = "PROMPTDESK_BACKEND_URL", default_value = DEFAULT_BACKEND_URL)]
    pub backend_url: String,

    /// Settings file to use instead of the one in the data directory
    #[arg(long, global = true, env = "PROMPTDESK_SETTINGS")]
    pub settings_file: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Commands;
    use crate::config_commands::ConfigCommand;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from([
            "promptdesk",
            "--verbose",
            "--backend-url",
            "http://127.0.0.1:9999",
            "live",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.backend_url, "http://127.0.0.1:9999");
        assert!(matches!(cli.command, Some(Commands::Live)));
    }

    #[test]
    fn test_compile_joins_words() {
        let cli = Cli::parse_from(["promptdesk", "compile", "Explain", "recursion"]);
        let Some(Commands::Compile { text }) = cli.command else {
            panic!("expected compile");
        };
        assert_eq!(text.join(" "), "Explain recursion");
    }

    #[test]
    fn test_config_set() {
        let cli = Cli::parse_from([
            "promptdesk",
            "config",
            "set",
            "--model",
            "gpt-4o",
            "--live",
            "false",
        ]);
        let Some(Commands::Config { command }) = cli.command else {
            panic!("expected config");
        };
        let ConfigCommand::Set { model, live, .. } = command else {
            panic!("expected set");
        };
        assert_eq!(model.as_deref(), Some("gpt-4o"));
        assert_eq!(live, Some(false));
    }
}
