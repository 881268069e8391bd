//! Top-level subcommands.

use clap::Subcommand;

use crate::config_commands::ConfigCommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Start the backend and UI server, then live-compile stdin until EOF or Ctrl-C
    Run {
        /// Forward child process output into the log
        #[arg(long, env = "PROMPTDESK_CHILD_LOG_PIPE")]
        forward_output: bool,
    },
    /// Compile text once (draft, then refined) against a running backend
    Compile {
        /// Text to compile
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Live-compile stdin lines against a running backend
    Live,
    /// View or change LLM settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Reclaim the service ports from leftover processes
    Cleanup,
}
