//! Configuration management subcommands.

use clap::Subcommand;

/// Settings command variants.
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    /// Show the current settings
    Show,
    /// Select a provider, resetting base URL and model to its defaults
    SetProvider {
        /// One of: openai_compatible, openai, anthropic, gemini
        provider: String,
    },
    /// Update individual settings
    Set {
        /// LLM API base URL (http:// or https://)
        #[arg(long)]
        base_url: Option<String>,
        /// Model name
        #[arg(long)]
        model: Option<String>,
        /// API key forwarded to the compiler service
        #[arg(long)]
        api_key: Option<String>,
        /// Compile automatically while typing
        #[arg(long)]
        live: Option<bool>,
        /// Request diagnostics from the compiler
        #[arg(long)]
        diagnostics: Option<bool>,
    },
    /// Reset all settings to defaults
    Reset,
}
