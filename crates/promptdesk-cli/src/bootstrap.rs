//! CLI bootstrap - the composition root.
//!
//! Resolves configuration from arguments and environment and opens the
//! settings store. Handlers receive the resulting [`CliContext`].

use std::path::PathBuf;

use promptdesk_core::{ServiceSpec, Settings, SettingsStore};
use promptdesk_runtime::JsonSettingsStore;

use crate::error::CliError;
use crate::parser::Cli;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Project root containing `core/` and `core/web/`.
    pub root: PathBuf,
    /// Base URL of the compiler service.
    pub backend_url: String,
    /// Explicit settings file, if any.
    pub settings_file: Option<PathBuf>,
}

impl CliConfig {
    /// Resolve from parsed arguments; the root defaults to the working directory.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let root = match &cli.root {
            Some(root) => root.clone(),
            None => std::env::current_dir()?,
        };
        Ok(Self {
            root,
            backend_url: cli.backend_url.clone(),
            settings_file: cli.settings_file.clone(),
        })
    }

    /// Backend then frontend, in start order.
    #[must_use]
    pub fn service_specs(&self, forward_output: bool) -> Vec<ServiceSpec> {
        vec![
            ServiceSpec::backend(&self.root).with_forward_output(forward_output),
            ServiceSpec::frontend(&self.root).with_forward_output(forward_output),
        ]
    }
}

/// Composed context for CLI commands.
pub struct CliContext {
    pub config: CliConfig,
    store: JsonSettingsStore,
}

impl CliContext {
    #[must_use]
    pub const fn store(&self) -> &JsonSettingsStore {
        &self.store
    }

    /// Current settings (defaults if nothing usable is stored).
    #[must_use]
    pub fn settings(&self) -> Settings {
        self.store.load()
    }
}

/// Build the CLI context.
pub fn bootstrap(config: CliConfig) -> Result<CliContext, CliError> {
    let store = match &config.settings_file {
        Some(path) => JsonSettingsStore::new(path),
        None => JsonSettingsStore::open_default()?,
    };
    Ok(CliContext { config, store })
}
