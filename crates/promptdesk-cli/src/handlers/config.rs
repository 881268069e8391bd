//! Config command handler.
//!
//! Reads and writes the persisted LLM settings.

use promptdesk_core::{Provider, Settings, SettingsStore, SettingsUpdate};

use crate::bootstrap::CliContext;
use crate::config_commands::ConfigCommand;
use crate::error::CliError;
use crate::presentation::mask_secret;

/// Execute a config subcommand.
pub fn execute(ctx: &CliContext, command: ConfigCommand) -> Result<(), CliError> {
    match command {
        ConfigCommand::Show => {
            show(ctx);
            Ok(())
        }
        ConfigCommand::SetProvider { provider } => {
            let provider: Provider = provider
                .parse()
                .map_err(|e: promptdesk_core::UnknownProvider| CliError::Arguments(e.to_string()))?;
            let settings = update(
                ctx,
                SettingsUpdate {
                    provider: Some(provider),
                    ..SettingsUpdate::default()
                },
            )?;
            println!("✓ Provider set to {provider}");
            println!("  Base URL reset to {}", or_placeholder(&settings.llm.base_url));
            Ok(())
        }
        ConfigCommand::Set {
            base_url,
            model,
            api_key,
            live,
            diagnostics,
        } => {
            let changes = SettingsUpdate {
                provider: None,
                base_url,
                model,
                api_key,
                live_mode: live,
                diagnostics,
            };
            if changes.is_empty() {
                return Err(CliError::Arguments(
                    "nothing to update; pass at least one option".to_string(),
                ));
            }
            update(ctx, changes)?;
            println!("✓ Settings updated");
            show(ctx);
            Ok(())
        }
        ConfigCommand::Reset => {
            ctx.store().save(&Settings::default())?;
            println!("✓ Settings reset to defaults");
            Ok(())
        }
    }
}

fn update(ctx: &CliContext, changes: SettingsUpdate) -> Result<Settings, CliError> {
    let settings = ctx.settings().merge(changes);
    ctx.store().save(&settings)?;
    Ok(settings)
}

fn show(ctx: &CliContext) {
    let settings = ctx.settings();
    let on_off = |flag: bool| if flag { "on" } else { "off" };

    println!("Settings file: {}", ctx.store().path().display());
    println!("  Provider:    {}", settings.llm.provider);
    println!("  Base URL:    {}", or_placeholder(&settings.llm.base_url));
    println!("  Model:       {}", or_placeholder(&settings.llm.model));
    println!("  API key:     {}", mask_secret(&settings.llm.api_key));
    println!("  Live mode:   {}", on_off(settings.live_mode));
    println!("  Diagnostics: {}", on_off(settings.diagnostics));
}

fn or_placeholder(value: &str) -> &str {
    if value.is_empty() { "(not set)" } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{CliConfig, bootstrap};

    fn context(dir: &tempfile::TempDir) -> CliContext {
        bootstrap(CliConfig {
            root: dir.path().to_path_buf(),
            backend_url: "http://127.0.0.1:8080".to_string(),
            settings_file: Some(dir.path().join("settings.json")),
        })
        .unwrap()
    }

    #[test]
    fn set_then_reset() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);

        execute(
            &ctx,
            ConfigCommand::Set {
                base_url: None,
                model: Some("llama3".into()),
                api_key: Some("sk-abcdef".into()),
                live: Some(false),
                diagnostics: None,
            },
        )
        .unwrap();
        let saved = ctx.settings();
        assert_eq!(saved.llm.model, "llama3");
        assert_eq!(saved.llm.api_key, "sk-abcdef");
        assert!(!saved.live_mode);
        assert!(saved.diagnostics);

        execute(&ctx, ConfigCommand::Reset).unwrap();
        assert_eq!(ctx.settings(), Settings::default());
    }

    #[test]
    fn provider_switch_keeps_key() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        update(
            &ctx,
            SettingsUpdate {
                api_key: Some("k".into()),
                model: Some("m".into()),
                ..SettingsUpdate::default()
            },
        )
        .unwrap();

        execute(
            &ctx,
            ConfigCommand::SetProvider {
                provider: "anthropic".into(),
            },
        )
        .unwrap();

        let saved = ctx.settings();
        assert_eq!(saved.llm.provider, Provider::Anthropic);
        assert_eq!(saved.llm.api_key, "k");
        assert_eq!(saved.llm.model, "");
    }

    #[test]
    fn rejects_empty_update_and_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);

        let empty = ConfigCommand::Set {
            base_url: None,
            model: None,
            api_key: None,
            live: None,
            diagnostics: None,
        };
        assert_eq!(execute(&ctx, empty).unwrap_err().exit_code(), 2);

        let bad_url = ConfigCommand::Set {
            base_url: Some("ftp://x".into()),
            model: None,
            api_key: None,
            live: None,
            diagnostics: None,
        };
        assert_eq!(execute(&ctx, bad_url).unwrap_err().exit_code(), 2);

        let bad_provider = ConfigCommand::SetProvider {
            provider: "cohere".into(),
        };
        assert_eq!(execute(&ctx, bad_provider).unwrap_err().exit_code(), 2);
        assert!(!ctx.store().path().exists());
    }
}
