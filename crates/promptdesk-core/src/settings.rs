//! User settings and validation.
//!
//! Only what is needed to reach the compiler service is persisted: the LLM
//! pass-through config and two toggles.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::{LlmConfig, Provider};

/// Persisted user settings.
///
/// Unknown or missing keys fall back to defaults so older files keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub llm: LlmConfig,
    /// Compile automatically as the user types.
    pub live_mode: bool,
    /// Ask the service to include diagnostics in its response.
    pub diagnostics: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            live_mode: true,
            diagnostics: true,
        }
    }
}

/// Partial update applied on top of existing settings.
///
/// A provider change is applied first, so explicit `base_url`/`model` values
/// in the same update override the new provider's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub provider: Option<Provider>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub live_mode: Option<bool>,
    pub diagnostics: Option<bool>,
}

impl SettingsUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl Settings {
    /// Apply `update`, returning the resulting settings.
    #[must_use]
    pub fn merge(mut self, update: SettingsUpdate) -> Self {
        if let Some(provider) = update.provider {
            self.llm.select_provider(provider);
        }
        if let Some(base_url) = update.base_url {
            self.llm.base_url = base_url;
        }
        if let Some(model) = update.model {
            self.llm.model = model;
        }
        if let Some(api_key) = update.api_key {
            self.llm.api_key = api_key;
        }
        if let Some(live) = update.live_mode {
            self.live_mode = live;
        }
        if let Some(diagnostics) = update.diagnostics {
            self.diagnostics = diagnostics;
        }
        self
    }
}

/// Settings validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Base URL must start with http:// or https:// (got '{0}')")]
    InvalidBaseUrl(String),

    #[error("{field} must not contain whitespace or control characters")]
    InvalidCharacters { field: &'static str },
}

/// Validate settings before they are persisted.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    let base_url = settings.llm.base_url.trim();
    if !base_url.is_empty() && !(base_url.starts_with("http://") || base_url.starts_with("https://"))
    {
        return Err(SettingsError::InvalidBaseUrl(base_url.to_string()));
    }

    let has_bad_chars = |s: &str| s.chars().any(|c| c.is_whitespace() || c.is_control());
    if has_bad_chars(&settings.llm.api_key) {
        return Err(SettingsError::InvalidCharacters { field: "API key" });
    }
    if has_bad_chars(&settings.llm.model) {
        return Err(SettingsError::InvalidCharacters { field: "Model" });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert!(settings.live_mode);
        assert!(settings.diagnostics);
        assert_eq!(settings.llm.provider, Provider::OpenaiCompatible);
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn merge_applies_provider_before_overrides() {
        let update = SettingsUpdate {
            provider: Some(Provider::Openai),
            model: Some("gpt-4o".into()),
            ..Default::default()
        };
        let settings = Settings::default().merge(update);

        assert_eq!(settings.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(settings.llm.model, "gpt-4o");
    }

    #[test]
    fn partial_file_merges_over_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"llm": {"provider": "anthropic", "apiKey": "k"}}"#).unwrap();
        assert_eq!(settings.llm.provider, Provider::Anthropic);
        assert_eq!(settings.llm.api_key, "k");
        assert!(settings.live_mode);
    }

    #[test]
    fn rejects_bad_values() {
        let mut settings = Settings::default();
        settings.llm.base_url = "ftp://example".into();
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidBaseUrl(_))
        ));

        let mut settings = Settings::default();
        settings.llm.api_key = "sk key".into();
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::InvalidCharacters { field: "API key" })
        );
    }

    #[test]
    fn empty_update() {
        assert!(SettingsUpdate::default().is_empty());
    }
}
