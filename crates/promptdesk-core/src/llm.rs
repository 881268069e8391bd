//! LLM provider selection passed through to the compiler service.
//!
//! The desktop shell never talks to a provider directly. It only forwards
//! the provider name, endpoint, model and key so the compiler backend can
//! shape its own upstream requests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Supported upstream providers.
///
/// Deserialization is lenient (see [`Provider::normalize`]) so a hand-edited
/// or outdated provider name never invalidates the rest of a settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Any endpoint speaking the OpenAI chat-completions dialect.
    #[default]
    OpenaiCompatible,
    Openai,
    Anthropic,
    Gemini,
}

impl Provider {
    /// All providers, in the order they are offered to the user.
    pub const ALL: [Self; 4] = [
        Self::OpenaiCompatible,
        Self::Openai,
        Self::Anthropic,
        Self::Gemini,
    ];

    /// Wire name sent as `llm_provider`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenaiCompatible => "openai_compatible",
            Self::Openai => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
        }
    }

    /// Default base URL applied when this provider is selected.
    #[must_use]
    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenaiCompatible => "",
            Self::Openai => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com",
        }
    }

    /// Default model applied when this provider is selected.
    ///
    /// Empty means "let the compiler service pick its configured default".
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        ""
    }

    /// Lenient parse used for user input and persisted settings.
    ///
    /// Accepts common aliases and falls back to [`Provider::OpenaiCompatible`]
    /// for anything unrecognised.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" => Self::Openai,
            "anthropic" | "claude" => Self::Anthropic,
            "gemini" | "google" => Self::Gemini,
            _ => Self::OpenaiCompatible,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Provider {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::normalize(&raw))
    }
}

/// Error returned by the strict [`FromStr`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown LLM provider '{0}' (expected one of: openai_compatible, openai, anthropic, gemini)")]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai_compatible" | "openai-compatible" | "openai_compat" | "compat" => {
                Ok(Self::OpenaiCompatible)
            }
            "openai" => Ok(Self::Openai),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "gemini" | "google" => Ok(Self::Gemini),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

/// LLM settings forwarded with every compile request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmConfig {
    pub provider: Provider,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::for_provider(Provider::default())
    }
}

impl LlmConfig {
    /// Config for `provider` with its default endpoint and model and no key.
    #[must_use]
    pub fn for_provider(provider: Provider) -> Self {
        Self {
            provider,
            base_url: provider.default_base_url().to_string(),
            model: provider.default_model().to_string(),
            api_key: String::new(),
        }
    }

    /// Switch provider, resetting `base_url` and `model` to its defaults.
    ///
    /// The API key is kept. Any custom endpoint or model typed for the
    /// previous provider is discarded and is not restored on switching back.
    pub fn select_provider(&mut self, provider: Provider) {
        self.provider = provider;
        self.base_url = provider.default_base_url().to_string();
        self.model = provider.default_model().to_string();
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.api_key.is_empty() { "" } else { "***" };
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &key)
            .finish()
    }
}
