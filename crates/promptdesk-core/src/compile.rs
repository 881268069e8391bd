//! Compile request and result types.
//!
//! A compile cycle sends the user's text to the compiler service once per
//! phase. The draft phase returns quickly with base artifacts; the refined
//! phase may additionally return `_v2` variants which take precedence when
//! the result is displayed.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::llm::LlmConfig;

/// Which response tier a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompilePhase {
    /// Fast first pass without refinement.
    #[default]
    Draft,
    /// Slow LLM-backed pass producing `_v2` artifacts.
    Refined,
}

impl CompilePhase {
    /// Value of the `v2` flag on the wire.
    #[must_use]
    pub const fn is_refined(self) -> bool {
        matches!(self, Self::Refined)
    }
}

impl fmt::Display for CompilePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Refined => write!(f, "refined"),
        }
    }
}

/// How a compile attempt was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompileMode {
    /// Explicit "generate": draft first, then refined.
    #[default]
    Manual,
    /// Debounced edit trigger: refined only.
    Live,
}

impl CompileMode {
    /// Phases issued for this mode, in order.
    #[must_use]
    pub const fn phases(self) -> &'static [CompilePhase] {
        match self {
            Self::Manual => &[CompilePhase::Draft, CompilePhase::Refined],
            Self::Live => &[CompilePhase::Refined],
        }
    }
}

/// One request to the compiler service for a single phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub text: String,
    pub diagnostics: bool,
    pub llm: LlmConfig,
    pub phase: CompilePhase,
    /// Shared by both phases of one attempt so logs can be correlated.
    pub correlation_id: Uuid,
}

impl CompileRequest {
    /// Build a request for `phase` with a fresh correlation id.
    #[must_use]
    pub fn new(text: impl Into<String>, llm: LlmConfig, phase: CompilePhase) -> Self {
        Self {
            text: text.into(),
            diagnostics: true,
            llm,
            phase,
            correlation_id: Uuid::new_v4(),
        }
    }

    #[must_use]
    pub const fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Same text, settings and correlation id, targeting another phase.
    #[must_use]
    pub fn for_phase(&self, phase: CompilePhase) -> Self {
        Self {
            phase,
            ..self.clone()
        }
    }

    /// JSON body posted to `/compile`.
    #[must_use]
    pub fn body(&self) -> CompileBody<'_> {
        CompileBody {
            text: &self.text,
            diagnostics: self.diagnostics,
            v2: self.phase.is_refined(),
            render_v2_prompts: self.phase.is_refined().then_some(true),
            llm_provider: self.llm.provider.as_str(),
            llm_api_key: &self.llm.api_key,
            llm_base_url: &self.llm.base_url,
            llm_model: &self.llm.model,
        }
    }
}

/// Wire form of a [`CompileRequest`].
#[derive(Debug, Serialize)]
pub struct CompileBody<'a> {
    pub text: &'a str,
    pub diagnostics: bool,
    pub v2: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_v2_prompts: Option<bool>,
    pub llm_provider: &'static str,
    pub llm_api_key: &'a str,
    pub llm_base_url: &'a str,
    pub llm_model: &'a str,
}

/// The four displayable artifacts of a compile result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptField {
    SystemPrompt,
    UserPrompt,
    Plan,
    ExpandedPrompt,
}

impl PromptField {
    pub const ALL: [Self; 4] = [
        Self::SystemPrompt,
        Self::UserPrompt,
        Self::Plan,
        Self::ExpandedPrompt,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SystemPrompt => "System Prompt",
            Self::UserPrompt => "User Prompt",
            Self::Plan => "Plan",
            Self::ExpandedPrompt => "Expanded Prompt",
        }
    }
}

/// Response body of `/compile`.
///
/// Missing string fields decode as empty. `phase` is not on the wire; the
/// client stamps it from the request that produced the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileResult {
    pub system_prompt: String,
    pub user_prompt: String,
    pub plan: String,
    pub expanded_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt_v2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_prompt_v2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_v2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expanded_prompt_v2: Option<String>,
    /// Intermediate representation, passed through untouched.
    pub ir: serde_json::Value,
    #[serde(deserialize_with = "deserialize_millis")]
    pub processing_ms: u64,
    #[serde(skip)]
    pub phase: CompilePhase,
}

impl CompileResult {
    #[must_use]
    pub const fn with_phase(mut self, phase: CompilePhase) -> Self {
        self.phase = phase;
        self
    }

    /// Base (draft) value of `field`.
    #[must_use]
    pub fn base(&self, field: PromptField) -> &str {
        match field {
            PromptField::SystemPrompt => &self.system_prompt,
            PromptField::UserPrompt => &self.user_prompt,
            PromptField::Plan => &self.plan,
            PromptField::ExpandedPrompt => &self.expanded_prompt,
        }
    }

    /// Refined value of `field`, if one was returned and is non-empty.
    #[must_use]
    pub fn refined(&self, field: PromptField) -> Option<&str> {
        let value = match field {
            PromptField::SystemPrompt => self.system_prompt_v2.as_deref(),
            PromptField::UserPrompt => self.user_prompt_v2.as_deref(),
            PromptField::Plan => self.plan_v2.as_deref(),
            PromptField::ExpandedPrompt => self.expanded_prompt_v2.as_deref(),
        };
        value.filter(|v| !v.is_empty())
    }

    /// Value shown to the user: refined if present, otherwise base.
    #[must_use]
    pub fn display(&self, field: PromptField) -> &str {
        self.refined(field).unwrap_or_else(|| self.base(field))
    }
}

// The service reports elapsed time as either an integer or a float.
fn deserialize_millis<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(raw.map_or(0, |ms| ms.max(0.0).round() as u64))
}
