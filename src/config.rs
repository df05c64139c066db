//! Runtime configuration, read from environment variables

use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_MAX_STEPS: usize = 10;
pub const DEFAULT_ROUTING_WINDOW: usize = 3;
pub const DEFAULT_DRAFT_WINDOW: usize = 5;
pub const DEFAULT_BODY_WORD_LIMIT: usize = 150;
pub const DEFAULT_EVENT_TOPIC: &str = "sim:event";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Confirmation gate topology. A deployment uses exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationMode {
    /// Keyword-classify the user's answer and continue to send, revise or end
    #[default]
    Router,
    /// Always stop at output; the caller re-invokes with the user's next turn
    AlwaysAdvance,
}

impl FromStr for ConfirmationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "router" => Ok(Self::Router),
            "always_advance" | "always-advance" => Ok(Self::AlwaysAdvance),
            other => Err(format!("unknown confirmation mode: {other}")),
        }
    }
}

/// Workflow engine settings
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowConfig {
    /// Node executions allowed per run before `StepLimitExceeded`
    pub max_steps: usize,
    /// Tail window used for intent classification
    pub routing_window: usize,
    /// Tail window given to the draft composer
    pub draft_window: usize,
    pub confirmation: ConfirmationMode,
    pub event_topic: String,
    /// Participants addressed by milestone events; `None` means everyone
    pub event_targets: Option<Vec<String>>,
    pub body_word_limit: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            routing_window: DEFAULT_ROUTING_WINDOW,
            draft_window: DEFAULT_DRAFT_WINDOW,
            confirmation: ConfirmationMode::default(),
            event_topic: DEFAULT_EVENT_TOPIC.to_string(),
            event_targets: None,
            body_word_limit: DEFAULT_BODY_WORD_LIMIT,
        }
    }
}

impl WorkflowConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_steps: parse_or("OUTREACH_MAX_STEPS", &lookup, defaults.max_steps),
            routing_window: parse_or("OUTREACH_ROUTING_WINDOW", &lookup, defaults.routing_window),
            draft_window: parse_or("OUTREACH_DRAFT_WINDOW", &lookup, defaults.draft_window),
            confirmation: parse_or("OUTREACH_CONFIRMATION", &lookup, defaults.confirmation),
            event_topic: lookup("OUTREACH_EVENT_TOPIC")
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(defaults.event_topic),
            event_targets: lookup("OUTREACH_EVENT_TARGETS").and_then(|raw| {
                let targets: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect();
                (!targets.is_empty()).then_some(targets)
            }),
            body_word_limit: parse_or("OUTREACH_BODY_WORD_LIMIT", &lookup, defaults.body_word_limit),
        }
    }
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, value = %raw, error = %e, "Ignoring invalid config value");
                default
            }
        },
    }
}

/// Settings for the `OpenAI`-compatible reasoning adapter
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    /// Gateway or compatible endpoint, e.g. `http://localhost:8080/v1`
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.1,
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_key: lookup("OPENAI_API_KEY"),
            base_url: lookup("OPENAI_BASE_URL"),
            model: lookup("OUTREACH_MODEL").unwrap_or(defaults.model),
            temperature: parse_or("OUTREACH_TEMPERATURE", &lookup, defaults.temperature),
        }
    }
}
