//! Request types for the two reasoning modes

use crate::conversation::Message;

/// Tool schema exposed to the reasoning service
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Generation mode: produce a message, possibly with tool-call requests
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub system: Option<String>,
    pub messages: Vec<Message>,
    /// Bound tool schema; empty means free generation
    pub tools: Vec<ToolDefinition>,
    pub max_tokens: Option<u32>,
}

impl GenerateRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            system: None,
            messages,
            tools: Vec::new(),
            max_tokens: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Classification mode: pick exactly one label from a fixed vocabulary
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    pub prompt: String,
    pub labels: Vec<&'static str>,
}

impl ClassifyRequest {
    pub fn new(prompt: impl Into<String>, labels: &[&'static str]) -> Self {
        Self {
            prompt: prompt.into(),
            labels: labels.to_vec(),
        }
    }
}

/// Which reasoning mode a call used, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Generate,
    Classify,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Generate => "generate",
            Mode::Classify => "classify",
        }
    }
}
