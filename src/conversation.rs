//! Conversation state: the append-only message log every node reads and extends

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[cfg(test)]
mod proptests;

fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Agent,
    Tool,
    System,
}

impl Role {
    /// Label used when rendering transcripts into prompts
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Agent => "Agent",
            Role::Tool => "Tool",
            Role::System => "System",
        }
    }
}

/// Workflow tag for messages produced by specific nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Chat,
    /// Candidate outreach message produced by the draft composer
    Draft,
    /// Confirmation prompt; the workflow waits for the user's answer
    ConfirmationRequest,
    /// Second and last prompt after an unrecognized answer
    ConfirmationReminder,
    /// Outcome of a dispatch attempt (success or transport failure)
    DispatchReceipt,
    /// User-visible workflow notice, e.g. incomplete dispatch data
    Notice,
}

/// A tool invocation requested by the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Outcome of a tool invocation, correlated to its request by `call_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub payload: Value,
    #[serde(default)]
    pub is_error: bool,
}

/// One entry of the conversation log. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "new_message_id")]
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<ToolResult>,
    #[serde(default)]
    pub kind: MessageKind,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_result: None,
            kind: MessageKind::Chat,
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self::new(Role::Agent, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Tool-role message carrying the result for one call
    pub fn tool(result: ToolResult) -> Self {
        let content = match &result.payload {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self {
            tool_result: Some(result),
            ..Self::new(Role::Tool, content)
        }
    }

    pub fn with_tool_calls(mut self, calls: Vec<ToolCall>) -> Self {
        self.tool_calls = calls;
        self
    }

    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Output of a node: the messages it wants appended
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDelta {
    pub messages: Vec<Message>,
}

impl StateDelta {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn message(message: Message) -> Self {
        Self {
            messages: vec![message],
        }
    }

    pub fn messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Violations of the tool call/result pairing invariant
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("tool call {call_id} has no result before the agent resumed")]
    MissingToolResult { call_id: String },
    #[error("tool result for {found} arrived where {expected} was expected")]
    OutOfOrderResult { expected: String, found: String },
    #[error("tool result {call_id} does not answer any pending call")]
    OrphanToolResult { call_id: String },
}

/// Ordered message log for one conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl ConversationState {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Single user turn
    pub fn from_user(text: impl Into<String>) -> Self {
        Self::new(vec![Message::user(text)])
    }

    /// Append-only reducer. Messages whose id is already present are skipped so
    /// replaying a delta is harmless. Returns the number of messages appended.
    pub fn apply(&mut self, delta: StateDelta) -> usize {
        let mut appended = 0;
        for message in delta.messages {
            if self.messages.iter().any(|m| m.id == message.id) {
                tracing::debug!(message_id = %message.id, "Skipping duplicate message");
                continue;
            }
            self.messages.push(message);
            appended += 1;
        }
        appended
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The last `n` messages (fewer if the log is shorter)
    pub fn tail(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Tool calls carried by the last message, if it is an agent message
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        match self.messages.last() {
            Some(m) if m.role == Role::Agent => &m.tool_calls,
            _ => &[],
        }
    }

    /// User replies that arrived after the most recent confirmation prompt.
    ///
    /// Returns `None` unless the log ends with at least one user message that
    /// directly follows a `ConfirmationRequest`.
    pub fn confirmation_replies(&self) -> Option<&[Message]> {
        self.pending_confirmation().map(|(_, replies)| replies)
    }

    /// The open confirmation prompt (request or reminder) and the user
    /// replies that follow it. `None` once anything else has been appended.
    pub fn pending_confirmation(&self) -> Option<(&Message, &[Message])> {
        let prompt_idx = self.messages.iter().rposition(|m| {
            matches!(
                m.kind,
                MessageKind::ConfirmationRequest | MessageKind::ConfirmationReminder
            )
        })?;
        let replies = &self.messages[prompt_idx + 1..];
        if !replies.is_empty() && replies.iter().all(|m| m.role == Role::User) {
            Some((&self.messages[prompt_idx], replies))
        } else {
            None
        }
    }

    /// Most recent message with the given kind
    pub fn last_of_kind(&self, kind: MessageKind) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.kind == kind)
    }

    /// Last message with non-empty content, used as the user-facing reply
    pub fn reply_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role != Role::Tool && !m.content.trim().is_empty())
            .map(|m| m.content.as_str())
    }

    /// Check that every tool call is answered, in request order, before the
    /// agent speaks again. Trailing unanswered calls are allowed (pending).
    pub fn validate(&self) -> Result<(), StateError> {
        let mut expected: Vec<&str> = Vec::new();
        let mut next = 0;

        for message in &self.messages {
            match message.role {
                Role::Tool => {
                    let Some(result) = &message.tool_result else {
                        continue;
                    };
                    match expected.get(next) {
                        Some(id) if *id == result.call_id => next += 1,
                        Some(id) => {
                            return Err(StateError::OutOfOrderResult {
                                expected: (*id).to_string(),
                                found: result.call_id.clone(),
                            })
                        }
                        None => {
                            return Err(StateError::OrphanToolResult {
                                call_id: result.call_id.clone(),
                            })
                        }
                    }
                }
                _ => {
                    if let Some(missing) = expected.get(next) {
                        return Err(StateError::MissingToolResult {
                            call_id: (*missing).to_string(),
                        });
                    }
                    expected = message.tool_calls.iter().map(|c| c.id.as_str()).collect();
                    next = 0;
                }
            }
        }
        Ok(())
    }
}

/// Render messages as role-labelled lines for prompt templates
pub fn transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| {
            if m.has_tool_calls() {
                let names: Vec<&str> = m.tool_calls.iter().map(|c| c.name.as_str()).collect();
                format!(
                    "{}: {} [requested tools: {}]",
                    m.role.label(),
                    m.content,
                    names.join(", ")
                )
            } else {
                format!("{}: {}", m.role.label(), m.content)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
