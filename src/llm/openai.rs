//! `OpenAI` chat-completions adapter (also works against compatible gateways)

use super::types::{ClassifyRequest, GenerateRequest, ToolDefinition};
use super::{AdapterError, ReasoningAdapter};
use crate::config::LlmConfig;
use crate::conversation::{Message, Role, ToolCall};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const CLASSIFY_MAX_TOKENS: u32 = 10;

/// Reasoning adapter backed by an `OpenAI`-compatible chat endpoint
pub struct OpenAiAdapter {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    temperature: f32,
}

impl OpenAiAdapter {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: Option<&str>,
    ) -> Result<Self, AdapterError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AdapterError::unknown(format!("Failed to create HTTP client: {e}")))?;

        let base = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: format!("{base}/chat/completions"),
            temperature: 0.1,
        })
    }

    /// Build from environment-derived configuration. `None` without an API key.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>, AdapterError> {
        let Some(api_key) = config.api_key.as_deref().filter(|k| !k.is_empty()) else {
            return Ok(None);
        };
        let mut adapter = Self::new(api_key, &config.model, config.base_url.as_deref())?;
        adapter.temperature = config.temperature;
        Ok(Some(adapter))
    }

    fn translate_request(&self, request: &GenerateRequest) -> ChatRequest {
        let mut messages = Vec::new();

        if let Some(system) = &request.system {
            messages.push(ChatMessage::text("system", system.clone()));
        }
        messages.extend(request.messages.iter().map(translate_message));

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(request.tools.iter().map(translate_tool).collect())
        };

        ChatRequest {
            model: self.model.clone(),
            messages,
            tools,
            max_tokens: request.max_tokens,
            temperature: self.temperature,
        }
    }

    fn translate_classify(&self, request: &ClassifyRequest) -> ChatRequest {
        let prompt = format!(
            "{}\n\nRespond with exactly one of: {}",
            request.prompt,
            request.labels.join(", ")
        );
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::text("user", prompt)],
            tools: None,
            max_tokens: Some(CLASSIFY_MAX_TOKENS),
            temperature: self.temperature,
        }
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, AdapterError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AdapterError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    AdapterError::network(format!("Connection failed: {e}"))
                } else {
                    AdapterError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdapterError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(classify_http_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| AdapterError::malformed(format!("Failed to parse response: {e}")))
    }
}

fn classify_http_error(status: u16, body: &str) -> AdapterError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map_or_else(|_| body.to_string(), |r| r.error.message);
    match status {
        401 | 403 => AdapterError::auth(format!("Authentication failed: {message}")),
        429 => AdapterError::rate_limit(format!("Rate limit exceeded: {message}")),
        400 => AdapterError::invalid_request(format!("Invalid request: {message}")),
        500..=599 => AdapterError::server_error(format!("Server error: {message}")),
        _ => AdapterError::unknown(format!("HTTP {status}: {message}")),
    }
}

fn translate_message(msg: &Message) -> ChatMessage {
    match msg.role {
        Role::User => ChatMessage::text("user", msg.content.clone()),
        Role::System => ChatMessage::text("system", msg.content.clone()),
        Role::Agent => {
            let tool_calls = if msg.tool_calls.is_empty() {
                None
            } else {
                Some(
                    msg.tool_calls
                        .iter()
                        .map(|c| ChatToolCall {
                            id: c.id.clone(),
                            r#type: "function".to_string(),
                            function: ChatFunctionCall {
                                name: c.name.clone(),
                                arguments: c.arguments.to_string(),
                            },
                        })
                        .collect(),
                )
            };
            ChatMessage {
                role: "assistant".to_string(),
                content: if msg.content.is_empty() && tool_calls.is_some() {
                    None
                } else {
                    Some(msg.content.clone())
                },
                tool_calls,
                tool_call_id: None,
            }
        }
        Role::Tool => ChatMessage {
            role: "tool".to_string(),
            content: Some(msg.content.clone()),
            tool_calls: None,
            tool_call_id: msg.tool_result.as_ref().map(|r| r.call_id.clone()),
        },
    }
}

fn translate_tool(tool: &ToolDefinition) -> ChatTool {
    ChatTool {
        r#type: "function".to_string(),
        function: ChatFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.input_schema.clone(),
        },
    }
}

fn normalize_response(resp: ChatResponse) -> Result<Message, AdapterError> {
    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AdapterError::malformed("No choices in response"))?;

    let calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .filter(|tc| !tc.function.name.is_empty())
        .map(|tc| {
            let arguments = serde_json::from_str(&tc.function.arguments).unwrap_or_else(|e| {
                tracing::warn!(error = %e, arguments = %tc.function.arguments, "Failed to parse tool call arguments");
                serde_json::json!({})
            });
            ToolCall::new(tc.id, tc.function.name, arguments)
        })
        .collect();

    Ok(Message::agent(choice.message.content.unwrap_or_default()).with_tool_calls(calls))
}

#[async_trait]
impl ReasoningAdapter for OpenAiAdapter {
    async fn generate(&self, request: &GenerateRequest) -> Result<Message, AdapterError> {
        let chat_request = self.translate_request(request);
        let response = self.send(&chat_request).await?;
        normalize_response(response)
    }

    async fn classify(&self, request: &ClassifyRequest) -> Result<String, AdapterError> {
        let chat_request = self.translate_classify(request);
        let response = self.send(&chat_request).await?;
        let message = normalize_response(response)?;
        let label = message.content.trim().to_string();
        if label.is_empty() {
            return Err(AdapterError::malformed("Empty classification label"));
        }
        Ok(label)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ChatTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ChatToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: &str, content: String) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatTool {
    r#type: String,
    function: ChatFunction,
}

#[derive(Debug, Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatToolCall {
    id: String,
    r#type: String,
    function: ChatFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}
