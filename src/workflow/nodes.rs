//! Node behaviours
//!
//! Each node reads the state and returns a delta for the reducer. Only the
//! agent, draft and extraction calls can fail the run; tool and transport
//! failures are embedded as messages.

use super::prompts::{
    self, confirmation_text, draft_prompt, extraction_prompt, AGENT_SYSTEM_PROMPT,
};
use super::recipient::recipient_for_draft;
use crate::config::WorkflowConfig;
use crate::conversation::{
    ConversationState, Message, MessageKind, Role, StateDelta, ToolResult,
};
use crate::dispatch::{parse_extraction, MessageDispatch};
use crate::events::{EventChannel, MilestoneEvent};
use crate::llm::{AdapterError, GenerateRequest, ReasoningAdapter};
use crate::tools::ToolExecutor;
use futures::future::join_all;

/// Generate the next agent message with the tool schema bound
pub async fn agent(
    state: &ConversationState,
    adapter: &dyn ReasoningAdapter,
    tools: &dyn ToolExecutor,
) -> Result<StateDelta, AdapterError> {
    let request = GenerateRequest::new(state.messages.clone())
        .with_system(AGENT_SYSTEM_PROMPT)
        .with_tools(tools.definitions());

    let mut message = adapter.generate(&request).await?;
    message.role = Role::Agent;
    message.kind = MessageKind::Chat;
    for call in &mut message.tool_calls {
        if call.id.is_empty() {
            call.id = format!("call-{}", uuid::Uuid::new_v4());
        }
    }

    if message.has_tool_calls() {
        let names: Vec<&str> = message.tool_calls.iter().map(|c| c.name.as_str()).collect();
        tracing::info!(?names, "Agent requested tools");
    } else {
        tracing::info!("Agent responded directly");
    }

    Ok(StateDelta::message(message))
}

/// Run every pending tool call. Calls run concurrently; results keep request order.
pub async fn execute_tools(state: &ConversationState, tools: &dyn ToolExecutor) -> StateDelta {
    let calls = state.pending_tool_calls();
    if calls.is_empty() {
        tracing::warn!("Tool node reached without pending tool calls");
        return StateDelta::empty();
    }

    let outcomes = join_all(calls.iter().map(|call| async move {
        tracing::info!(tool = %call.name, call_id = %call.id, "Executing tool");
        tools.execute(&call.name, call.arguments.clone()).await
    }))
    .await;

    let results = calls
        .iter()
        .zip(outcomes)
        .map(|(call, outcome)| {
            let result = match outcome {
                Ok(payload) => ToolResult {
                    call_id: call.id.clone(),
                    payload,
                    is_error: false,
                },
                Err(e) => {
                    tracing::warn!(tool = %call.name, call_id = %call.id, error = %e, "Tool failed");
                    ToolResult {
                        call_id: call.id.clone(),
                        payload: e.to_payload(),
                        is_error: true,
                    }
                }
            };
            Message::tool(result)
        })
        .collect();

    StateDelta::messages(results)
}

/// Compose one candidate outreach message from the recent window
pub async fn draft(
    state: &ConversationState,
    adapter: &dyn ReasoningAdapter,
    config: &WorkflowConfig,
) -> Result<StateDelta, AdapterError> {
    let prompt = draft_prompt(state.tail(config.draft_window), config.body_word_limit);
    let reply = adapter
        .generate(&GenerateRequest::new(vec![Message::user(prompt)]))
        .await?;

    tracing::info!(chars = reply.content.chars().count(), "Draft composed");
    Ok(StateDelta::message(
        Message::agent(reply.content.trim()).with_kind(MessageKind::Draft),
    ))
}

/// Surface the pending draft and its best-effort recipient for approval
pub fn confirm(state: &ConversationState) -> StateDelta {
    let Some(draft) = state
        .last_of_kind(MessageKind::Draft)
        .filter(|m| !m.content.trim().is_empty())
    else {
        tracing::warn!("Confirmation requested without a draft");
        return StateDelta::message(
            Message::agent(prompts::NO_DRAFT_NOTICE).with_kind(MessageKind::Notice),
        );
    };

    let recipient = recipient_for_draft(&state.messages);
    tracing::info!(recipient = ?recipient, "Awaiting confirmation");

    StateDelta::message(
        Message::agent(confirmation_text(&draft.content, recipient.as_deref()))
            .with_kind(MessageKind::ConfirmationRequest),
    )
}

/// Extract the send instruction and dispatch it.
///
/// Incomplete data ends the branch with one notice and no send attempt.
/// Transport errors are reported, never retried.
pub async fn send(
    state: &ConversationState,
    adapter: &dyn ReasoningAdapter,
    dispatch: &dyn MessageDispatch,
    events: &dyn EventChannel,
    config: &WorkflowConfig,
    conversation_id: Option<&str>,
) -> Result<StateDelta, AdapterError> {
    let reply = adapter
        .generate(&GenerateRequest::new(vec![Message::user(extraction_prompt(
            &state.messages,
        ))]))
        .await?;

    let record = match parse_extraction(&reply.content) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(error = %e, "Dispatch data incomplete, not sending");
            return Ok(StateDelta::message(
                Message::agent(format!(
                    "I couldn't send the email: {e}. Please provide the recipient email, subject, and body."
                ))
                .with_kind(MessageKind::Notice),
            ));
        }
    };

    tracing::info!(recipient = %record.recipient, subject = %record.subject, "Dispatching email");

    let message = match dispatch
        .send(&record.recipient, &record.subject, &record.body)
        .await
    {
        Ok(message_id) => {
            tracing::info!(message_id = %message_id, "Email sent");
            events
                .publish(
                    &MilestoneEvent::email_sent(&record.recipient, &record.subject)
                        .with_conversation(conversation_id),
                    &config.event_topic,
                    config.event_targets.as_deref(),
                )
                .await;
            format!(
                "Email sent successfully to {}!\n\nSubject: {}",
                record.recipient, record.subject
            )
        }
        Err(e) => {
            tracing::error!(error = %e, recipient = %record.recipient, "Email dispatch failed");
            format!("Failed to send email to {}: {e}", record.recipient)
        }
    };

    Ok(StateDelta::message(
        Message::agent(message).with_kind(MessageKind::DispatchReceipt),
    ))
}

/// Publish the completion milestone. Adds a fallback reply when the log has
/// nothing the user can read.
pub async fn output(
    state: &ConversationState,
    events: &dyn EventChannel,
    config: &WorkflowConfig,
    conversation_id: Option<&str>,
) -> StateDelta {
    let readable = state
        .last()
        .filter(|m| matches!(m.role, Role::Agent | Role::System) && !m.content.trim().is_empty());

    let (delta, reply) = match readable {
        Some(last) => (StateDelta::empty(), last.content.as_str()),
        None => (
            StateDelta::message(
                Message::agent(prompts::FALLBACK_REPLY).with_kind(MessageKind::Notice),
            ),
            prompts::FALLBACK_REPLY,
        ),
    };

    tracing::info!(reply_chars = reply.chars().count(), "Publishing workflow result");
    events
        .publish(
            &MilestoneEvent::workflow_complete(reply).with_conversation(conversation_id),
            &config.event_topic,
            config.event_targets.as_deref(),
        )
        .await;

    delta
}
