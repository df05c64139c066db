//! Execution engine: drives node and router transitions under a step guard

use super::router::{confirmation_answer, route_after_agent, ConfirmationAnswer};
use super::{nodes, prompts, NodeKind};
use crate::config::{ConfirmationMode, WorkflowConfig};
use crate::conversation::{ConversationState, Message, MessageKind, StateDelta};
use crate::dispatch::MessageDispatch;
use crate::events::EventChannel;
use crate::llm::{AdapterError, ReasoningAdapter};
use crate::tools::ToolExecutor;
use std::sync::Arc;
use thiserror::Error;

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("reasoning adapter failed: {0}")]
    Adapter(#[from] AdapterError),
    #[error("step limit of {max_steps} exceeded before running {node}")]
    StepLimitExceeded { max_steps: usize, node: NodeKind },
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub state: ConversationState,
    /// User-facing reply: content of the final message
    pub reply: String,
    /// Node executions consumed
    pub steps: usize,
    /// Nodes in execution order
    pub visited: Vec<NodeKind>,
}

/// Workflow engine with its collaborators injected at construction.
///
/// Holds no per-conversation state; concurrent runs need no coordination.
pub struct Engine {
    adapter: Arc<dyn ReasoningAdapter>,
    tools: Arc<dyn ToolExecutor>,
    dispatch: Arc<dyn MessageDispatch>,
    events: Arc<dyn EventChannel>,
    config: WorkflowConfig,
    conversation_id: Option<String>,
}

impl Engine {
    pub fn new(
        adapter: Arc<dyn ReasoningAdapter>,
        tools: Arc<dyn ToolExecutor>,
        dispatch: Arc<dyn MessageDispatch>,
        events: Arc<dyn EventChannel>,
    ) -> Self {
        Self {
            adapter,
            tools,
            dispatch,
            events,
            config: WorkflowConfig::default(),
            conversation_id: None,
        }
    }

    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    /// Session/room identifier attached to milestone events and logs
    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Run the workflow from `initial` until the output node.
    ///
    /// Every node execution counts as one step; running more than
    /// `max_steps` nodes fails with `StepLimitExceeded`.
    pub async fn run(&self, initial: ConversationState) -> Result<RunOutcome, EngineError> {
        let conv_id = self.conversation_id.as_deref().unwrap_or("-");
        if let Err(e) = initial.validate() {
            tracing::warn!(conv_id, error = %e, "Conversation violates tool result ordering");
        }

        let mut state = initial;
        let (mut node, resume_delta) = self.entry(&state);
        state.apply(resume_delta);

        let mut steps = 0;
        let mut visited = Vec::new();

        loop {
            steps += 1;
            if steps > self.config.max_steps {
                tracing::error!(conv_id, max_steps = self.config.max_steps, %node, "Step limit exceeded");
                return Err(EngineError::StepLimitExceeded {
                    max_steps: self.config.max_steps,
                    node,
                });
            }

            tracing::info!(conv_id, step = steps, %node, "Running node");
            visited.push(node);

            let delta = self.execute(node, &state).await?;
            state.apply(delta);

            if node.is_terminal() {
                break;
            }
            node = self.next(node, &state).await;
        }

        let reply = state
            .reply_text()
            .unwrap_or(prompts::FALLBACK_REPLY)
            .to_string();
        tracing::info!(conv_id, steps, "Run complete");

        Ok(RunOutcome {
            state,
            reply,
            steps,
            visited,
        })
    }

    /// Caller-facing wrapper: always yields a reply. On failure the input
    /// state is returned unchanged with an apology.
    pub async fn reply(&self, state: ConversationState) -> (ConversationState, String) {
        let fallback = state.clone();
        match self.run(state).await {
            Ok(outcome) => (outcome.state, outcome.reply),
            Err(e) => {
                tracing::error!(error = %e, "Workflow run failed");
                (fallback, prompts::ERROR_REPLY.to_string())
            }
        }
    }

    /// First node for this state. A pending confirmation with a user answer
    /// resumes at the confirmation router instead of the agent.
    ///
    /// An unrecognized answer is re-prompted once; an unrecognized answer to
    /// the reminder is handed to the agent as a new request.
    fn entry(&self, state: &ConversationState) -> (NodeKind, StateDelta) {
        if self.config.confirmation != ConfirmationMode::Router {
            return (NodeKind::Agent, StateDelta::empty());
        }
        let Some((prompt, replies)) = state.pending_confirmation() else {
            return (NodeKind::Agent, StateDelta::empty());
        };

        let answer = confirmation_answer(Some(replies));
        let reminded = prompt.kind == MessageKind::ConfirmationReminder;

        let (next, delta) = match answer {
            ConfirmationAnswer::Cancel => (
                NodeKind::Output,
                StateDelta::message(
                    Message::agent(prompts::CANCELLED_NOTICE).with_kind(MessageKind::Notice),
                ),
            ),
            ConfirmationAnswer::Unclear if reminded => (NodeKind::Agent, StateDelta::empty()),
            ConfirmationAnswer::Unclear => (
                NodeKind::Output,
                StateDelta::message(
                    Message::agent(prompts::UNCLEAR_CONFIRMATION)
                        .with_kind(MessageKind::ConfirmationReminder),
                ),
            ),
            ConfirmationAnswer::Affirmative | ConfirmationAnswer::Revise => {
                (answer.intent().after_confirmation(), StateDelta::empty())
            }
        };
        tracing::info!(?answer, reminded, %next, "Resuming after confirmation");
        (next, delta)
    }

    async fn execute(&self, node: NodeKind, state: &ConversationState) -> Result<StateDelta, EngineError> {
        let conv_id = self.conversation_id.as_deref();
        let delta = match node {
            NodeKind::Agent => nodes::agent(state, &*self.adapter, &*self.tools).await?,
            NodeKind::Tools => nodes::execute_tools(state, &*self.tools).await,
            NodeKind::Draft => nodes::draft(state, &*self.adapter, &self.config).await?,
            NodeKind::Confirm => nodes::confirm(state),
            NodeKind::Send => {
                nodes::send(
                    state,
                    &*self.adapter,
                    &*self.dispatch,
                    &*self.events,
                    &self.config,
                    conv_id,
                )
                .await?
            }
            NodeKind::Output => nodes::output(state, &*self.events, &self.config, conv_id).await,
        };
        Ok(delta)
    }

    async fn next(&self, node: NodeKind, state: &ConversationState) -> NodeKind {
        match node {
            NodeKind::Agent => {
                route_after_agent(state, &*self.adapter, self.config.routing_window)
                    .await
                    .after_agent()
            }
            NodeKind::Tools => NodeKind::Agent,
            NodeKind::Draft => NodeKind::Confirm,
            NodeKind::Confirm => match self.config.confirmation {
                ConfirmationMode::AlwaysAdvance => NodeKind::Output,
                ConfirmationMode::Router => confirmation_answer(state.confirmation_replies())
                    .intent()
                    .after_confirmation(),
            },
            NodeKind::Send | NodeKind::Output => NodeKind::Output,
        }
    }
}
