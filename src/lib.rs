//! Outreach Flow - conversational cold-outreach workflow engine
//!
//! Drives a conversation through a fixed graph of nodes: an agent that may
//! request lookup tools, a drafting step, a confirmation gate, dispatch of
//! the approved message and a final output step that publishes a milestone.

pub mod config;
pub mod conversation;
pub mod dispatch;
pub mod events;
pub mod llm;
pub mod tools;
pub mod workflow;

pub use config::{ConfirmationMode, LlmConfig, WorkflowConfig};
pub use conversation::{ConversationState, Message, MessageKind, Role, StateDelta};
pub use workflow::{Engine, EngineError, NodeKind, RunOutcome};
