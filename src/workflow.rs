//! Cold-outreach workflow
//!
//! A fixed topology: Agent routes to Tools, Draft, Send or Output; Tools
//! returns to Agent; Draft goes to Confirm; Confirm goes to Output or, in
//! router mode, to Send, Agent or Output; Send goes to Output.

mod engine;
mod nodes;
mod prompts;
mod recipient;
mod router;

#[cfg(test)]
mod proptests;

pub use engine::{Engine, EngineError, RunOutcome};
pub use recipient::find_email;
pub use router::{
    classify_reply, confirmation_answer, route_after_agent, ConfirmationAnswer, Intent,
    AGENT_INTENTS, CONFIRMATION_INTENTS,
};

use std::fmt;

/// Workflow nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Agent,
    Tools,
    Draft,
    Confirm,
    Send,
    Output,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Agent => "agent",
            NodeKind::Tools => "tools",
            NodeKind::Draft => "draft_email",
            NodeKind::Confirm => "confirm_email",
            NodeKind::Send => "send_email",
            NodeKind::Output => "output",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, NodeKind::Output)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
