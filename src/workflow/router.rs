//! Routing decisions
//!
//! After the agent, an explicit tool-call request always wins; otherwise the
//! reasoning service classifies intent over a bounded tail window. After a
//! draft, the user's answer is matched against fixed keyword vocabularies.
//! Anything unmatched resolves to `End`.

use super::prompts::intent_prompt;
use super::NodeKind;
use crate::conversation::{ConversationState, Message};
use crate::llm::{ClassifyRequest, ReasoningAdapter};

/// Closed set of routing outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Tools,
    DraftEmail,
    SendEmail,
    Revise,
    End,
}

/// Labels the agent router may receive
pub const AGENT_INTENTS: [Intent; 4] = [Intent::DraftEmail, Intent::SendEmail, Intent::Tools, Intent::End];

/// Labels meaningful after a draft
pub const CONFIRMATION_INTENTS: [Intent; 3] = [Intent::SendEmail, Intent::Revise, Intent::End];

impl Intent {
    pub fn label(self) -> &'static str {
        match self {
            Intent::Tools => "tools",
            Intent::DraftEmail => "draft_email",
            Intent::SendEmail => "send_email",
            Intent::Revise => "revise",
            Intent::End => "end",
        }
    }

    /// Map a raw label onto `allowed`. Unknown or disallowed labels become `End`.
    pub fn parse(raw: &str, allowed: &[Intent]) -> Intent {
        let normalized = raw
            .trim()
            .trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_')
            .to_ascii_lowercase()
            .replace([' ', '-'], "_");

        let intent = match normalized.as_str() {
            "tools" => Intent::Tools,
            "draft_email" => Intent::DraftEmail,
            "send_email" => Intent::SendEmail,
            "revise" => Intent::Revise,
            _ => Intent::End,
        };

        if allowed.contains(&intent) {
            intent
        } else {
            Intent::End
        }
    }

    /// Next node after the agent for this intent
    pub fn after_agent(self) -> NodeKind {
        match self {
            Intent::Tools => NodeKind::Tools,
            Intent::DraftEmail => NodeKind::Draft,
            Intent::SendEmail => NodeKind::Send,
            Intent::Revise | Intent::End => NodeKind::Output,
        }
    }

    /// Next node after the confirmation gate for this intent
    pub fn after_confirmation(self) -> NodeKind {
        match self {
            Intent::SendEmail => NodeKind::Send,
            Intent::Revise => NodeKind::Agent,
            Intent::Tools | Intent::DraftEmail | Intent::End => NodeKind::Output,
        }
    }
}

/// Decide the transition out of the agent node.
///
/// Classification failures are logged and treated as `End`.
pub async fn route_after_agent(
    state: &ConversationState,
    adapter: &dyn ReasoningAdapter,
    window: usize,
) -> Intent {
    let Some(last) = state.last() else {
        tracing::info!("No messages to route, ending");
        return Intent::End;
    };

    if last.has_tool_calls() {
        tracing::info!(count = last.tool_calls.len(), "Routing to tools (explicit tool calls)");
        return Intent::Tools;
    }

    if last.content.trim().is_empty() {
        tracing::info!("Last message has no content, ending");
        return Intent::End;
    }

    let labels: Vec<&'static str> = AGENT_INTENTS.iter().map(|i| i.label()).collect();
    let request = ClassifyRequest::new(intent_prompt(state.tail(window)), &labels);

    match adapter.classify(&request).await {
        Ok(raw) => {
            let intent = Intent::parse(&raw, &AGENT_INTENTS);
            tracing::info!(raw = %raw, intent = intent.label(), "Classified intent");
            intent
        }
        Err(e) => {
            tracing::warn!(error = %e, "Intent classification failed, ending");
            Intent::End
        }
    }
}

/// The user's answer to a confirmation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationAnswer {
    Affirmative,
    Revise,
    Cancel,
    /// No answer, or nothing recognizable
    Unclear,
}

impl ConfirmationAnswer {
    pub fn intent(self) -> Intent {
        match self {
            ConfirmationAnswer::Affirmative => Intent::SendEmail,
            ConfirmationAnswer::Revise => Intent::Revise,
            ConfirmationAnswer::Cancel | ConfirmationAnswer::Unclear => Intent::End,
        }
    }
}

const CANCEL_PHRASES: &[&str] = &[
    "no", "nope", "cancel", "don't send", "dont send", "don t send", "do not send", "stop", "abort",
    "never mind", "nevermind",
];

const REVISE_PHRASES: &[&str] = &[
    "revise", "change", "edit", "rewrite", "modify", "tweak", "shorter", "longer", "instead",
];

const AFFIRMATIVE_PHRASES: &[&str] = &[
    "yes", "yep", "yeah", "send it", "send email", "send the email", "confirm", "confirmed",
    "go ahead", "looks good", "approved",
];

/// Keyword classification of one reply.
///
/// Matching is case-insensitive over whole words. Cancel outranks revise,
/// which outranks affirmative, so mixed answers never dispatch.
pub fn classify_reply(text: &str) -> ConfirmationAnswer {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '\'' | '\u{2018}' | '\u{2019}' | '\u{02BC}' | '\u{FF07}' | '`' => '\'',
            c if c.is_alphanumeric() => c,
            _ => ' ',
        })
        .collect();
    let padded = format!(" {} ", normalized.split_whitespace().collect::<Vec<_>>().join(" "));
    let has_any = |phrases: &[&str]| phrases.iter().any(|p| padded.contains(&format!(" {p} ")));

    if has_any(CANCEL_PHRASES) {
        ConfirmationAnswer::Cancel
    } else if has_any(REVISE_PHRASES) {
        ConfirmationAnswer::Revise
    } else if has_any(AFFIRMATIVE_PHRASES) {
        ConfirmationAnswer::Affirmative
    } else {
        ConfirmationAnswer::Unclear
    }
}

/// Answer carried by the most recent reply to a confirmation prompt
pub fn confirmation_answer(replies: Option<&[Message]>) -> ConfirmationAnswer {
    replies
        .and_then(<[Message]>::last)
        .map_or(ConfirmationAnswer::Unclear, |m| classify_reply(&m.content))
}
