//! Prompt templates for the reasoning service

use crate::conversation::{transcript, Message};

pub const AGENT_SYSTEM_PROMPT: &str = "\
You are an AI agent specialized in helping with cold outreach and lead generation.

Your role is to:
- Help users find and research prospects using the lookup tools available to you
- Provide personalized outreach advice and strategies
- Analyze prospect information for effective messaging
- Suggest conversation starters and follow-up approaches
- If you already have the email address to send to, do not use tools to find it again

When users ask for prospect research or contact information, use the appropriate tools.
For general advice, respond directly with helpful outreach strategies.

Keep responses conversational and actionable, suitable for voice interactions.";

/// Intent classification over the routing window
pub fn intent_prompt(window: &[Message]) -> String {
    format!(
        "Analyze the following conversation to determine the user's EXACT intent.

Conversation:
{}

User intent rules:
1. If the user explicitly asks to DRAFT/WRITE/COMPOSE an email -> draft_email
2. If the user asks to SEARCH/FIND/LOOK UP people, companies or contact details -> tools
3. If the user asks to SEND an email -> send_email
4. If the user gives an email address and asks for a draft -> draft_email, not tools
5. If the user gives an email address and asks to send -> send_email, not tools
6. In ALL other cases (greetings, thanks, answered questions, unclear requests) -> end

Be conservative: when in doubt, answer end.",
        transcript(window)
    )
}

/// Free generation of one candidate outreach email
pub fn draft_prompt(window: &[Message], body_word_limit: usize) -> String {
    format!(
        "Based on the following conversation, draft a personalized cold outreach email.

Conversation:
{}

The email must:
1. Have a personalized subject line
2. Keep the body under {body_word_limit} words
3. Reference relevant details gathered about the prospect
4. End with a soft call-to-action
5. Stay concise and professional

Format your response as:
SUBJECT: [subject line]

EMAIL:
[email body]

RECIPIENT: [email address, if mentioned in the conversation]",
        transcript(window)
    )
}

/// Structured extraction of the send instruction from the full history
pub fn extraction_prompt(history: &[Message]) -> String {
    format!(
        "From the following conversation history, extract the email that should be sent.

{}

Return ONLY these three fields, taken from the most recent approved draft:
RECIPIENT_EMAIL: [email address to send to]
SUBJECT: [email subject line]
BODY: [complete email body, may span several lines]

If any field cannot be determined, leave it empty. Do not invent an address.",
        transcript(history)
    )
}

/// Confirmation prompt surfaced after a draft
pub fn confirmation_text(draft: &str, recipient: Option<&str>) -> String {
    format!(
        "Email ready for review

{draft}

Recipient: {}

Please confirm:
- Say \"yes\" or \"send it\" to send it
- Say \"cancel\" to stop
- Ask for changes if you'd like revisions",
        recipient.unwrap_or("unknown recipient")
    )
}

pub const NO_DRAFT_NOTICE: &str =
    "I need to draft an email first. Please share the prospect details and what you'd like to say.";

pub const CANCELLED_NOTICE: &str =
    "Okay, I won't send that email. Let me know if you'd like a different draft.";

pub const UNCLEAR_CONFIRMATION: &str =
    "I didn't catch whether to send the email. Say \"yes\" to send it, \"cancel\" to stop, or tell me what to change.";

pub const FALLBACK_REPLY: &str = "I'm here to help with your cold outreach needs.";

pub const ERROR_REPLY: &str =
    "I'm sorry, I encountered an error. How can I help with your cold outreach campaign?";
