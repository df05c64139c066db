//! Best-effort recipient address lookup from conversation text

use crate::conversation::{Message, MessageKind};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z0-9][a-z0-9._%+\-]*@[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?)*\.[a-z]{2,}\b")
        .expect("email pattern is valid")
});

/// First email address in `text`, if any
pub fn find_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

/// Recipient for the pending draft: the draft itself first, then the rest of
/// the conversation newest-first.
pub fn recipient_for_draft(messages: &[Message]) -> Option<String> {
    let draft = messages.iter().rev().find(|m| m.kind == MessageKind::Draft);
    draft
        .into_iter()
        .chain(messages.iter().rev())
        .find_map(|m| find_email(&m.content))
}
