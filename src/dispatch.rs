//! Messaging dispatch: the side-effecting send and the data it requires

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Transport failure reported by a messaging backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct DispatchError(pub String);

/// Messaging capability that delivers a composed message
#[async_trait]
pub trait MessageDispatch: Send + Sync {
    /// Send and return the backend's message id
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<String, DispatchError>;
}

#[async_trait]
impl<T: MessageDispatch + ?Sized> MessageDispatch for std::sync::Arc<T> {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<String, DispatchError> {
        (**self).send(recipient, subject, body).await
    }
}

/// Backend that only logs. Useful for local runs.
pub struct DryRunDispatch;

#[async_trait]
impl MessageDispatch for DryRunDispatch {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<String, DispatchError> {
        let message_id = format!("dry-run-{}", uuid::Uuid::new_v4());
        tracing::info!(
            recipient,
            subject,
            body_chars = body.chars().count(),
            message_id = %message_id,
            "Dry-run dispatch"
        );
        Ok(message_id)
    }
}

/// Fields required before any send attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchField {
    RecipientEmail,
    Subject,
    Body,
}

impl fmt::Display for DispatchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DispatchField::RecipientEmail => "recipient email",
            DispatchField::Subject => "subject",
            DispatchField::Body => "body",
        })
    }
}

/// Why a dispatch record could not be built
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("missing {}", join_fields(.0))]
    MissingFields(Vec<DispatchField>),
    #[error("recipient {0:?} is not an email address")]
    InvalidRecipient(String),
    #[error("extraction declined: {0}")]
    Declined(String),
}

fn join_fields(fields: &[DispatchField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Ephemeral, fully populated send instruction. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawRecord {
    #[serde(default, alias = "recipient", alias = "to")]
    recipient_email: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    body: Option<String>,
}

impl RawRecord {
    fn into_record(self) -> Result<DispatchRecord, ExtractionError> {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let recipient = clean(self.recipient_email);
        let subject = clean(self.subject);
        let body = clean(self.body);

        let mut missing = Vec::new();
        if recipient.is_none() {
            missing.push(DispatchField::RecipientEmail);
        }
        if subject.is_none() {
            missing.push(DispatchField::Subject);
        }
        if body.is_none() {
            missing.push(DispatchField::Body);
        }

        match (recipient, subject, body) {
            (Some(recipient), Some(subject), Some(body)) => {
                if crate::workflow::find_email(&recipient).as_deref() != Some(recipient.as_str()) {
                    return Err(ExtractionError::InvalidRecipient(recipient));
                }
                Ok(DispatchRecord {
                    recipient,
                    subject,
                    body,
                })
            }
            _ => Err(ExtractionError::MissingFields(missing)),
        }
    }
}

/// Parse the reasoning service's extraction reply.
///
/// Accepts a JSON object (optionally inside a code fence) or
/// `RECIPIENT_EMAIL:` / `SUBJECT:` / `BODY:` lines where the body runs to the
/// end of the reply.
pub fn parse_extraction(text: &str) -> Result<DispatchRecord, ExtractionError> {
    let trimmed = strip_code_fence(text.trim());

    if trimmed.starts_with('{') {
        if let Ok(raw) = serde_json::from_str::<RawRecord>(trimmed) {
            return raw.into_record();
        }
    }

    let mut raw = RawRecord::default();
    let mut body_lines: Option<Vec<&str>> = None;

    for line in trimmed.lines() {
        // Everything after BODY belongs to the body, even key-like lines
        if let Some(lines) = body_lines.as_mut() {
            lines.push(line);
            continue;
        }
        if let Some((key, value)) = field_line(line) {
            match key.as_str() {
                "ERROR" => return Err(ExtractionError::Declined(value.to_string())),
                "RECIPIENT_EMAIL" | "RECIPIENT" | "TO" => {
                    raw.recipient_email = Some(value.to_string());
                    continue;
                }
                "SUBJECT" => {
                    raw.subject = Some(value.to_string());
                    continue;
                }
                "BODY" => {
                    body_lines = Some(vec![value]);
                    continue;
                }
                _ => {}
            }
        }
    }

    raw.body = body_lines.map(|lines| lines.join("\n"));
    raw.into_record()
}

/// Split `KEY: value`, tolerating list markers and markdown emphasis
fn field_line(line: &str) -> Option<(String, &str)> {
    let line = line
        .trim_start()
        .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == '-' || c == '*')
        .trim_start();
    let (key, value) = line.split_once(':')?;
    let key = key.trim().trim_matches('*').trim().replace(' ', "_").to_ascii_uppercase();
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
        return None;
    }
    Some((key, value.trim_start_matches('*').trim()))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
