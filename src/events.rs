//! Milestone events published to the live session
//!
//! Delivery is best-effort: publishing never fails a run.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Structured notification for session observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub message: String,
    pub phase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl MilestoneEvent {
    pub fn new(event_type: impl Into<String>, message: impl Into<String>, phase: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            message: message.into(),
            phase: phase.into(),
            conversation_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn workflow_complete(message: impl Into<String>) -> Self {
        Self::new("workflow_complete", message, "completion")
    }

    pub fn email_sent(recipient: &str, subject: &str) -> Self {
        Self::new(
            "email_sent",
            format!("Email sent to {recipient}: {subject}"),
            "dispatch",
        )
    }

    pub fn with_conversation(mut self, conversation_id: Option<&str>) -> Self {
        self.conversation_id = conversation_id.map(String::from);
        self
    }
}

/// Session event channel. No acknowledgment is expected.
#[async_trait]
pub trait EventChannel: Send + Sync {
    /// Publish to `topic`, addressed to `targets` or to every participant when `None`
    async fn publish(&self, event: &MilestoneEvent, topic: &str, targets: Option<&[String]>);
}

#[async_trait]
impl<T: EventChannel + ?Sized> EventChannel for std::sync::Arc<T> {
    async fn publish(&self, event: &MilestoneEvent, topic: &str, targets: Option<&[String]>) {
        (**self).publish(event, topic, targets).await;
    }
}

/// Event as delivered to in-process subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    pub topic: String,
    /// Empty means every participant
    pub targets: Vec<String>,
    pub event: MilestoneEvent,
}

/// In-process fan-out over a tokio broadcast channel
pub struct BroadcastEventChannel {
    tx: broadcast::Sender<PublishedEvent>,
}

impl BroadcastEventChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastEventChannel {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl EventChannel for BroadcastEventChannel {
    async fn publish(&self, event: &MilestoneEvent, topic: &str, targets: Option<&[String]>) {
        let published = PublishedEvent {
            topic: topic.to_string(),
            targets: targets.map(<[String]>::to_vec).unwrap_or_default(),
            event: event.clone(),
        };
        if self.tx.send(published).is_err() {
            tracing::debug!(topic, event_type = %event.event_type, "No event subscribers");
        }
    }
}

/// Channel that drops everything
pub struct NoopEventChannel;

#[async_trait]
impl EventChannel for NoopEventChannel {
    async fn publish(&self, _event: &MilestoneEvent, _topic: &str, _targets: Option<&[String]>) {}
}
