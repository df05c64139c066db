//! Reasoning adapter abstraction
//!
//! The workflow talks to the reasoning service in two modes: generation
//! (a message, optionally carrying tool-call requests) and classification
//! (exactly one label from a fixed vocabulary).

mod error;
mod openai;
mod types;

pub use error::{AdapterError, AdapterErrorKind};
pub use openai::OpenAiAdapter;
pub use types::*;

use crate::conversation::Message;
use async_trait::async_trait;
use std::sync::Arc;

/// Reasoning service consumed by the agent, router, draft and dispatch nodes
#[async_trait]
pub trait ReasoningAdapter: Send + Sync {
    /// Produce a message, possibly with tool-call requests when tools are bound
    async fn generate(&self, request: &GenerateRequest) -> Result<Message, AdapterError>;

    /// Produce one raw label. Mapping onto the vocabulary is the caller's job.
    async fn classify(&self, request: &ClassifyRequest) -> Result<String, AdapterError>;

    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: ReasoningAdapter + ?Sized> ReasoningAdapter for Arc<T> {
    async fn generate(&self, request: &GenerateRequest) -> Result<Message, AdapterError> {
        (**self).generate(request).await
    }

    async fn classify(&self, request: &ClassifyRequest) -> Result<String, AdapterError> {
        (**self).classify(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper for reasoning adapters
pub struct LoggingAdapter {
    inner: Arc<dyn ReasoningAdapter>,
    model_id: String,
}

impl LoggingAdapter {
    pub fn new(inner: Arc<dyn ReasoningAdapter>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }

    fn log_outcome<T>(&self, mode: Mode, start: std::time::Instant, result: &Result<T, AdapterError>) {
        let duration = start.elapsed();
        match result {
            Ok(_) => {
                tracing::info!(
                    model = %self.model_id,
                    mode = mode.as_str(),
                    duration_ms = %duration.as_millis(),
                    "Reasoning request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    mode = mode.as_str(),
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = e.kind.as_str(),
                    retryable = e.kind.is_retryable(),
                    "Reasoning request failed"
                );
            }
        }
    }
}

#[async_trait]
impl ReasoningAdapter for LoggingAdapter {
    async fn generate(&self, request: &GenerateRequest) -> Result<Message, AdapterError> {
        let start = std::time::Instant::now();
        let result = self.inner.generate(request).await;
        self.log_outcome(Mode::Generate, start, &result);
        result
    }

    async fn classify(&self, request: &ClassifyRequest) -> Result<String, AdapterError> {
        let start = std::time::Instant::now();
        let result = self.inner.classify(request).await;
        self.log_outcome(Mode::Classify, start, &result);
        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
