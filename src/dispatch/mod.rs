pub mod http;

use std::time::Instant;

use async_trait::async_trait;

use crate::error::AdvisorError;
use crate::image::ImageAttachment;

/// One part of the user message.
#[derive(Debug, Clone)]
pub enum ContentPart {
    Text(String),
    Image(ImageAttachment),
}

/// Internal request type accepted by every backend.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    /// Sent as a separate system message when present.
    pub system_prompt: Option<String>,
    /// User message parts, in order.
    pub parts: Vec<ContentPart>,
    pub deadline: Instant,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u64>,
}

impl CompletionRequest {
    pub fn text(model: impl Into<String>, prompt: impl Into<String>, deadline: Instant) -> Self {
        Self {
            model: model.into(),
            system_prompt: None,
            parts: vec![ContentPart::Text(prompt.into())],
            deadline,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn has_image(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, ContentPart::Image(_)))
    }
}

/// Internal result type returned by every backend.
#[derive(Debug, Clone)]
pub struct CompletionResult {
    pub text: String,
    pub model: String,
    pub provider: String,
    pub latency_ms: u64,
}

/// A hosted chat-completion service.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResult, AdvisorError>;
}
