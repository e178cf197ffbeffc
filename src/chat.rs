use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::dispatch::{ChatBackend, CompletionRequest};
use crate::error::AdvisorError;
use crate::format::Locale;
use crate::image::validate_message;
use crate::prompt;

/// Deadline for one chat reply.
pub const CHAT_DEADLINE: Duration = Duration::from_secs(120);

/// Skincare-only Q&A over the chat backend. Each question is sent on its
/// own: system prompt + the user's message, no history.
pub struct AdvisorChat {
    backend: Arc<dyn ChatBackend>,
    model: String,
    system_prompt: String,
    locale: Locale,
}

impl AdvisorChat {
    pub fn new(backend: Arc<dyn ChatBackend>, model: impl Into<String>, locale: Locale) -> Self {
        Self {
            backend,
            model: model.into(),
            system_prompt: prompt::chat_system_prompt(locale),
            locale,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub async fn ask(&self, message: &str) -> Result<String, AdvisorError> {
        validate_message(message)?;

        let mut req = CompletionRequest::text(&self.model, message, Instant::now() + CHAT_DEADLINE);
        req.system_prompt = Some(self.system_prompt.clone());

        let result = self.backend.complete(&req).await?;
        Ok(result.text.trim().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub text: String,
    pub from_user: bool,
    /// Set on the apology recorded in place of a failed reply.
    pub failed: bool,
}

/// Conversation log as shown to the user.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl Default for ChatTranscript {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

impl ChatTranscript {
    pub fn new(locale: Locale) -> Self {
        Self {
            messages: vec![ChatMessage {
                text: locale.messages().greeting.to_string(),
                from_user: false,
                failed: false,
            }],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Record the user's message, ask, and record the reply or the failure.
    /// Returns the assistant message that was appended.
    pub async fn send(&mut self, chat: &AdvisorChat, text: &str) -> &ChatMessage {
        self.messages.push(ChatMessage {
            text: text.to_string(),
            from_user: true,
            failed: false,
        });

        let reply = match chat.ask(text).await {
            Ok(reply) => ChatMessage {
                text: reply,
                from_user: false,
                failed: false,
            },
            Err(e) => {
                tracing::warn!("chat: request failed: {e}");
                ChatMessage {
                    text: format!(
                        "{}: {}",
                        chat.locale().messages().chat_failed,
                        e.user_message()
                    ),
                    from_user: false,
                    failed: true,
                }
            }
        };

        self.messages.push(reply);
        &self.messages[self.messages.len() - 1]
    }
}
