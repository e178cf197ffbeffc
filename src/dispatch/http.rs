use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::EndpointConfig;
use crate::dispatch::{ChatBackend, CompletionRequest, CompletionResult, ContentPart};
use crate::error::AdvisorError;

pub const MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024; // 2MB

/// OpenAI-compatible chat-completions client.
pub struct HttpDispatch {
    client: Client,
    endpoint: EndpointConfig,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

impl HttpDispatch {
    pub fn new(endpoint: EndpointConfig) -> Result<Self, AdvisorError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn provider(&self) -> &str {
        &self.endpoint.provider
    }
}

#[async_trait]
impl ChatBackend for HttpDispatch {
    async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResult, AdvisorError> {
        let start = Instant::now();
        let provider = self.endpoint.provider.as_str();

        let api_key = self
            .endpoint
            .api_key
            .as_deref()
            .ok_or_else(|| AdvisorError::AuthFailed {
                provider: provider.to_string(),
                message: "no API token configured".to_string(),
            })?;

        // Check for expired deadline before making the request
        let timeout = req
            .deadline
            .checked_duration_since(Instant::now())
            .filter(|d| *d > Duration::from_millis(100))
            .ok_or(AdvisorError::Timeout(0))?;

        let body = build_body(req);

        tracing::debug!(
            model = %req.model,
            image = req.has_image(),
            "sending completion request to {provider}"
        );

        let response = self
            .client
            .post(&self.endpoint.base_url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AdvisorError::Timeout(timeout.as_millis() as u64)
                } else {
                    AdvisorError::Request(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            // Cap error body reads to MAX_RESPONSE_BYTES
            let error_bytes = response.bytes().await.unwrap_or_default();
            let truncated = &error_bytes[..error_bytes.len().min(MAX_RESPONSE_BYTES)];
            return Err(status_error(
                status,
                provider,
                &String::from_utf8_lossy(truncated),
            ));
        }

        let bytes = response.bytes().await.map_err(|e| AdvisorError::Upstream {
            provider: provider.to_string(),
            message: format!("failed to read response body: {e}"),
            status: None,
        })?;

        let text = parse_completion(&bytes, provider)?;

        Ok(CompletionResult {
            text,
            model: req.model.clone(),
            provider: provider.to_string(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Request body in the chat-completions shape. A request without images
/// sends the user content as a plain string.
pub fn build_body(req: &CompletionRequest) -> Value {
    let mut messages = Vec::with_capacity(2);

    if let Some(system) = req.system_prompt.as_deref().filter(|s| !s.is_empty()) {
        messages.push(json!({"role": "system", "content": system}));
    }

    let user_content = if req.has_image() {
        let parts: Vec<Value> = req
            .parts
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => json!({"type": "text", "text": text}),
                ContentPart::Image(image) => json!({
                    "type": "image_url",
                    "image_url": {"url": image.to_data_url()}
                }),
            })
            .collect();
        Value::Array(parts)
    } else {
        let text: Vec<&str> = req
            .parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text(text) => Some(text.as_str()),
                ContentPart::Image(_) => None,
            })
            .collect();
        Value::String(text.join("\n"))
    };
    messages.push(json!({"role": "user", "content": user_content}));

    let mut body = json!({
        "model": req.model,
        "messages": messages,
    });
    if let Some(t) = req.temperature {
        body["temperature"] = json!(t);
    }
    if let Some(m) = req.max_tokens {
        body["max_tokens"] = json!(m);
    }
    body
}

/// Map a non-success HTTP status to an error.
pub fn status_error(status: StatusCode, provider: &str, body: &str) -> AdvisorError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return AdvisorError::RateLimited {
            provider: provider.to_string(),
        };
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return AdvisorError::AuthFailed {
            provider: provider.to_string(),
            message: format!("{status}"),
        };
    }
    AdvisorError::Upstream {
        provider: provider.to_string(),
        message: format!("{status}: {body}"),
        status: Some(status.as_u16()),
    }
}

/// Extract the first choice's text from a successful response body.
pub fn parse_completion(bytes: &[u8], provider: &str) -> Result<String, AdvisorError> {
    if bytes.len() > MAX_RESPONSE_BYTES {
        return Err(AdvisorError::Upstream {
            provider: provider.to_string(),
            message: format!(
                "response too large: {} bytes (max {MAX_RESPONSE_BYTES})",
                bytes.len()
            ),
            status: None,
        });
    }

    let completion: ChatCompletion = serde_json::from_slice(bytes)
        .map_err(|e| AdvisorError::SchemaParse(format!("failed to parse response: {e}")))?;

    completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .ok_or_else(|| AdvisorError::Upstream {
            provider: provider.to_string(),
            message: "empty choices or null content".to_string(),
            status: None,
        })
}
