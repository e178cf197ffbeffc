use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ChatRequest {
    /// Skincare question. Off-topic questions are politely declined.
    pub message: String,
}
