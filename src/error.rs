use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("timeout after {0}ms")]
    Timeout(u64),

    #[error("rate limited by {provider}")]
    RateLimited { provider: String },

    #[error("upstream error from {provider}: {message}")]
    Upstream {
        provider: String,
        message: String,
        status: Option<u16>,
    },

    #[error("auth failed for {provider}: {message}")]
    AuthFailed { provider: String, message: String },

    #[error("schema parse error: {0}")]
    SchemaParse(String),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("image error: {0}")]
    Image(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

impl AdvisorError {
    /// Extract provider name from structured error variants.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::RateLimited { provider } => Some(provider),
            Self::Upstream { provider, .. } => Some(provider),
            Self::AuthFailed { provider, .. } => Some(provider),
            _ => None,
        }
    }

    /// Sanitized message for tool responses and chat transcripts.
    /// Does not leak endpoint URLs, connection details, or upstream bodies.
    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout(ms) => format!("request timed out after {ms}ms"),
            Self::RateLimited { provider } => {
                format!("rate limited by {provider}, try again shortly")
            }
            Self::Upstream {
                provider, status, ..
            } => match status {
                Some(code) => format!("upstream error from {provider} (HTTP {code})"),
                None => format!("upstream error from {provider}"),
            },
            Self::AuthFailed { provider, message } => {
                format!("authentication failed for {provider}: {message}")
            }
            Self::SchemaParse(_) => "failed to parse model response".to_string(),
            Self::Request(_) => "request to model provider failed".to_string(),
            Self::Image(msg) => format!("image error: {msg}"),
            Self::Store(_) => "failed to access analysis storage".to_string(),
            Self::InvalidInput(msg) => msg.clone(),
            Self::Other(msg) => msg.clone(),
        }
    }
}

impl From<std::io::Error> for AdvisorError {
    fn from(e: std::io::Error) -> Self {
        Self::Store(e.to_string())
    }
}

impl From<serde_json::Error> for AdvisorError {
    fn from(e: serde_json::Error) -> Self {
        Self::Store(format!("malformed document: {e}"))
    }
}
