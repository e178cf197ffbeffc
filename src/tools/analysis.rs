use schemars::JsonSchema;
use serde::Deserialize;

/// Request to analyze a skin photo.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AnalyzeRequest {
    /// Path to the image file (JPEG, PNG, WebP...). Max 20MB.
    pub image_path: String,
    /// User whose history receives the result (defaults to the configured user).
    pub user_id: Option<String>,
}

/// Request for the most recent analysis, or the routine built from it.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct LatestRequest {
    /// User to look up (defaults to the configured user).
    pub user_id: Option<String>,
}

/// Request for past analyses, newest first.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct HistoryRequest {
    /// User to look up (defaults to the configured user).
    pub user_id: Option<String>,
    /// Maximum number of analyses to return (default 10, max 100).
    pub limit: Option<usize>,
}

pub const DEFAULT_HISTORY_LIMIT: usize = 10;
pub const MAX_HISTORY_LIMIT: usize = 100;

impl HistoryRequest {
    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT)
    }
}

/// Resolve an optional user ID against the configured default.
pub fn user_or_default<'a>(user_id: Option<&'a str>, default_user: &'a str) -> &'a str {
    user_id
        .filter(|u| !u.trim().is_empty())
        .unwrap_or(default_user)
}
