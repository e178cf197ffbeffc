use schemars::JsonSchema;
use serde::Deserialize;

/// Mark a routine step done, or undone again.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RoutineToggleRequest {
    /// User whose routine to change (defaults to the configured user).
    pub user_id: Option<String>,
    /// Step number as listed by `routine`, starting at 0.
    pub index: usize,
}

/// Replace the text of a routine step.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RoutineUpdateRequest {
    pub user_id: Option<String>,
    /// Step number as listed by `routine`, starting at 0.
    pub index: usize,
    /// New step text.
    pub text: String,
}
