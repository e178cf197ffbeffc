pub mod local;

use async_trait::async_trait;

use crate::error::AdvisorError;
use crate::model::SkinAnalysisResult;
use crate::routine::Routine;

pub use local::LocalStore;

/// Per-user analysis history.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Persist one result as a new document; returns the document ID.
    async fn save_analysis(
        &self,
        user_id: &str,
        result: &SkinAnalysisResult,
    ) -> Result<String, AdvisorError>;

    /// The result with the greatest timestamp, if any.
    async fn latest_analysis(
        &self,
        user_id: &str,
    ) -> Result<Option<SkinAnalysisResult>, AdvisorError>;

    /// Up to `limit` results, newest first.
    async fn history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<SkinAnalysisResult>, AdvisorError>;
}

/// Per-user routine checklist state.
#[async_trait]
pub trait RoutineStore: Send + Sync {
    async fn load_routine(&self, user_id: &str) -> Result<Option<Routine>, AdvisorError>;

    /// Replace the user's saved routine.
    async fn save_routine(&self, user_id: &str, routine: &Routine) -> Result<(), AdvisorError>;
}
