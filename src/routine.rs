use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::AdvisorError;
use crate::model::SkinAnalysisResult;
use crate::store::{AnalysisStore, RoutineStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineStep {
    pub step: String,
    pub is_done: bool,
}

/// Daily checklist built from an analysis' care recommendations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Routine {
    /// Timestamp of the analysis the steps came from; 0 when built ad hoc.
    analysis_timestamp: i64,
    steps: Vec<RoutineStep>,
}

impl Routine {
    pub fn from_recommendations(recommendations: &[String]) -> Self {
        Self {
            analysis_timestamp: 0,
            steps: recommendations
                .iter()
                .map(|r| RoutineStep {
                    step: r.clone(),
                    is_done: false,
                })
                .collect(),
        }
    }

    pub fn for_analysis(analysis: &SkinAnalysisResult) -> Self {
        Self {
            analysis_timestamp: analysis.timestamp,
            ..Self::from_recommendations(&analysis.recommendations)
        }
    }

    pub fn analysis_timestamp(&self) -> i64 {
        self.analysis_timestamp
    }

    pub fn steps(&self) -> &[RoutineStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn completed(&self) -> usize {
        self.steps.iter().filter(|s| s.is_done).count()
    }

    pub fn toggle(&mut self, index: usize) -> Result<bool, AdvisorError> {
        let step = self.step_mut(index)?;
        step.is_done = !step.is_done;
        Ok(step.is_done)
    }

    pub fn update(&mut self, index: usize, text: &str) -> Result<(), AdvisorError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AdvisorError::InvalidInput(
                "routine step text must not be empty".to_string(),
            ));
        }
        self.step_mut(index)?.step = text.to_string();
        Ok(())
    }

    fn step_mut(&mut self, index: usize) -> Result<&mut RoutineStep, AdvisorError> {
        let len = self.steps.len();
        self.steps.get_mut(index).ok_or_else(|| {
            AdvisorError::InvalidInput(format!("routine step {index} out of range (0..{len})"))
        })
    }

    /// Checklist as markdown task items, prefixed with the step index.
    pub fn to_markdown(&self) -> String {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{i}. [{}] {}", if s.is_done { "x" } else { " " }, s.step))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Per-user routine state that follows the latest analysis.
///
/// A saved routine is only reused while it belongs to the user's latest
/// analysis; a newer analysis starts a fresh checklist.
pub struct RoutineTracker {
    analyses: Arc<dyn AnalysisStore>,
    routines: Arc<dyn RoutineStore>,
    edit_lock: Mutex<()>,
}

impl RoutineTracker {
    pub fn new(analyses: Arc<dyn AnalysisStore>, routines: Arc<dyn RoutineStore>) -> Self {
        Self {
            analyses,
            routines,
            edit_lock: Mutex::new(()),
        }
    }

    pub async fn current(&self, user_id: &str) -> Result<Routine, AdvisorError> {
        let Some(latest) = self.analyses.latest_analysis(user_id).await? else {
            return Ok(Routine::default());
        };

        match self.routines.load_routine(user_id).await {
            Ok(Some(saved)) if saved.analysis_timestamp == latest.timestamp => Ok(saved),
            Ok(_) => Ok(Routine::for_analysis(&latest)),
            Err(e) => {
                tracing::warn!("routine: saved state for {user_id} unreadable, rebuilding: {e}");
                Ok(Routine::for_analysis(&latest))
            }
        }
    }

    pub async fn toggle(&self, user_id: &str, index: usize) -> Result<Routine, AdvisorError> {
        self.edit(user_id, |routine| routine.toggle(index).map(|_| ()))
            .await
    }

    pub async fn update(
        &self,
        user_id: &str,
        index: usize,
        text: &str,
    ) -> Result<Routine, AdvisorError> {
        self.edit(user_id, |routine| routine.update(index, text)).await
    }

    async fn edit<F>(&self, user_id: &str, apply: F) -> Result<Routine, AdvisorError>
    where
        F: FnOnce(&mut Routine) -> Result<(), AdvisorError>,
    {
        let _guard = self.edit_lock.lock().await;
        let mut routine = self.current(user_id).await?;
        apply(&mut routine)?;
        self.routines.save_routine(user_id, &routine).await?;
        Ok(routine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routine() -> Routine {
        Routine::from_recommendations(&["Cleanse".to_string(), "Moisturize".to_string()])
    }

    #[test]
    fn starts_undone() {
        let r = routine();
        assert_eq!(r.steps().len(), 2);
        assert_eq!(r.completed(), 0);
    }

    #[test]
    fn toggle_flips() {
        let mut r = routine();
        assert!(r.toggle(1).unwrap());
        assert_eq!(r.completed(), 1);
        assert!(!r.toggle(1).unwrap());
        assert_eq!(r.completed(), 0);
    }

    #[test]
    fn update_replaces_text() {
        let mut r = routine();
        r.update(0, " Double cleanse ").unwrap();
        assert_eq!(r.steps()[0].step, "Double cleanse");
        assert!(!r.steps()[0].is_done);
    }

    #[test]
    fn update_rejects_blank_text() {
        let mut r = routine();
        assert!(matches!(r.update(0, "  "), Err(AdvisorError::InvalidInput(_))));
        assert_eq!(r.steps()[0].step, "Cleanse");
    }

    #[test]
    fn out_of_range_is_error() {
        let mut r = routine();
        assert!(matches!(r.toggle(2), Err(AdvisorError::InvalidInput(_))));
        assert!(r.update(5, "x").is_err());
    }

    #[test]
    fn markdown_checklist() {
        let mut r = routine();
        r.toggle(0).unwrap();
        assert_eq!(r.to_markdown(), "0. [x] Cleanse\n1. [ ] Moisturize");
        assert_eq!(Routine::default().to_markdown(), "");
    }

    #[test]
    fn for_analysis_remembers_its_source() {
        let analysis = SkinAnalysisResult {
            recommendations: vec!["SPF".to_string()],
            timestamp: 42,
            ..Default::default()
        };
        let r = Routine::for_analysis(&analysis);
        assert_eq!(r.analysis_timestamp(), 42);
        assert_eq!(r.steps()[0].step, "SPF");
    }
}
