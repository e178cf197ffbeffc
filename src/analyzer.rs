use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::catalog::{self, ProductCatalog};
use crate::dispatch::{ChatBackend, CompletionRequest};
use crate::error::AdvisorError;
use crate::format::{Locale, render_summary};
use crate::image::ImageAttachment;
use crate::model::{SkinAnalysisResult, now_millis};
use crate::parsers::parse_analysis;
use crate::prompt;
use crate::store::AnalysisStore;

/// Deadline for one image analysis call.
pub const ANALYSIS_DEADLINE: Duration = Duration::from_secs(180);

/// What one analysis produced.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub result: SkinAnalysisResult,
    /// Bulleted summary for display.
    pub display: String,
    /// None when the result could not be persisted.
    pub document_id: Option<String>,
    pub model: String,
    pub latency_ms: u64,
}

pub struct SkinAnalyzer {
    backend: Arc<dyn ChatBackend>,
    catalog: Arc<dyn ProductCatalog>,
    store: Arc<dyn AnalysisStore>,
    model: String,
    locale: Locale,
}

impl SkinAnalyzer {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        catalog: Arc<dyn ProductCatalog>,
        store: Arc<dyn AnalysisStore>,
        model: impl Into<String>,
        locale: Locale,
    ) -> Self {
        Self {
            backend,
            catalog,
            store,
            model: model.into(),
            locale,
        }
    }

    /// Analyze one image for `user_id`, persist the result and render it.
    ///
    /// Only a failed completion call fails the analysis. Catalog problems
    /// degrade to default skin types and no product matches; a failed save
    /// is logged and leaves `document_id` empty.
    pub async fn analyze(
        &self,
        user_id: &str,
        image: ImageAttachment,
    ) -> Result<AnalysisOutcome, AdvisorError> {
        let skin_types = catalog::available_skin_types(self.catalog.as_ref()).await;
        let listing = match self.catalog.list_products().await {
            Ok(products) => prompt::product_listing(&products),
            Err(e) => {
                tracing::warn!("analysis: catalog unavailable, sending no product list: {e}");
                String::new()
            }
        };

        let req = CompletionRequest {
            model: self.model.clone(),
            system_prompt: Some(prompt::analysis_system_prompt(self.locale)),
            parts: prompt::analysis_parts(&skin_types, &listing, image),
            deadline: Instant::now() + ANALYSIS_DEADLINE,
            temperature: None,
            max_tokens: None,
        };

        let completion = self.backend.complete(&req).await?;
        tracing::debug!("analysis: raw reply: {}", completion.text);

        let parsed = parse_analysis(&completion.text);
        if parsed.is_empty() {
            tracing::warn!("analysis: reply did not follow the template");
        }

        let product_ids = catalog::match_products(
            self.catalog.as_ref(),
            &parsed.skin_type,
            &parsed.recommended_products,
        )
        .await;

        let result = SkinAnalysisResult::from_parsed(&parsed, product_ids, now_millis());
        let display = render_summary(&parsed, self.locale);

        let document_id = match self.store.save_analysis(user_id, &result).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("analysis: failed to persist result for {user_id}: {e}");
                None
            }
        };

        tracing::info!(
            skin_type = %result.skin_type,
            products = result.recommended_product_ids.len(),
            latency_ms = completion.latency_ms,
            "analysis complete"
        );

        Ok(AnalysisOutcome {
            result,
            display,
            document_id,
            model: completion.model,
            latency_ms: completion.latency_ms,
        })
    }

    pub async fn latest(&self, user_id: &str) -> Result<Option<SkinAnalysisResult>, AdvisorError> {
        self.store.latest_analysis(user_id).await
    }

    pub async fn history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<SkinAnalysisResult>, AdvisorError> {
        self.store.history(user_id, limit).await
    }
}
