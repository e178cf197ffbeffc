use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::parsers::ParsedAnalysis;

/// Maximum number of catalog IDs attached to one analysis.
pub const MAX_RECOMMENDED_PRODUCTS: usize = 5;

/// Structured outcome of one image analysis. Stored as one document per
/// analysis and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SkinAnalysisResult {
    pub skin_type: String,
    pub hydration_level: String,
    pub oil_level: String,
    pub overall_condition: String,
    pub concerns: Vec<String>,
    pub recommendations: Vec<String>,
    pub tips: Vec<String>,
    pub recommended_product_ids: Vec<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl SkinAnalysisResult {
    pub fn from_parsed(parsed: &ParsedAnalysis, product_ids: Vec<String>, timestamp: i64) -> Self {
        let mut product_ids = product_ids;
        product_ids.truncate(MAX_RECOMMENDED_PRODUCTS);
        Self {
            skin_type: parsed.skin_type.clone(),
            hydration_level: parsed.hydration_level.clone(),
            oil_level: parsed.oil_level.clone(),
            overall_condition: parsed.overall_condition.clone(),
            concerns: parsed.concerns.clone(),
            recommendations: parsed.recommendations.clone(),
            tips: parsed.tips.clone(),
            recommended_product_ids: product_ids,
            timestamp,
        }
    }
}

/// Catalog entry. Owned externally; read-only here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub skin_types: Vec<String>,
    pub price: String,
    pub description: String,
    pub image_url: String,
    pub buy_link: String,
}

impl Product {
    pub fn suits(&self, skin_type: &str) -> bool {
        self.skin_types.iter().any(|t| t == skin_type)
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
