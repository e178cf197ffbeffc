//! Tolerant extraction of template fields from a model reply.
//!
//! The model is asked to answer in lines of `key: value` and
//! `key: [item, item]`, but nothing enforces that. Every extractor degrades
//! to an empty value instead of failing.

use regex::Regex;
use serde::Serialize;

pub const KEY_SKIN_TYPE: &str = "skinType";
pub const KEY_HYDRATION_LEVEL: &str = "hydrationLevel";
pub const KEY_OIL_LEVEL: &str = "oilLevel";
pub const KEY_OVERALL_CONDITION: &str = "overallCondition";
pub const KEY_CONCERNS: &str = "concerns";
pub const KEY_RECOMMENDATIONS: &str = "recommendations";
pub const KEY_TIPS: &str = "tips";
pub const KEY_RECOMMENDED_PRODUCTS: &str = "recommendedProducts";

/// Everything recovered from one reply. Feeds both the persisted
/// `SkinAnalysisResult` and the rendered summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedAnalysis {
    pub skin_type: String,
    pub hydration_level: String,
    pub oil_level: String,
    pub overall_condition: String,
    pub concerns: Vec<String>,
    pub recommendations: Vec<String>,
    pub tips: Vec<String>,
    /// Product names as the model wrote them.
    pub recommended_products: Vec<String>,
}

impl ParsedAnalysis {
    /// True when not a single field could be recovered.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub fn parse_analysis(text: &str) -> ParsedAnalysis {
    ParsedAnalysis {
        skin_type: extract_field(text, KEY_SKIN_TYPE),
        hydration_level: extract_field(text, KEY_HYDRATION_LEVEL),
        oil_level: extract_field(text, KEY_OIL_LEVEL),
        overall_condition: extract_field(text, KEY_OVERALL_CONDITION),
        concerns: extract_list(text, KEY_CONCERNS),
        recommendations: extract_list(text, KEY_RECOMMENDATIONS),
        tips: extract_list(text, KEY_TIPS),
        recommended_products: extract_list(text, KEY_RECOMMENDED_PRODUCTS),
    }
}

/// Key marker: the literal key at a word boundary, optionally closed by
/// markdown bold (`**skinType**:` or `**skinType:**`), then a colon.
fn key_marker(key: &str) -> String {
    format!(r"\b{}\b\**[ \t]*:\**", regex::escape(key))
}

/// Text after `key:` up to the end of that line, trimmed.
pub fn extract_field(text: &str, key: &str) -> String {
    let pattern = format!(r"{}[ \t]*([^\r\n]*)", key_marker(key));
    let Ok(re) = Regex::new(&pattern) else {
        return String::new();
    };
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Comma-separated items of the first `[...]` after `key:`.
/// The brackets may span several lines.
pub fn extract_list(text: &str, key: &str) -> Vec<String> {
    let pattern = format!(r"(?s){}\s*\[(.*?)\]", key_marker(key));
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };
    let Some(inner) = re.captures(text).and_then(|c| c.get(1)) else {
        return Vec::new();
    };

    inner
        .as_str()
        .split(',')
        .map(|item| strip_quotes(item.trim()).to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn strip_quotes(item: &str) -> &str {
    let item = item
        .strip_prefix(['"', '\'', '\u{201C}'])
        .unwrap_or(item);
    let item = item
        .strip_suffix(['"', '\'', '\u{201D}'])
        .unwrap_or(item);
    item.trim()
}
