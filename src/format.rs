use chrono::DateTime;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::SkinAnalysisResult;
use crate::parsers::ParsedAnalysis;

/// Language for prompts, rendered summaries and tool messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Vi,
}

impl Locale {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "en" | "english" => Some(Self::En),
            "vi" | "vietnamese" => Some(Self::Vi),
            _ => None,
        }
    }

    /// Language name as written into prompts.
    pub fn language(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Vi => "Vietnamese",
        }
    }

    /// Fixed user-facing sentences.
    pub fn messages(&self) -> &'static Messages {
        match self {
            Self::En => &EN_MESSAGES,
            Self::Vi => &VI_MESSAGES,
        }
    }

    fn labels(&self) -> &'static Labels {
        match self {
            Self::En => &EN_LABELS,
            Self::Vi => &VI_LABELS,
        }
    }
}

struct Labels {
    skin_type: &'static str,
    hydration: &'static str,
    oil: &'static str,
    overall: &'static str,
    concerns: &'static str,
    recommendations: &'static str,
    tips: &'static str,
    products: &'static str,
}

const EN_LABELS: Labels = Labels {
    skin_type: "Skin type",
    hydration: "Hydration",
    oil: "Oil level",
    overall: "Overall condition",
    concerns: "Skin concerns",
    recommendations: "Care recommendations",
    tips: "Tips",
    products: "Recommended products",
};

const VI_LABELS: Labels = Labels {
    skin_type: "Loại da",
    hydration: "Độ ẩm",
    oil: "Độ dầu",
    overall: "Tình trạng tổng thể",
    concerns: "Vấn đề da",
    recommendations: "Gợi ý chăm sóc",
    tips: "Mẹo",
    products: "Sản phẩm đề xuất",
};

pub struct Messages {
    pub greeting: &'static str,
    /// Prefix of the reply shown when a chat request fails.
    pub chat_failed: &'static str,
    pub analysis_failed: &'static str,
    pub not_saved: &'static str,
    pub no_analysis: &'static str,
    pub no_history: &'static str,
    pub no_routine: &'static str,
    pub unknown_skin_type: &'static str,
    pub concerns: &'static str,
    pub products: &'static str,
}

const EN_MESSAGES: Messages = Messages {
    greeting: "Hello! I'm your AI skincare assistant. How can I help you today?",
    chat_failed: "Sorry, I couldn't process your request",
    analysis_failed: "Analysis failed",
    not_saved: "(This analysis could not be saved to your history.)",
    no_analysis: "No skin analysis yet. Use `analyze_skin` with a photo first.",
    no_history: "No skin analysis yet.",
    no_routine: "No routine yet. Analyze a photo to get personalized steps.",
    unknown_skin_type: "unknown",
    concerns: "concerns",
    products: "products",
};

const VI_MESSAGES: Messages = Messages {
    greeting: "Xin chào! Tôi là trợ lý chăm sóc da AI của bạn. Tôi có thể giúp gì cho bạn hôm nay?",
    chat_failed: "Xin lỗi, tôi không thể xử lý yêu cầu của bạn",
    analysis_failed: "Phân tích thất bại",
    not_saved: "(Không thể lưu kết quả phân tích này vào lịch sử của bạn.)",
    no_analysis: "Chưa có kết quả phân tích da. Hãy dùng `analyze_skin` với một ảnh trước.",
    no_history: "Chưa có kết quả phân tích da.",
    no_routine: "Chưa có quy trình. Hãy phân tích một ảnh để nhận các bước chăm sóc riêng.",
    unknown_skin_type: "không rõ",
    concerns: "vấn đề",
    products: "sản phẩm",
};

/// Render a parsed analysis as a bulleted markdown summary.
///
/// The four scalar lines are always present; list sections only when they
/// have items.
pub fn render_summary(parsed: &ParsedAnalysis, locale: Locale) -> String {
    let labels = locale.labels();
    let mut out = String::new();

    out.push_str(&format!("• **{}**: {}\n", labels.skin_type, parsed.skin_type));
    out.push_str(&format!("• **{}**: {}\n", labels.hydration, parsed.hydration_level));
    out.push_str(&format!("• **{}**: {}\n", labels.oil, parsed.oil_level));
    out.push_str(&format!("• **{}**: {}\n", labels.overall, parsed.overall_condition));

    push_section(&mut out, labels.concerns, &parsed.concerns);
    push_section(&mut out, labels.recommendations, &parsed.recommendations);
    push_section(&mut out, labels.tips, &parsed.tips);
    push_section(&mut out, labels.products, &parsed.recommended_products);

    out.trim().to_string()
}

/// Render a stored result. Stored results only keep product IDs, so the
/// caller supplies the product names to show.
pub fn render_stored(
    result: &SkinAnalysisResult,
    product_names: Vec<String>,
    locale: Locale,
) -> String {
    let parsed = ParsedAnalysis {
        skin_type: result.skin_type.clone(),
        hydration_level: result.hydration_level.clone(),
        oil_level: result.oil_level.clone(),
        overall_condition: result.overall_condition.clone(),
        concerns: result.concerns.clone(),
        recommendations: result.recommendations.clone(),
        tips: result.tips.clone(),
        recommended_products: product_names,
    };
    render_summary(&parsed, locale)
}

/// One line per stored result, newest first as given.
pub fn render_history(results: &[SkinAnalysisResult], locale: Locale) -> String {
    let messages = locale.messages();
    if results.is_empty() {
        return messages.no_history.to_string();
    }

    let mut out = String::new();
    for r in results {
        let skin_type = if r.skin_type.is_empty() {
            messages.unknown_skin_type
        } else {
            r.skin_type.as_str()
        };
        out.push_str(&format!(
            "- {}: {skin_type} ({} {}, {} {})\n",
            format_timestamp(r.timestamp),
            r.concerns.len(),
            messages.concerns,
            r.recommended_product_ids.len(),
            messages.products,
        ));
    }
    out.trim_end().to_string()
}

/// `YYYY-MM-DD HH:MM UTC`, or the raw number when out of range.
pub fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn push_section(out: &mut String, title: &str, items: &[String]) {
    let items: Vec<&str> = items
        .iter()
        .map(|i| i.trim_start_matches('-').trim())
        .filter(|i| !i.is_empty())
        .collect();
    if items.is_empty() {
        return;
    }

    out.push_str(&format!("\n• **{title}:**\n"));
    for item in items {
        out.push_str(&format!("- {item}\n"));
    }
}
