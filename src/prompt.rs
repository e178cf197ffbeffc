use crate::dispatch::ContentPart;
use crate::format::Locale;
use crate::image::ImageAttachment;
use crate::model::Product;
use crate::parsers::analysis::{
    KEY_CONCERNS, KEY_HYDRATION_LEVEL, KEY_OIL_LEVEL, KEY_OVERALL_CONDITION,
    KEY_RECOMMENDATIONS, KEY_RECOMMENDED_PRODUCTS, KEY_SKIN_TYPE, KEY_TIPS,
};

/// System prompt for the free-form advisor chat.
pub fn chat_system_prompt(locale: Locale) -> String {
    format!(
        "You are a skin analysis expert. You may only answer questions about skincare, \
         skin analysis, skincare products, skincare routines and other skin-related topics. \
         If the user asks about anything unrelated to skin (for example programming, games \
         or math), politely decline because it is outside your expertise. Answer in a \
         friendly, short and clear style, entirely in {}. Never step outside the role of a \
         dermatology expert.",
        locale.language()
    )
}

/// System prompt for image analysis.
pub fn analysis_system_prompt(locale: Locale) -> String {
    format!(
        "You are a skin analysis expert. Answer in {}, friendly and clear, \
         in exactly the requested format.",
        locale.language()
    )
}

/// One line per product, the way the model sees the catalog.
pub fn product_listing(products: &[Product]) -> String {
    products
        .iter()
        .map(|p| {
            let name = non_empty_or(&p.name, "Unnamed");
            let category = non_empty_or(&p.category, "Unknown category");
            let skin_types = if p.skin_types.is_empty() {
                "Unknown skin type".to_string()
            } else {
                p.skin_types.join(", ")
            };
            format!("- Name: {name} | Category: {category} | Skin types: {skin_types}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

/// User message parts for one analysis: instructions, catalog, the answer
/// template, then the image.
pub fn analysis_parts(
    skin_types: &[String],
    listing: &str,
    image: ImageAttachment,
) -> Vec<ContentPart> {
    let mut lines = vec![
        "Analyze this photo of skin.".to_string(),
        "Report: skin type, hydration level, oil level, overall condition, skin concerns."
            .to_string(),
        "Then give 3-5 care recommendations and 1-3 useful tips.".to_string(),
        format!(
            "Classify the skin type as exactly one of: {}.",
            skin_types.join(", ")
        ),
    ];

    if listing.is_empty() {
        lines.push(format!(
            "No product catalog is available; leave {KEY_RECOMMENDED_PRODUCTS} empty."
        ));
    } else {
        lines.push(
            "Below is the list of products available in our catalog. \
             Each product has a name, a category and the skin types it suits."
                .to_string(),
        );
        lines.push(listing.to_string());
        lines.push(
            "Based on the user's skin type, choose the 1-2 most suitable products from the list \
             and write their names exactly as listed."
                .to_string(),
        );
    }

    lines.push("Use this format (NO curly braces, NO double quotes):".to_string());
    lines.extend(template_lines());

    let mut parts: Vec<ContentPart> = lines.into_iter().map(ContentPart::Text).collect();
    parts.push(ContentPart::Image(image));
    parts
}

fn template_lines() -> Vec<String> {
    let scalars = [
        KEY_SKIN_TYPE,
        KEY_HYDRATION_LEVEL,
        KEY_OIL_LEVEL,
        KEY_OVERALL_CONDITION,
    ];
    let lists = [
        KEY_CONCERNS,
        KEY_RECOMMENDATIONS,
        KEY_TIPS,
        KEY_RECOMMENDED_PRODUCTS,
    ];
    scalars
        .iter()
        .map(|k| format!("{k}: ..."))
        .chain(lists.iter().map(|k| format!("{k}: [ ... ]")))
        .collect()
}
