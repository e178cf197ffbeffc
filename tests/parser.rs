//! Template parsing against realistic model replies.

use skincare_advisor::format::{Locale, render_summary};
use skincare_advisor::parsers::{extract_field, extract_list, parse_analysis};

#[test]
fn vietnamese_reply_with_preamble() {
    let reply = "Dưới đây là kết quả phân tích:\n\n\
                 skinType: Da hỗn hợp\n\
                 hydrationLevel: Trung bình\n\
                 oilLevel: Cao ở vùng chữ T\n\
                 overallCondition: Khá tốt\n\
                 concerns: [mụn đầu đen, lỗ chân lông to]\n\
                 recommendations: [Rửa mặt 2 lần/ngày, Dùng kem chống nắng]\n\
                 tips: [Uống đủ nước]\n\
                 recommendedProducts: []\n";

    let parsed = parse_analysis(reply);
    assert_eq!(parsed.skin_type, "Da hỗn hợp");
    assert_eq!(parsed.oil_level, "Cao ở vùng chữ T");
    assert_eq!(parsed.concerns, vec!["mụn đầu đen", "lỗ chân lông to"]);
    assert!(parsed.recommended_products.is_empty());

    let summary = render_summary(&parsed, Locale::Vi);
    assert!(summary.contains("• **Loại da**: Da hỗn hợp"));
    assert!(!summary.contains("Sản phẩm đề xuất"));
}

#[test]
fn first_occurrence_wins() {
    let reply = "skinType: Dry\nskinType: Oily\nconcerns: [a]\nconcerns: [b]";
    assert_eq!(extract_field(reply, "skinType"), "Dry");
    assert_eq!(extract_list(reply, "concerns"), vec!["a"]);
}

#[test]
fn commas_inside_items_split_them() {
    let reply = "tips: [Use SPF 30, or higher, daily]";
    assert_eq!(extract_list(reply, "tips"), vec!["Use SPF 30", "or higher", "daily"]);
}

#[test]
fn keys_are_case_sensitive() {
    assert_eq!(extract_field("SkinType: Dry", "skinType"), "");
    assert!(extract_list("Concerns: [acne]", "concerns").is_empty());
}

#[test]
fn markdown_styled_reply() {
    let reply = "**skinType**: Normal\n**concerns:** [\"redness\", \"dryness\"]";
    let parsed = parse_analysis(reply);
    assert_eq!(parsed.skin_type, "Normal");
    assert_eq!(parsed.concerns, vec!["redness", "dryness"]);
}
