pub mod analysis;

pub use analysis::{ParsedAnalysis, extract_field, extract_list, parse_analysis};
