use async_trait::async_trait;

use crate::error::AdvisorError;
use crate::model::{MAX_RECOMMENDED_PRODUCTS, Product};

/// Category name meaning "no filter".
pub const ALL_CATEGORIES: &str = "All";

/// Number of products shown as featured.
pub const FEATURED_COUNT: usize = 4;

/// Skin types offered to the model when the catalog can't supply any.
pub const DEFAULT_SKIN_TYPES: &[&str] = &["Dry", "Oily", "Combination", "Normal", "Sensitive"];

/// Read access to the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, AdvisorError>;

    /// Products whose name equals `name` exactly and whose skin types
    /// contain `skin_type`, at most `limit` of them.
    async fn find_by_name_and_skin_type(
        &self,
        name: &str,
        skin_type: &str,
        limit: usize,
    ) -> Result<Vec<Product>, AdvisorError>;
}

/// Resolve free-text product names to catalog IDs.
///
/// One lookup per name (duplicates included), at most one hit each, stopping
/// at `MAX_RECOMMENDED_PRODUCTS`. Any lookup failure discards everything.
pub async fn match_products(
    catalog: &dyn ProductCatalog,
    skin_type: &str,
    names: &[String],
) -> Vec<String> {
    let mut ids = Vec::new();

    for name in names {
        if ids.len() >= MAX_RECOMMENDED_PRODUCTS {
            break;
        }
        match catalog.find_by_name_and_skin_type(name, skin_type, 1).await {
            Ok(found) => ids.extend(found.into_iter().take(1).map(|p| p.id)),
            Err(e) => {
                tracing::warn!("product match failed for {name:?}: {e}");
                return Vec::new();
            }
        }
    }

    if ids.len() < names.len().min(MAX_RECOMMENDED_PRODUCTS) {
        tracing::debug!(
            "matched {} of {} recommended products for skin type {skin_type:?}",
            ids.len(),
            names.len()
        );
    }
    ids
}

/// Distinct skin types across the catalog in first-seen order, or the
/// default list when the catalog errors or names none.
pub async fn available_skin_types(catalog: &dyn ProductCatalog) -> Vec<String> {
    let products = match catalog.list_products().await {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("failed to load skin types from catalog: {e}");
            return default_skin_types();
        }
    };

    let mut types: Vec<String> = Vec::new();
    for t in products.iter().flat_map(|p| p.skin_types.iter()) {
        if !types.contains(t) {
            types.push(t.clone());
        }
    }

    if types.is_empty() {
        default_skin_types()
    } else {
        types
    }
}

fn default_skin_types() -> Vec<String> {
    DEFAULT_SKIN_TYPES.iter().map(|s| s.to_string()).collect()
}

/// `"All"` followed by the distinct categories, sorted.
pub fn categories(products: &[Product]) -> Vec<String> {
    let mut cats: Vec<String> = products.iter().map(|p| p.category.clone()).collect();
    cats.sort();
    cats.dedup();

    let mut out = Vec::with_capacity(cats.len() + 1);
    out.push(ALL_CATEGORIES.to_string());
    out.extend(cats);
    out
}

pub fn filter_by_category<'a>(products: &'a [Product], category: &str) -> Vec<&'a Product> {
    if category == ALL_CATEGORIES {
        return products.iter().collect();
    }
    products.iter().filter(|p| p.category == category).collect()
}

pub fn for_skin_type<'a>(products: &'a [Product], skin_type: &str) -> Vec<&'a Product> {
    products.iter().filter(|p| p.suits(skin_type)).collect()
}

/// Products to feature next to a category listing: the first few overall
/// for `"All"`, otherwise the first few from other categories.
pub fn featured<'a>(products: &'a [Product], category: &str) -> Vec<&'a Product> {
    if category == ALL_CATEGORIES {
        return products.iter().take(FEATURED_COUNT).collect();
    }
    products
        .iter()
        .filter(|p| p.category != category)
        .take(FEATURED_COUNT)
        .collect()
}
