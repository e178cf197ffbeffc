use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::catalog::{self, ALL_CATEGORIES};
use crate::model::Product;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProductsRequest {
    /// Category to list, or "All" (default).
    pub category: Option<String>,
    /// Only products suited to this skin type (exact match, e.g. "Oily").
    pub skin_type: Option<String>,
}

impl ProductsRequest {
    pub fn category_or_all(&self) -> &str {
        self.category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(ALL_CATEGORIES)
    }
}

#[derive(Debug, Serialize)]
pub struct ProductListing {
    pub categories: Vec<String>,
    pub selected_category: String,
    pub products: Vec<Product>,
    pub featured: Vec<Product>,
}

impl ProductListing {
    pub fn build(all: &[Product], req: &ProductsRequest) -> Self {
        let category = req.category_or_all();
        let mut products: Vec<Product> = catalog::filter_by_category(all, category)
            .into_iter()
            .cloned()
            .collect();
        if let Some(skin_type) = req.skin_type.as_deref().filter(|s| !s.trim().is_empty()) {
            products = catalog::for_skin_type(&products, skin_type)
                .into_iter()
                .cloned()
                .collect();
        }

        Self {
            categories: catalog::categories(all),
            selected_category: category.to_string(),
            products,
            featured: catalog::featured(all, category).into_iter().cloned().collect(),
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "**{}** ({} products)\n",
            self.selected_category,
            self.products.len()
        );
        for p in &self.products {
            out.push_str(&format!("- {} ({})", p.name, p.category));
            if !p.price.is_empty() {
                out.push_str(&format!(" {}", p.price));
            }
            if !p.skin_types.is_empty() {
                out.push_str(&format!(" [{}]", p.skin_types.join(", ")));
            }
            out.push('\n');
        }
        out.push_str(&format!("\nCategories: {}", self.categories.join(", ")));
        out
    }
}
