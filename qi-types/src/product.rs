use crate::{PhysicalState, StockStatus};
use serde::{Deserialize, Serialize};

pub const SUMMARY_MAX_CHARS: usize = 220;
pub const MAX_HERO_HIGHLIGHTS: usize = 6;
pub const PRICE_ON_REQUEST: &str = "Consultar precio";

pub const DEFAULT_HIGHLIGHTS: [&str; 3] = [
    "Soporte técnico especializado",
    "Despacho a todo el Perú",
    "Calidad certificada",
];

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub image: String,
    pub images: Vec<ProductImage>,
    pub categories: Vec<String>,
    pub presentations: Vec<ProductPresentation>,
    pub summary: String,
    pub description: String,
    pub popularity: u64,
    pub created_at: String,
    pub featured: Option<bool>,
    pub hero_highlights: Vec<String>,
    pub price: Option<String>,
    pub regular_price: Option<String>,
    pub sale_price: Option<String>,
    pub price_text: Option<String>,
    pub stock_status: StockStatus,
    pub stock_quantity: Option<i64>,
    pub purchasable: bool,
    pub sku: Option<String>,
    pub weight: Option<String>,
    pub dimensions: Option<ProductDimensions>,
    pub tags: Vec<ProductTag>,
    pub attributes: Vec<ProductAttribute>,
    pub average_rating: f64,
    pub rating_count: u64,
    pub total_sales: u64,
    pub on_sale: bool,
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
    pub downloadable: bool,
    pub external_url: Option<String>,
    pub button_text: Option<String>,
    pub purchase_note: Option<String>,
    pub reviews_allowed: bool,
    pub upsell_ids: Vec<u64>,
    pub cross_sell_ids: Vec<u64>,
    pub related_ids: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_state: Option<PhysicalState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searches: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_quotes: Option<u64>,
}

impl Product {
    pub fn in_category(&self, category_id: &str) -> bool {
        self.categories.iter().any(|c| c == category_id)
    }

    pub fn shares_category_with<'a, I>(&self, categories: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        categories.into_iter().any(|c| self.in_category(c))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductImage {
    pub id: i64,
    pub src: String,
    pub name: String,
    pub alt: String,
    pub thumbnail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srcset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
}

impl ProductImage {
    pub fn new(id: i64, src: impl Into<String>, label: impl Into<String>) -> Self {
        let src = src.into();
        let label = label.into();
        Self {
            id,
            thumbnail: src.clone(),
            src,
            alt: label.clone(),
            name: label,
            srcset: None,
            sizes: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPresentation {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_order: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProductDimensions {
    pub length: String,
    pub width: String,
    pub height: String,
}

impl ProductDimensions {
    pub fn is_empty(&self) -> bool {
        self.length.trim().is_empty() && self.width.trim().is_empty() && self.height.trim().is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProductTag {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProductAttribute {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub position: u32,
    pub visible: bool,
    pub variation: bool,
    pub options: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RelatedProduct {
    #[serde(flatten)]
    pub product: Product,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_reason: Option<String>,
}

impl From<Product> for RelatedProduct {
    fn from(product: Product) -> Self {
        Self {
            product,
            relationship_reason: None,
        }
    }
}

/// Lowercases and joins whitespace runs with `-`.
pub fn tag_slug(name: &str) -> String {
    itertools::join(name.to_lowercase().split_whitespace(), "-")
}

/// Fills `highlights` with the default selling points until it holds
/// [`MAX_HERO_HIGHLIGHTS`] entries, then caps it.
pub fn complete_highlights(mut highlights: Vec<String>) -> Vec<String> {
    for fallback in DEFAULT_HIGHLIGHTS {
        if highlights.len() >= MAX_HERO_HIGHLIGHTS {
            break;
        }
        if !highlights.iter().any(|h| h == fallback) {
            highlights.push(fallback.to_string());
        }
    }
    highlights.truncate(MAX_HERO_HIGHLIGHTS);
    highlights
}

pub fn push_unique(highlights: &mut Vec<String>, value: impl Into<String>) {
    let value = value.into();
    if !value.trim().is_empty() && !highlights.contains(&value) {
        highlights.push(value);
    }
}
