use crate::banner::{Banner, BannerEvent};
use crate::category::ProductCategory;
use crate::product::{Product, RelatedProduct};
use async_trait::async_trait;

/// A commerce backend the catalog can read from.
///
/// Implementations return products already adapted to [`Product`]. Transport
/// and decoding failures are reported as errors so the caller can decide on a
/// fallback; "not found" is `Ok(None)`.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn list_products(&self) -> Result<Vec<Product>, anyhow::Error>;

    async fn featured_products(&self) -> Result<Vec<Product>, anyhow::Error>;

    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, anyhow::Error>;

    /// `Ok(None)` when the product itself does not exist, `Ok(Some(vec![]))`
    /// when it exists but the backend knows no relations for it.
    async fn related_products(
        &self,
        slug: &str,
    ) -> Result<Option<Vec<RelatedProduct>>, anyhow::Error>;

    async fn categories(&self) -> Result<Vec<ProductCategory>, anyhow::Error>;

    async fn products_by_category(
        &self,
        category: &ProductCategory,
    ) -> Result<Vec<Product>, anyhow::Error>;

    async fn search_products(&self, query: &str) -> Result<Vec<Product>, anyhow::Error>;

    async fn banners(&self, _placement: &str) -> Result<Vec<Banner>, anyhow::Error> {
        Ok(vec![])
    }

    async fn track_banner(&self, _id: &str, _event: BannerEvent) -> Result<(), anyhow::Error> {
        Ok(())
    }
}
