use async_trait::async_trait;
use futures::future::join_all;
use log_error::LogError;
use qi_types::banner::{Banner, BannerEvent};
use qi_types::category::ProductCategory;
use qi_types::product::{Product, RelatedProduct};
use qi_types::source::CatalogSource;
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod adapter;
pub mod api;

use api::{ProductQuery, QiCategory, QiClient, QiPresentation, QiProduct};

const ALL_PRODUCTS_LIMIT: u32 = 1000;
const SEARCH_LIMIT: u32 = 100;
const MAX_RELATED: usize = 6;
const PUBLISHED: &str = "published";

#[derive(Default)]
struct BaseData {
    categories: Vec<QiCategory>,
    presentations: Vec<QiPresentation>,
}

/// [`CatalogSource`] backed by the QI API. Categories and presentations are
/// needed to adapt every product, so they are loaded once and kept for the
/// lifetime of the source.
pub struct QiSource {
    api: QiClient,
    base: RwLock<Option<Arc<BaseData>>>,
}

impl QiSource {
    pub fn new(api: QiClient) -> Self {
        Self {
            api,
            base: RwLock::new(None),
        }
    }

    async fn base_data(&self) -> Arc<BaseData> {
        if let Some(base) = self.base.read().await.as_ref() {
            return base.clone();
        }
        let (categories, presentations) =
            tokio::join!(self.api.categories(true), self.api.presentations());
        let categories = categories.log_error("Unable to load QI categories");
        let presentations = presentations.log_error("Unable to load QI presentations");
        let complete = categories.is_some() && presentations.is_some();
        let base = Arc::new(BaseData {
            categories: categories.unwrap_or_default(),
            presentations: presentations.unwrap_or_default(),
        });
        if complete {
            *self.base.write().await = Some(base.clone());
        }
        base
    }

    async fn adapt_all(&self, products: Vec<QiProduct>) -> Vec<Product> {
        let base = self.base_data().await;
        products
            .iter()
            .map(|p| adapter::adapt_product(p, &base.categories, &base.presentations))
            .collect()
    }
}

#[async_trait]
impl CatalogSource for QiSource {
    fn name(&self) -> &'static str {
        "qi"
    }

    async fn list_products(&self) -> Result<Vec<Product>, anyhow::Error> {
        // Most of the catalog is still in draft, so no status filter here.
        let products = self
            .api
            .products(&ProductQuery {
                limit: Some(ALL_PRODUCTS_LIMIT),
                ..Default::default()
            })
            .await?;
        Ok(self.adapt_all(products).await)
    }

    async fn featured_products(&self) -> Result<Vec<Product>, anyhow::Error> {
        let products = self.api.featured_products().await?;
        Ok(self.adapt_all(products).await)
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, anyhow::Error> {
        let Some(product) = self.api.product_by_slug(slug).await? else {
            return Ok(None);
        };
        let base = self.base_data().await;
        Ok(Some(adapter::adapt_product(
            &product,
            &base.categories,
            &base.presentations,
        )))
    }

    async fn related_products(
        &self,
        slug: &str,
    ) -> Result<Option<Vec<RelatedProduct>>, anyhow::Error> {
        let Some(current) = self.api.product_by_slug(slug).await? else {
            return Ok(None);
        };
        let base = self.base_data().await;
        let adapt = |p: &QiProduct| adapter::adapt_product(p, &base.categories, &base.presentations);

        if !current.related_products.is_empty() {
            let fetched = join_all(
                current
                    .related_products
                    .iter()
                    .take(MAX_RELATED)
                    .map(|r| self.api.product_by_id(&r.product_id)),
            )
            .await;
            let related = fetched
                .into_iter()
                .filter_map(|r| r.log_error("Unable to fetch related QI product").flatten())
                .map(|p| RelatedProduct {
                    product: adapt(&p),
                    relationship_reason: current
                        .related_products
                        .iter()
                        .find(|r| r.product_id == p.id)
                        .and_then(|r| r.reason.clone()),
                })
                .collect();
            return Ok(Some(related));
        }

        let related = self.api.related_products(&current.id).await?;
        Ok(Some(
            related
                .iter()
                .take(MAX_RELATED)
                .map(adapt)
                .map(RelatedProduct::from)
                .collect(),
        ))
    }

    async fn categories(&self) -> Result<Vec<ProductCategory>, anyhow::Error> {
        let categories = self.api.categories(true).await?;
        Ok(categories.iter().map(adapter::adapt_category).collect())
    }

    async fn products_by_category(
        &self,
        category: &ProductCategory,
    ) -> Result<Vec<Product>, anyhow::Error> {
        let products = self
            .api
            .products(&ProductQuery {
                category: Some(category.id.clone()),
                status: Some(PUBLISHED.to_string()),
                limit: Some(ALL_PRODUCTS_LIMIT),
                ..Default::default()
            })
            .await?;
        Ok(self.adapt_all(products).await)
    }

    async fn search_products(&self, query: &str) -> Result<Vec<Product>, anyhow::Error> {
        let products = self
            .api
            .products(&ProductQuery {
                search: Some(query.to_string()),
                status: Some(PUBLISHED.to_string()),
                limit: Some(SEARCH_LIMIT),
                ..Default::default()
            })
            .await?;
        Ok(self.adapt_all(products).await)
    }

    async fn banners(&self, placement: &str) -> Result<Vec<Banner>, anyhow::Error> {
        let mut banners = self.api.active_banners(placement).await?;
        banners.sort_by_key(|b| b.sort_order);
        Ok(banners.iter().map(adapter::adapt_banner).collect())
    }

    async fn track_banner(&self, id: &str, event: BannerEvent) -> Result<(), anyhow::Error> {
        match event {
            BannerEvent::Impression => self.api.track_banner_impression(id).await,
            BannerEvent::Click => self.api.track_banner_click(id).await,
        }
    }
}
