use crate::fallback::FallbackCatalog;
use crate::search;
use log_error::LogError;
use qi_types::banner::{Banner, BannerEvent, HOMEPAGE_HERO};
use qi_types::category::{derive_categories, ProductCategory};
use qi_types::product::{Product, RelatedProduct};
use qi_types::source::CatalogSource;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const FEATURED_FALLBACK_COUNT: usize = 6;
pub const MAX_RELATED: usize = 6;
const UNKNOWN_PRODUCT_RELATED: usize = 3;

struct Cached<T> {
    cached_at: Instant,
    items: Arc<Vec<T>>,
}

impl<T> Cached<T> {
    fn new(items: Vec<T>) -> Self {
        Self {
            cached_at: Instant::now(),
            items: Arc::new(items),
        }
    }

    fn fresh(&self, ttl: Option<Duration>) -> Option<Arc<Vec<T>>> {
        match ttl {
            Some(ttl) if self.cached_at.elapsed() >= ttl => None,
            _ => Some(self.items.clone()),
        }
    }
}

enum Lookup<T> {
    Fresh(Arc<Vec<T>>),
    Stale(Arc<Vec<T>>, Duration),
    Missing,
}

async fn lookup<T>(cache: &RwLock<Option<Cached<T>>>, ttl: Option<Duration>) -> Lookup<T> {
    match cache.read().await.as_ref() {
        Some(cached) => match cached.fresh(ttl) {
            Some(items) => Lookup::Fresh(items),
            None => Lookup::Stale(cached.items.clone(), cached.cached_at.elapsed()),
        },
        None => Lookup::Missing,
    }
}

/// Product catalog served to the site.
///
/// Collections fetched from the backend are memoized for `ttl` (forever when
/// unset). When the backend fails or has nothing, answers are derived from
/// whatever is at hand: an expired snapshot of an earlier backend answer,
/// then data derived from it, and finally the static [`FallbackCatalog`].
/// Fallback answers are never memoized, so the next call retries the backend.
pub struct Catalog {
    source: Arc<dyn CatalogSource>,
    fallback: FallbackCatalog,
    ttl: Option<Duration>,
    products: RwLock<Option<Cached<Product>>>,
    categories: RwLock<Option<Cached<ProductCategory>>>,
}

impl Catalog {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        fallback: FallbackCatalog,
        ttl: Option<Duration>,
    ) -> Self {
        Self {
            source,
            fallback,
            ttl,
            products: RwLock::new(None),
            categories: RwLock::new(None),
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub async fn products(&self) -> Arc<Vec<Product>> {
        let stale = match lookup(&self.products, self.ttl).await {
            Lookup::Fresh(products) => return products,
            Lookup::Stale(products, age) => Some((products, age)),
            Lookup::Missing => None,
        };
        match self.source.list_products().await {
            Ok(products) if !products.is_empty() => {
                log::info!(
                    "Loaded {} products from {}",
                    products.len(),
                    self.source.name()
                );
                let cached = Cached::new(products);
                let items = cached.items.clone();
                *self.products.write().await = Some(cached);
                return items;
            }
            Ok(_) => log::warn!("{} returned no products", self.source.name()),
            Err(err) => log::error!("Unable to load products: {err:?}"),
        }
        if let Some((products, age)) = stale {
            log::warn!(
                "Serving {} stale products cached {}s ago",
                products.len(),
                age.as_secs()
            );
            return products;
        }
        log::warn!("Serving fallback catalog products");
        Arc::new(self.fallback.products.clone())
    }

    pub async fn categories(&self) -> Arc<Vec<ProductCategory>> {
        let stale = match lookup(&self.categories, self.ttl).await {
            Lookup::Fresh(categories) => return categories,
            Lookup::Stale(categories, age) => Some((categories, age)),
            Lookup::Missing => None,
        };
        match self
            .source
            .categories()
            .await
            .log_error("Unable to load categories")
        {
            Some(categories) if !categories.is_empty() => {
                let cached = Cached::new(categories);
                let items = cached.items.clone();
                *self.categories.write().await = Some(cached);
                return items;
            }
            _ => (),
        }
        if let Some((categories, age)) = stale {
            log::warn!(
                "Serving {} stale categories cached {}s ago",
                categories.len(),
                age.as_secs()
            );
            return categories;
        }
        let derived = derive_categories(self.products().await.iter(), &self.fallback.categories);
        if !derived.is_empty() {
            log::warn!("Serving {} categories derived from products", derived.len());
            return Arc::new(derived);
        }
        Arc::new(self.fallback.categories.clone())
    }

    pub async fn featured_products(&self) -> Vec<Product> {
        match self
            .source
            .featured_products()
            .await
            .log_error("Unable to load featured products")
        {
            Some(featured) if !featured.is_empty() => featured,
            _ => self
                .products()
                .await
                .iter()
                .take(FEATURED_FALLBACK_COUNT)
                .cloned()
                .collect(),
        }
    }

    pub async fn product_by_slug(&self, slug: &str) -> Option<Product> {
        match self.source.product_by_slug(slug).await {
            Ok(product) => product,
            Err(err) => {
                log::error!("Unable to load product {slug}: {err:?}");
                self.products()
                    .await
                    .iter()
                    .find(|p| p.slug == slug)
                    .cloned()
            }
        }
    }

    /// Related products in order of preference: the backend's own relations,
    /// products sharing a category, then any other products.
    pub async fn related_products(&self, slug: &str) -> Vec<RelatedProduct> {
        let current = match self.source.related_products(slug).await {
            Ok(Some(related)) if !related.is_empty() => {
                return related.into_iter().take(MAX_RELATED).collect();
            }
            Ok(Some(_)) => self.product_by_slug(slug).await,
            Ok(None) => None,
            Err(err) => {
                log::error!("Unable to load related products for {slug}: {err:?}");
                self.products()
                    .await
                    .iter()
                    .find(|p| p.slug == slug)
                    .cloned()
            }
        };
        let products = self.products().await;
        let others = || products.iter().filter(|p| p.slug != slug);
        let Some(current) = current else {
            return others()
                .take(UNKNOWN_PRODUCT_RELATED)
                .cloned()
                .map(RelatedProduct::from)
                .collect();
        };
        let same_category = others()
            .filter(|p| p.shares_category_with(&current.categories))
            .take(MAX_RELATED)
            .cloned()
            .map(RelatedProduct::from)
            .collect::<Vec<_>>();
        if !same_category.is_empty() {
            return same_category;
        }
        others()
            .take(MAX_RELATED)
            .cloned()
            .map(RelatedProduct::from)
            .collect()
    }

    pub async fn category_by_slug(&self, slug: &str) -> Option<ProductCategory> {
        self.categories()
            .await
            .iter()
            .find(|c| c.matches_slug(slug))
            .cloned()
    }

    pub async fn products_by_category(&self, slug: &str) -> Vec<Product> {
        let Some(category) = self.category_by_slug(slug).await else {
            return vec![];
        };
        match self.source.products_by_category(&category).await {
            Ok(products) => products,
            Err(err) => {
                log::error!("Unable to load products of category {slug}: {err:?}");
                self.products()
                    .await
                    .iter()
                    .filter(|p| p.in_category(&category.id))
                    .cloned()
                    .collect()
            }
        }
    }

    pub async fn search_products(&self, query: &str) -> Vec<Product> {
        match self.source.search_products(query).await {
            Ok(products) => products,
            Err(err) => {
                log::error!("Remote search for {query:?} failed, searching locally: {err:?}");
                let products = self.products().await;
                search::search(products.iter(), query, products.len())
                    .into_iter()
                    .cloned()
                    .collect()
            }
        }
    }

    pub async fn banners(&self, placement: &str) -> Vec<Banner> {
        self.source
            .banners(placement)
            .await
            .log_error("Unable to load banners")
            .unwrap_or_default()
    }

    pub async fn homepage_banners(&self) -> Vec<Banner> {
        self.banners(HOMEPAGE_HERO).await
    }

    pub async fn track_banner_impression(&self, id: &str) {
        self.track_banner(id, BannerEvent::Impression).await
    }

    pub async fn track_banner_click(&self, id: &str) {
        self.track_banner(id, BannerEvent::Click).await
    }

    async fn track_banner(&self, id: &str, event: BannerEvent) {
        self.source
            .track_banner(id, event)
            .await
            .log_error(&format!("Unable to track banner {event} for {id}"));
    }

    pub async fn invalidate(&self) {
        *self.products.write().await = None;
        *self.categories.write().await = None;
        log::info!("Catalog cache invalidated");
    }
}
