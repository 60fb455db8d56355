use anyhow::{anyhow, Context as AnyhowContext};
use async_trait::async_trait;
use derive_more::Constructor;
use itertools::Itertools;
use qi_types::category::ProductCategory;
use qi_types::product::{Product, RelatedProduct};
use qi_types::source::CatalogSource;
use qi_types::{de_null_default, id_from_value};
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub mod adapter;

pub use adapter::{adapt_category, adapt_product};

const API_PREFIX: &str = "/wp-json/wc/v3";
const PER_PAGE: usize = 100;
const MAX_PAGES: usize = 50;
const MAX_RELATED: usize = 6;
const TOTAL_PAGES_HEADER: &str = "x-wp-totalpages";

#[derive(Clone, Constructor)]
pub struct WooOptions {
    pub base_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
}

impl std::fmt::Debug for WooOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WooOptions")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct WcProduct {
    pub id: u64,
    #[serde(deserialize_with = "de_null_default")]
    pub name: String,
    #[serde(deserialize_with = "de_null_default")]
    pub slug: String,
    #[serde(deserialize_with = "de_null_default")]
    pub permalink: String,
    #[serde(deserialize_with = "de_null_default")]
    pub date_created: String,
    #[serde(deserialize_with = "de_null_default")]
    pub status: String,
    pub featured: bool,
    #[serde(deserialize_with = "de_null_default")]
    pub description: String,
    #[serde(deserialize_with = "de_null_default")]
    pub short_description: String,
    #[serde(deserialize_with = "de_null_default")]
    pub sku: String,
    #[serde(deserialize_with = "de_null_default")]
    pub price: String,
    #[serde(deserialize_with = "de_null_default")]
    pub regular_price: String,
    #[serde(deserialize_with = "de_null_default")]
    pub sale_price: String,
    pub on_sale: bool,
    pub purchasable: bool,
    #[serde(deserialize_with = "de_lenient_u64")]
    pub total_sales: u64,
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
    pub downloadable: bool,
    #[serde(deserialize_with = "de_null_default")]
    pub external_url: String,
    #[serde(deserialize_with = "de_null_default")]
    pub button_text: String,
    pub stock_quantity: Option<i64>,
    #[serde(deserialize_with = "de_null_default")]
    pub stock_status: String,
    #[serde(deserialize_with = "de_null_default")]
    pub weight: String,
    #[serde(deserialize_with = "de_null_default")]
    pub dimensions: WcDimensions,
    pub reviews_allowed: bool,
    #[serde(deserialize_with = "de_null_default")]
    pub average_rating: String,
    pub rating_count: u64,
    #[serde(deserialize_with = "de_null_default")]
    pub related_ids: Vec<u64>,
    #[serde(deserialize_with = "de_null_default")]
    pub upsell_ids: Vec<u64>,
    #[serde(deserialize_with = "de_null_default")]
    pub cross_sell_ids: Vec<u64>,
    #[serde(deserialize_with = "de_null_default")]
    pub purchase_note: String,
    #[serde(deserialize_with = "de_null_default")]
    pub categories: Vec<WcTerm>,
    #[serde(deserialize_with = "de_null_default")]
    pub tags: Vec<WcTerm>,
    #[serde(deserialize_with = "de_null_default")]
    pub images: Vec<WcImage>,
    #[serde(deserialize_with = "de_null_default")]
    pub attributes: Vec<WcAttribute>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct WcDimensions {
    pub length: String,
    pub width: String,
    pub height: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct WcTerm {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct WcImage {
    pub id: u64,
    pub src: String,
    #[serde(deserialize_with = "de_null_default")]
    pub name: String,
    #[serde(deserialize_with = "de_null_default")]
    pub alt: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct WcAttribute {
    pub id: u64,
    pub name: String,
    pub position: u32,
    pub visible: bool,
    pub variation: bool,
    pub options: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct WcCategory {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub parent: u64,
    #[serde(deserialize_with = "de_null_default")]
    pub description: String,
    pub image: Option<WcImage>,
    pub count: u64,
}

fn de_lenient_u64<'de, D>(de: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(de)?;
    Ok(value
        .as_ref()
        .and_then(id_from_value)
        .and_then(|v| v.parse().ok())
        .unwrap_or_default())
}

#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub slug: Option<String>,
    pub featured: Option<bool>,
    pub category: Option<u64>,
    pub search: Option<String>,
    pub include: Vec<u64>,
}

impl ProductQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("status", "publish".to_string())];
        if let Some(slug) = &self.slug {
            params.push(("slug", slug.clone()));
        }
        if let Some(featured) = self.featured {
            params.push(("featured", featured.to_string()));
        }
        if let Some(category) = self.category {
            params.push(("category", category.to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if !self.include.is_empty() {
            params.push(("include", self.include.iter().join(",")));
        }
        params
    }
}

#[derive(Clone)]
pub struct WooClient {
    client: ClientWithMiddleware,
    options: WooOptions,
}

impl WooClient {
    pub fn new(client: ClientWithMiddleware, options: WooOptions) -> Self {
        log::info!("WooCommerce API base URL: {}", options.base_url);
        Self { client, options }
    }

    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<url::Url, anyhow::Error> {
        let base = self.options.base_url.trim_end_matches('/');
        let mut url = url::Url::parse(&format!("{base}{API_PREFIX}{path}"))
            .context(format!("Invalid WooCommerce URL {base}"))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("consumer_key", &self.options.consumer_key);
            query.append_pair("consumer_secret", &self.options.consumer_secret);
            for (key, value) in params.iter().filter(|(_, v)| !v.is_empty()) {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        page: usize,
    ) -> Result<(Vec<T>, usize), anyhow::Error> {
        let mut params = params.to_vec();
        params.push(("per_page", PER_PAGE.to_string()));
        params.push(("page", page.to_string()));
        let url = self.endpoint(path, &params)?;
        log::debug!("Fetching WooCommerce {path} page {page}");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context(format!("Unable to request WooCommerce {path}"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("WooCommerce request failed ({status}) for {path}"));
        }
        let total_pages = resp
            .headers()
            .get(TOTAL_PAGES_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(1);
        let body = resp.bytes().await?;
        let items = serde_json::from_slice(&body)
            .context(format!("Unable to decode WooCommerce {path} response"))?;
        Ok((items, total_pages))
    }

    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, anyhow::Error> {
        let mut res = vec![];
        let mut page = 1;
        loop {
            let (mut items, total_pages) = self.get_page::<T>(path, params, page).await?;
            let len = items.len();
            res.append(&mut items);
            if len == 0 || page >= total_pages.min(MAX_PAGES) {
                break;
            }
            page += 1;
        }
        Ok(res)
    }

    pub async fn products(&self, query: &ProductQuery) -> Result<Vec<WcProduct>, anyhow::Error> {
        self.get_all("/products", &query.params()).await
    }

    pub async fn categories(&self) -> Result<Vec<WcCategory>, anyhow::Error> {
        self.get_all("/products/categories", &[("hide_empty", "true".to_string())])
            .await
    }
}

pub struct WooSource {
    client: WooClient,
}

impl WooSource {
    pub fn new(client: WooClient) -> Self {
        Self { client }
    }

    async fn fetch(&self, query: ProductQuery) -> Result<Vec<Product>, anyhow::Error> {
        Ok(self
            .client
            .products(&query)
            .await?
            .into_iter()
            .map(adapt_product)
            .collect())
    }
}

#[async_trait]
impl CatalogSource for WooSource {
    fn name(&self) -> &'static str {
        "woocommerce"
    }

    async fn list_products(&self) -> Result<Vec<Product>, anyhow::Error> {
        self.fetch(ProductQuery::default()).await
    }

    async fn featured_products(&self) -> Result<Vec<Product>, anyhow::Error> {
        self.fetch(ProductQuery {
            featured: Some(true),
            ..Default::default()
        })
        .await
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, anyhow::Error> {
        Ok(self
            .client
            .products(&ProductQuery {
                slug: Some(slug.to_string()),
                ..Default::default()
            })
            .await?
            .into_iter()
            .next()
            .map(adapt_product))
    }

    async fn related_products(
        &self,
        slug: &str,
    ) -> Result<Option<Vec<RelatedProduct>>, anyhow::Error> {
        let current = self
            .client
            .products(&ProductQuery {
                slug: Some(slug.to_string()),
                ..Default::default()
            })
            .await?
            .into_iter()
            .next();
        let Some(current) = current else {
            return Ok(None);
        };
        let include = current
            .related_ids
            .iter()
            .copied()
            .take(MAX_RELATED)
            .collect::<Vec<_>>();
        if include.is_empty() {
            return Ok(Some(vec![]));
        }
        let related = self
            .fetch(ProductQuery {
                include,
                ..Default::default()
            })
            .await?;
        Ok(Some(
            related
                .into_iter()
                .take(MAX_RELATED)
                .map(RelatedProduct::from)
                .collect(),
        ))
    }

    async fn categories(&self) -> Result<Vec<ProductCategory>, anyhow::Error> {
        Ok(self
            .client
            .categories()
            .await?
            .into_iter()
            .filter(|c| !adapter::is_uncategorized(&c.slug))
            .map(adapt_category)
            .collect())
    }

    async fn products_by_category(
        &self,
        category: &ProductCategory,
    ) -> Result<Vec<Product>, anyhow::Error> {
        match category.wordpress_id {
            Some(id) => {
                self.fetch(ProductQuery {
                    category: Some(id),
                    ..Default::default()
                })
                .await
            }
            None => Ok(self
                .list_products()
                .await?
                .into_iter()
                .filter(|p| p.in_category(&category.id))
                .collect()),
        }
    }

    async fn search_products(&self, query: &str) -> Result<Vec<Product>, anyhow::Error> {
        self.fetch(ProductQuery {
            search: Some(query.to_string()),
            ..Default::default()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_skip_unset_fields() {
        let q = ProductQuery {
            featured: Some(true),
            include: vec![3, 5],
            ..Default::default()
        };
        assert_eq!(
            q.params(),
            vec![
                ("status", "publish".to_string()),
                ("featured", "true".to_string()),
                ("include", "3,5".to_string()),
            ]
        );
    }

    #[test]
    fn decodes_nulls_and_string_counters() {
        let p: WcProduct = serde_json::from_str(
            r#"{"id":12,"name":"Ácido cítrico","slug":"acido-citrico","sku":null,
                "date_created":null,"total_sales":"14","stock_quantity":null,
                "dimensions":{"length":"","width":"","height":""}}"#,
        )
        .unwrap();
        assert_eq!(p.total_sales, 14);
        assert_eq!(p.sku, "");
        assert_eq!(p.stock_quantity, None);
    }

    #[test]
    fn endpoint_carries_credentials() {
        let client = WooClient::new(
            reqwest_middleware::ClientBuilder::new(reqwest::Client::new()).build(),
            WooOptions::new(
                "https://shop.example/".to_string(),
                "ck_1".to_string(),
                "cs_2".to_string(),
            ),
        );
        let url = client
            .endpoint("/products", &[("search", "soda".to_string()), ("slug", String::new())])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://shop.example/wp-json/wc/v3/products?consumer_key=ck_1&consumer_secret=cs_2&search=soda"
        );
    }
}
