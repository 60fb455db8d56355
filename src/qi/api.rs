use anyhow::{anyhow, Context as AnyhowContext};
use qi_types::{de_id, de_ids, de_null_default, de_opt_id, PhysicalState};
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "https://oregonchem-backend.onrender.com/api/qi";

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct QiImage {
    #[serde(deserialize_with = "de_null_default")]
    pub url: String,
    #[serde(deserialize_with = "de_null_default")]
    pub alt: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct QiPresentation {
    #[serde(rename = "_id", deserialize_with = "de_id")]
    pub id: String,
    #[serde(deserialize_with = "de_null_default")]
    pub qty: f64,
    #[serde(deserialize_with = "de_null_default")]
    pub unit: String,
    #[serde(deserialize_with = "de_null_default")]
    pub pretty: String,
    pub image: Option<QiImage>,
    #[serde(deserialize_with = "de_null_default")]
    pub sort_order: i64,
    #[serde(deserialize_with = "de_null_default")]
    pub product_count: u64,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct QiCategory {
    #[serde(rename = "_id", deserialize_with = "de_id")]
    pub id: String,
    #[serde(deserialize_with = "de_null_default")]
    pub name: String,
    #[serde(deserialize_with = "de_null_default")]
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<QiImage>,
    #[serde(deserialize_with = "de_opt_id")]
    pub parent_id: Option<String>,
    pub product_count: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QiStatus {
    #[default]
    Draft,
    Published,
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct QiRelation {
    #[serde(deserialize_with = "de_id")]
    pub product_id: String,
    pub reason: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct QiSeo {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "de_null_default")]
    pub keywords: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct QiMedia {
    pub hero: Option<QiImage>,
    #[serde(deserialize_with = "de_null_default")]
    pub gallery: Vec<QiImage>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct QiAi {
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub physical_state_reasoning: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct QiProduct {
    #[serde(rename = "_id", deserialize_with = "de_id")]
    pub id: String,
    pub source_id: Option<u64>,
    #[serde(deserialize_with = "de_null_default")]
    pub title: String,
    #[serde(deserialize_with = "de_null_default")]
    pub slug: String,
    pub sku: Option<String>,
    #[serde(deserialize_with = "de_null_default")]
    pub status: QiStatus,
    #[serde(deserialize_with = "de_null_default")]
    pub featured: bool,
    #[serde(deserialize_with = "de_ids")]
    pub category_ids: Vec<String>,
    #[serde(deserialize_with = "de_ids")]
    pub presentation_ids: Vec<String>,
    #[serde(deserialize_with = "de_ids")]
    pub related_product_ids: Vec<String>,
    #[serde(deserialize_with = "de_null_default")]
    pub related_products: Vec<QiRelation>,
    #[serde(deserialize_with = "de_null_default")]
    pub tags: Vec<String>,
    #[serde(rename = "description_html")]
    pub description_html: Option<String>,
    #[serde(rename = "description_text")]
    pub description_text: Option<String>,
    #[serde(rename = "short_html")]
    pub short_html: Option<String>,
    #[serde(rename = "short_text")]
    pub short_text: Option<String>,
    #[serde(deserialize_with = "de_null_default")]
    pub seo: QiSeo,
    #[serde(deserialize_with = "de_null_default")]
    pub media: QiMedia,
    #[serde(deserialize_with = "de_null_default")]
    pub images: Vec<QiImage>,
    #[serde(deserialize_with = "de_null_default")]
    pub ai: QiAi,
    pub physical_state: Option<PhysicalState>,
    #[serde(deserialize_with = "de_null_default")]
    pub views: u64,
    #[serde(deserialize_with = "de_null_default")]
    pub searches: u64,
    #[serde(deserialize_with = "de_null_default")]
    pub total_quotes: u64,
    #[serde(deserialize_with = "de_null_default")]
    pub created_at: String,
    #[serde(deserialize_with = "de_null_default")]
    pub updated_at: String,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct QiBannerLink {
    #[serde(deserialize_with = "de_null_default")]
    pub url: String,
    #[serde(deserialize_with = "de_null_default")]
    pub open_in_new_tab: bool,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct QiBannerOverlay {
    #[serde(deserialize_with = "de_null_default")]
    pub title: String,
    #[serde(deserialize_with = "de_null_default")]
    pub subtitle: String,
    #[serde(deserialize_with = "de_null_default")]
    pub button_text: String,
    #[serde(deserialize_with = "de_null_default")]
    pub text_color: String,
    #[serde(deserialize_with = "de_null_default")]
    pub background_color: String,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct QiBanner {
    #[serde(rename = "_id", deserialize_with = "de_id")]
    pub id: String,
    #[serde(deserialize_with = "de_null_default")]
    pub title: String,
    #[serde(deserialize_with = "de_null_default")]
    pub image: QiImage,
    pub link: Option<QiBannerLink>,
    #[serde(deserialize_with = "de_null_default")]
    pub placement: String,
    #[serde(deserialize_with = "de_null_default")]
    pub active: bool,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(deserialize_with = "de_null_default")]
    pub sort_order: i64,
    pub overlay: Option<QiBannerOverlay>,
    #[serde(deserialize_with = "de_null_default")]
    pub impressions: u64,
    #[serde(deserialize_with = "de_null_default")]
    pub clicks: u64,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Pagination {
    #[serde(deserialize_with = "de_null_default")]
    pub page: u64,
    #[serde(deserialize_with = "de_null_default")]
    pub limit: u64,
    #[serde(deserialize_with = "de_null_default")]
    pub total: u64,
    #[serde(deserialize_with = "de_null_default")]
    pub pages: u64,
}

#[derive(Deserialize, Debug)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

impl ProductQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![];
        if let Some(category) = &self.category {
            params.push(("category", category.clone()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(featured) = self.featured {
            params.push(("featured", featured.to_string()));
        }
        if let Some(status) = &self.status {
            params.push(("status", status.clone()));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            params.push(("limit", limit.to_string()));
        }
        if let Some(page) = self.page.filter(|p| *p > 0) {
            params.push(("page", page.to_string()));
        }
        params
    }
}

/// Thin client over the QI REST API. Every successful response is wrapped in
/// `{ success, data, pagination? }`; `success: false` is treated as "no data".
#[derive(Clone)]
pub struct QiClient {
    client: ClientWithMiddleware,
    base: String,
}

impl QiClient {
    pub fn new<S: Into<String>>(client: ClientWithMiddleware, base: S) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        log::info!("QI API base URL: {base}");
        Self { client, base }
    }

    fn url(&self, segments: &[&str], params: &[(&str, String)]) -> Result<url::Url, anyhow::Error> {
        let mut url = url::Url::parse(&self.base).context(format!("Invalid QI API URL {}", self.base))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("QI API URL {} cannot be a base", self.base))?
            .pop_if_empty()
            .extend(segments);
        let params = params
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .collect::<Vec<_>>();
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, String)],
    ) -> Result<Option<T>, anyhow::Error> {
        let url = self.url(segments, params)?;
        let endpoint = url.path().to_string();
        log::debug!("Fetching from QI API: {url}");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context(format!("QI API request failed for {endpoint}"))?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            log::warn!("QI API request failed ({status}) for {endpoint}");
            return Ok(None);
        }
        if !status.is_success() {
            log::warn!("QI API request failed ({status}) for {endpoint}");
            return Err(anyhow!("QI API request failed ({status}) for {endpoint}"));
        }
        let body = resp.bytes().await?;
        let envelope: Envelope<T> = serde_json::from_slice(&body)
            .context(format!("Unable to decode QI API response for {endpoint}"))?;
        if let Some(p) = &envelope.pagination {
            log::debug!(
                "QI API {endpoint}: page {}/{} ({} total)",
                p.page,
                p.pages,
                p.total
            );
        }
        if !envelope.success {
            log::warn!("QI API response for {endpoint}: FAILED");
            return Ok(None);
        }
        Ok(envelope.data)
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, String)],
    ) -> Result<Vec<T>, anyhow::Error> {
        Ok(self.fetch(segments, params).await?.unwrap_or_default())
    }

    async fn post(&self, segments: &[&str]) -> Result<(), anyhow::Error> {
        let url = self.url(segments, &[])?;
        self.client
            .post(url.clone())
            .send()
            .await
            .context(format!("QI API request failed for {}", url.path()))?
            .error_for_status()?;
        Ok(())
    }

    pub async fn products(&self, query: &ProductQuery) -> Result<Vec<QiProduct>, anyhow::Error> {
        self.fetch_list(&["products"], &query.params()).await
    }

    pub async fn product_by_slug(&self, slug: &str) -> Result<Option<QiProduct>, anyhow::Error> {
        self.fetch(&["products", "slug", slug], &[]).await
    }

    pub async fn product_by_id(&self, id: &str) -> Result<Option<QiProduct>, anyhow::Error> {
        self.fetch(&["products", id], &[]).await
    }

    pub async fn featured_products(&self) -> Result<Vec<QiProduct>, anyhow::Error> {
        self.fetch_list(&["products", "featured"], &[]).await
    }

    pub async fn related_products(&self, product_id: &str) -> Result<Vec<QiProduct>, anyhow::Error> {
        self.fetch_list(&["products", product_id, "related"], &[]).await
    }

    pub async fn categories(&self, include_count: bool) -> Result<Vec<QiCategory>, anyhow::Error> {
        let params = if include_count {
            vec![("includeCount", "true".to_string())]
        } else {
            vec![]
        };
        self.fetch_list(&["categories"], &params).await
    }

    pub async fn category_by_slug(&self, slug: &str) -> Result<Option<QiCategory>, anyhow::Error> {
        self.fetch(&["categories", "slug", slug], &[]).await
    }

    pub async fn category_products(
        &self,
        category_id: &str,
        limit: Option<u32>,
        page: Option<u32>,
    ) -> Result<Vec<QiProduct>, anyhow::Error> {
        let query = ProductQuery {
            limit,
            page,
            ..Default::default()
        };
        self.fetch_list(&["categories", category_id, "products"], &query.params())
            .await
    }

    pub async fn presentations(&self) -> Result<Vec<QiPresentation>, anyhow::Error> {
        self.fetch_list(&["presentations"], &[]).await
    }

    pub async fn presentation_products(
        &self,
        presentation_id: &str,
    ) -> Result<Vec<QiProduct>, anyhow::Error> {
        self.fetch_list(&["presentations", presentation_id, "products"], &[])
            .await
    }

    pub async fn active_banners(&self, placement: &str) -> Result<Vec<QiBanner>, anyhow::Error> {
        self.fetch_list(&["banners", "active", placement], &[]).await
    }

    pub async fn track_banner_impression(&self, banner_id: &str) -> Result<(), anyhow::Error> {
        self.post(&["banners", banner_id, "impression"]).await
    }

    pub async fn track_banner_click(&self, banner_id: &str) -> Result<(), anyhow::Error> {
        self.post(&["banners", banner_id, "click"]).await
    }
}
