use crate::catalog::Catalog;
use crate::contact::{ContactMailer, ContactMessage, ContactRequest};
use crate::control::{ensure_api_key, ControllerError, Response};
use crate::rate_limit::{client_ip, RateLimiter};
use crate::search::{normalize_text, search_hits};
use crate::sitemap;
use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::{
    get, post,
    web::{self, Bytes, Data, Path, Query},
    HttpRequest, HttpResponse,
};
use log_error::LogError;
use qi_types::product::Product;
use serde::{Deserialize, Serialize};
use serde_json::json;

const SAMPLE_SIZE: usize = 10;

/// Settings the handlers need besides the catalog.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub contact_recipient: String,
}

/// Rate limiter dedicated to the contact form.
pub struct ContactLimiter(pub RateLimiter);

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize)]
struct ProductRef<'a> {
    id: &'a str,
    name: &'a str,
    slug: &'a str,
}

impl<'a> From<&'a Product> for ProductRef<'a> {
    fn from(p: &'a Product) -> Self {
        Self {
            id: &p.id,
            name: &p.name,
            slug: &p.slug,
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(search)
        .service(contact)
        .service(sitemap_xml)
        .service(test_products)
        .service(list_products)
        .service(featured_products)
        .service(product)
        .service(related_products)
        .service(list_categories)
        .service(category_products)
        .service(banners)
        .service(banner_impression)
        .service(banner_click)
        .service(invalidate_cache);
}

pub async fn not_found() -> Response {
    Err(ControllerError::NotFound)
}

#[get("/api/search")]
pub async fn search(catalog: Data<Catalog>, query: Query<SearchQuery>) -> Response {
    let products = catalog.products().await;
    Ok(HttpResponse::Ok().json(search_hits(&products, &query.q)))
}

#[post("/api/contact")]
pub async fn contact(
    req: HttpRequest,
    body: Bytes,
    limiter: Data<ContactLimiter>,
    mailer: Data<ContactMailer>,
    settings: Data<SiteSettings>,
) -> Response {
    limiter.0.check(&format!("contact:{}", client_ip(&req))).await?;
    let request: ContactRequest = serde_json::from_slice(&body)
        .log_error("Unable to parse contact request")
        .ok_or(ControllerError::ContactFailed)?;
    let form = request
        .validate()
        .ok_or_else(|| ControllerError::InvalidInput("Missing required fields".to_string()))?;
    let message = ContactMessage::new(&form, &settings.contact_recipient);
    mailer
        .send(&message)
        .await
        .log_error("Unable to deliver contact message")
        .ok_or(ControllerError::ContactFailed)?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[get("/sitemap.xml")]
pub async fn sitemap_xml(catalog: Data<Catalog>, settings: Data<SiteSettings>) -> Response {
    let products = catalog.products().await;
    let entries = sitemap::entries(&settings.base_url, &products);
    let xml = sitemap::render(&entries, &sitemap::today()?)?;
    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "application/xml; charset=utf-8"))
        .insert_header((CACHE_CONTROL, "public, max-age=3600"))
        .body(xml))
}

#[get("/api/test-products")]
pub async fn test_products(catalog: Data<Catalog>) -> Response {
    let products = catalog.products().await;
    let sample = products
        .iter()
        .take(SAMPLE_SIZE)
        .map(ProductRef::from)
        .collect::<Vec<_>>();
    let acido = products
        .iter()
        .filter(|p| normalize_text(&p.name).contains("acido"))
        .take(SAMPLE_SIZE)
        .map(ProductRef::from)
        .collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(json!({
        "totalProducts": products.len(),
        "sampleProducts": sample,
        "acidoCount": acido.len(),
        "acidoProducts": acido,
    })))
}

#[get("/api/products")]
pub async fn list_products(catalog: Data<Catalog>) -> Response {
    Ok(HttpResponse::Ok().json(catalog.products().await.as_slice()))
}

#[get("/api/products/featured")]
pub async fn featured_products(catalog: Data<Catalog>) -> Response {
    Ok(HttpResponse::Ok().json(catalog.featured_products().await))
}

#[get("/api/products/{slug}")]
pub async fn product(catalog: Data<Catalog>, slug: Path<String>) -> Response {
    let product = catalog
        .product_by_slug(&slug)
        .await
        .ok_or(ControllerError::NotFound)?;
    Ok(HttpResponse::Ok().json(product))
}

#[get("/api/products/{slug}/related")]
pub async fn related_products(catalog: Data<Catalog>, slug: Path<String>) -> Response {
    Ok(HttpResponse::Ok().json(catalog.related_products(&slug).await))
}

#[get("/api/categories")]
pub async fn list_categories(catalog: Data<Catalog>) -> Response {
    Ok(HttpResponse::Ok().json(catalog.categories().await.as_slice()))
}

#[get("/api/categories/{slug}/products")]
pub async fn category_products(catalog: Data<Catalog>, slug: Path<String>) -> Response {
    Ok(HttpResponse::Ok().json(catalog.products_by_category(&slug).await))
}

#[get("/api/banners/{placement}")]
pub async fn banners(catalog: Data<Catalog>, placement: Path<String>) -> Response {
    Ok(HttpResponse::Ok().json(catalog.banners(&placement).await))
}

#[post("/api/banners/{id}/impression")]
pub async fn banner_impression(catalog: Data<Catalog>, id: Path<String>) -> Response {
    catalog.track_banner_impression(&id).await;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/api/banners/{id}/click")]
pub async fn banner_click(catalog: Data<Catalog>, id: Path<String>) -> Response {
    catalog.track_banner_click(&id).await;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/api/cache/invalidate")]
pub async fn invalidate_cache(
    req: HttpRequest,
    catalog: Data<Catalog>,
    settings: Data<SiteSettings>,
) -> Response {
    ensure_api_key(&req, settings.api_key.as_deref())?;
    catalog.invalidate().await;
    Ok(HttpResponse::NoContent().finish())
}
