#![allow(clippy::unwrap_used)]

use qi_types::source::CatalogSource;
use qi_woocommerce::{ProductQuery, WooClient, WooOptions, WooSource};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRODUCTS: &str = "/wp-json/wc/v3/products";
const CATEGORIES: &str = "/wp-json/wc/v3/products/categories";

fn client(server: &MockServer) -> WooClient {
    WooClient::new(
        reqwest_middleware::ClientBuilder::new(reqwest::Client::new()).build(),
        WooOptions::new(server.uri(), "ck_test".to_string(), "cs_test".to_string()),
    )
}

fn product(id: u64, slug: &str, related: &[u64]) -> Value {
    json!({
        "id": id,
        "name": slug.replace('-', " "),
        "slug": slug,
        "price": "",
        "stock_status": "instock",
        "categories": [{ "id": 7, "name": "Ácidos", "slug": "acidos" }],
        "images": [],
        "related_ids": related
    })
}

#[tokio::test]
async fn follows_total_pages_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PRODUCTS))
        .and(query_param("consumer_key", "ck_test"))
        .and(query_param("consumer_secret", "cs_test"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "100"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-WP-TotalPages", "2")
                .set_body_json(json!([product(1, "acido-sulfurico", &[])])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PRODUCTS))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-WP-TotalPages", "2")
                .set_body_json(json!([product(2, "acido-nitrico", &[])])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let products = client(&server)
        .products(&ProductQuery::default())
        .await
        .unwrap();
    assert_eq!(
        products.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![1, 2]
    );
}

#[tokio::test]
async fn related_products_come_from_related_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PRODUCTS))
        .and(query_param("slug", "acido-sulfurico"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([product(1, "acido-sulfurico", &[2, 3])])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PRODUCTS))
        .and(query_param("include", "2,3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            product(2, "acido-nitrico", &[]),
            product(3, "acido-clorhidrico", &[])
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PRODUCTS))
        .and(query_param("slug", "agua"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let source = WooSource::new(client(&server));
    let related = source
        .related_products("acido-sulfurico")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(related.len(), 2);
    assert_eq!(related[0].product.slug, "acido-nitrico");
    assert_eq!(
        related[0].product.price_text.as_deref(),
        Some("Consultar precio")
    );
    assert!(source.related_products("agua").await.unwrap().is_none());
}

#[tokio::test]
async fn categories_skip_uncategorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CATEGORIES))
        .and(query_param("hide_empty", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Uncategorized", "slug": "uncategorized" },
            { "id": 7, "name": "Ácidos", "slug": "acidos", "description": "<p>Corrosivos.</p>" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PRODUCTS))
        .and(query_param("category", "7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([product(1, "acido-sulfurico", &[])])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let source = WooSource::new(client(&server));
    let categories = source.categories().await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].id, "acidos");
    assert_eq!(categories[0].wordpress_id, Some(7));
    let products = source.products_by_category(&categories[0]).await.unwrap();
    assert_eq!(products[0].categories, vec!["acidos"]);
}

#[tokio::test]
async fn http_errors_are_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PRODUCTS))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "woocommerce_rest_cannot_view"
        })))
        .mount(&server)
        .await;

    let source = WooSource::new(client(&server));
    assert!(source.list_products().await.is_err());
    assert!(source.search_products("soda").await.is_err());
}
