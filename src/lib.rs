#![deny(clippy::unwrap_used)]

pub mod catalog;
pub mod config;
pub mod contact;
pub mod control;
pub mod fallback;
pub mod qi;
pub mod rate_limit;
pub mod search;
pub mod sitemap;

use config::{Backend, Config};
use qi_types::source::CatalogSource;
use qi_woocommerce::{WooClient, WooSource};
use reqwest_middleware::ClientWithMiddleware;
use std::sync::Arc;

/// Builds the backend selected by `config`.
pub fn catalog_source(
    config: &Config,
    client: ClientWithMiddleware,
) -> Result<Arc<dyn CatalogSource>, anyhow::Error> {
    Ok(match config.backend {
        Backend::Qi => Arc::new(qi::QiSource::new(qi::api::QiClient::new(
            client,
            config.qi_api_url.clone(),
        ))),
        Backend::WooCommerce => {
            let options = config.woocommerce.clone().ok_or_else(|| {
                anyhow::anyhow!("WooCommerce backend selected without credentials")
            })?;
            Arc::new(WooSource::new(WooClient::new(client, options)))
        }
    })
}
