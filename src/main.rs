use actix_web::middleware::{DefaultHeaders, NormalizePath, TrailingSlash};
use actix_web::{web, web::Data, App, HttpServer};
use anyhow::Context as AnyhowContext;
use qi_catalog::{
    catalog::Catalog,
    catalog_source,
    config::{build_client, Config},
    contact::ContactMailer,
    control::{self, api::ContactLimiter, api::SiteSettings},
    fallback::FallbackCatalog,
    rate_limit::RateLimiter,
};
use std::env;

#[actix_web::main]
async fn main() -> Result<(), anyhow::Error> {
    if let Err(env::VarError::NotPresent) = env::var("RUST_LOG") {
        env::set_var("RUST_LOG", "INFO,html5ever=error");
    }
    pretty_env_logger::formatted_timed_builder()
        .parse_default_env()
        .init();

    match std::fs::File::open(".env") {
        Ok(_) => envmnt::load_file(".env")?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            std::fs::File::create(".env")?;
            envmnt::load_file(".env")?;
        }
        Err(err) => {
            return Err(anyhow::anyhow!("Unable to open .env file: {err}"));
        }
    }

    let config = Config::from_env()?;
    log::info!("Catalog backend: {}", config.backend);

    let client = build_client(&config)?;
    let source = catalog_source(&config, client.clone())?;
    let fallback = match &config.fallback_path {
        Some(path) => FallbackCatalog::load(path).await?,
        None => FallbackCatalog::embedded()?,
    };
    let catalog = Data::new(Catalog::new(source, fallback, config.cache_ttl));
    log::info!("Serving catalog from {}", catalog.source_name());

    if config.warmup {
        let catalog = catalog.clone();
        actix_rt::spawn(async move {
            let products = catalog.products().await;
            let categories = catalog.categories().await;
            log::info!(
                "Catalog warmed up: {} products, {} categories",
                products.len(),
                categories.len()
            );
        });
    }

    let settings = Data::new(SiteSettings {
        base_url: config.site_base_url.clone(),
        api_key: config.site_api_key.clone(),
        contact_recipient: config.contact.recipient.clone(),
    });
    let limiter = Data::new(ContactLimiter(RateLimiter::new(
        config.contact.rate_limit_max,
        config.contact.rate_limit_window,
    )));
    log::info!(
        "Contact form limited to {} requests per {:?}",
        limiter.0.max_requests(),
        config.contact.rate_limit_window
    );
    let mailer = Data::new(ContactMailer::new(client, config.contact.webhook_url.clone()));

    let bind_addr = config.bind_addr.clone();
    log::info!("Listening on {bind_addr}");
    HttpServer::new(move || {
        App::new()
            .wrap(
                DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
                    .add(("Access-Control-Allow-Headers", "*")),
            )
            .wrap(actix_web::middleware::Compress::default())
            .wrap(NormalizePath::new(TrailingSlash::Trim))
            .app_data(catalog.clone())
            .app_data(settings.clone())
            .app_data(limiter.clone())
            .app_data(mailer.clone())
            .configure(control::api::configure)
            .default_service(web::to(control::api::not_found))
    })
    .bind(bind_addr.as_str())
    .with_context(|| format!("Failed to bind server to {bind_addr}. Is the port already in use?"))?
    .run()
    .await?;
    Ok(())
}
