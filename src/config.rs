use anyhow::{anyhow, Context};
use derive_more::Display;
use qi_woocommerce::WooOptions;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_SITE_BASE_URL: &str = "https://www.quimicaindustrial.pe";
pub const DEFAULT_CONTACT_RECIPIENT: &str = "ventas@quimicaindustrial.pe";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONTACT_RATE_LIMIT_MAX: u32 = 5;
const DEFAULT_CONTACT_RATE_LIMIT_WINDOW_SECS: u64 = 600;
static DEFAULT_ACCEPT_ENCODING: &str = "br;q=1.0, gzip;q=0.6, deflate;q=0.4, *;q=0.2";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum Backend {
    #[default]
    #[display("qi")]
    Qi,
    #[display("woocommerce")]
    WooCommerce,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "qi" | "mongo" | "mongodb" => Ok(Self::Qi),
            "woocommerce" | "woo" | "wc" => Ok(Self::WooCommerce),
            other => Err(anyhow!("Unknown catalog backend {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContactConfig {
    pub webhook_url: Option<String>,
    pub recipient: String,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub qi_api_url: String,
    pub woocommerce: Option<WooOptions>,
    pub bind_addr: String,
    pub cache_ttl: Option<Duration>,
    pub fallback_path: Option<String>,
    pub warmup: bool,
    pub http_max_retries: u32,
    pub http_timeout: Duration,
    pub site_base_url: String,
    pub site_api_key: Option<String>,
    pub contact: ContactConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let parse_u64 = |key: &str, default: u64| -> Result<u64, anyhow::Error> {
            get(key)
                .map(|v| {
                    v.parse::<u64>()
                        .with_context(|| format!("Unable to parse {key}={v}"))
                })
                .transpose()
                .map(|v| v.unwrap_or(default))
        };
        let parse_u32 = |key: &str, default: u32| -> Result<u32, anyhow::Error> {
            get(key)
                .map(|v| {
                    v.parse::<u32>()
                        .with_context(|| format!("Unable to parse {key}={v}"))
                })
                .transpose()
                .map(|v| v.unwrap_or(default))
        };

        let backend = get("BACKEND")
            .map(|b| b.parse())
            .transpose()?
            .unwrap_or_default();
        let woocommerce = match (
            get("WC_API_URL"),
            get("WC_CONSUMER_KEY"),
            get("WC_CONSUMER_SECRET"),
        ) {
            (Some(url), Some(key), Some(secret)) => Some(WooOptions::new(url, key, secret)),
            _ => None,
        };
        if backend == Backend::WooCommerce && woocommerce.is_none() {
            return Err(anyhow!(
                "WC_API_URL, WC_CONSUMER_KEY and WC_CONSUMER_SECRET are required for the woocommerce backend"
            ));
        }
        let cache_ttl = get("CATALOG_CACHE_TTL")
            .map(|v| parse_duration(&v))
            .transpose()?;

        Ok(Self {
            backend,
            qi_api_url: get("QI_API_URL")
                .or_else(|| get("PUBLIC_QI_API_URL"))
                .unwrap_or_else(|| crate::qi::api::DEFAULT_API_URL.to_string()),
            woocommerce,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            cache_ttl,
            fallback_path: get("CATALOG_FALLBACK_PATH"),
            warmup: flag(get("CATALOG_WARMUP").as_deref(), false),
            http_max_retries: parse_u32("HTTP_MAX_RETRIES", 0)?,
            http_timeout: Duration::from_secs(parse_u64("HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?),
            site_base_url: get("SITE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SITE_BASE_URL.to_string()),
            site_api_key: get("SITE_API_KEY"),
            contact: ContactConfig {
                webhook_url: get("CONTACT_WEBHOOK_URL"),
                recipient: get("CONTACT_RECIPIENT")
                    .unwrap_or_else(|| DEFAULT_CONTACT_RECIPIENT.to_string()),
                rate_limit_max: parse_u32("CONTACT_RATE_LIMIT_MAX", DEFAULT_CONTACT_RATE_LIMIT_MAX)?,
                rate_limit_window: Duration::from_secs(parse_u64(
                    "CONTACT_RATE_LIMIT_WINDOW_SECS",
                    DEFAULT_CONTACT_RATE_LIMIT_WINDOW_SECS,
                )?),
            },
        })
    }
}

pub fn parse_duration(duration: &str) -> Result<Duration, anyhow::Error> {
    let duration = duration.trim().to_lowercase().replace("min", "m");
    duration_str::parse(&duration).map_err(|dur| anyhow!("Unable to parse duration {dur}"))
}

pub fn flag(raw: Option<&str>, default_value: bool) -> bool {
    match raw.map(|r| r.trim().to_lowercase()) {
        Some(raw) => match raw.as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default_value,
        },
        None => default_value,
    }
}

pub fn build_client(config: &Config) -> Result<ClientWithMiddleware, anyhow::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Accept-Encoding",
        HeaderValue::from_static(DEFAULT_ACCEPT_ENCODING),
    );
    headers.insert("Accept", HeaderValue::from_static("application/json"));
    let client = reqwest::ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .timeout(config.http_timeout)
        .use_rustls_tls()
        .default_headers(headers)
        .build()
        .context("Unable to build HTTP client")?;
    let mut builder = ClientBuilder::new(client);
    if config.http_max_retries > 0 {
        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(config.http_max_retries);
        builder = builder.with(RetryTransientMiddleware::new_with_policy(retry_policy));
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let c = config(&[]).unwrap();
        assert_eq!(c.backend, Backend::Qi);
        assert_eq!(c.qi_api_url, crate::qi::api::DEFAULT_API_URL);
        assert_eq!(c.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(c.cache_ttl, None);
        assert_eq!(c.http_max_retries, 0);
        assert_eq!(c.http_timeout, Duration::from_secs(30));
        assert_eq!(c.contact.recipient, DEFAULT_CONTACT_RECIPIENT);
        assert_eq!(c.contact.rate_limit_max, 5);
        assert_eq!(c.contact.rate_limit_window, Duration::from_secs(600));
        assert!(c.woocommerce.is_none());
        assert!(!c.warmup);
    }

    #[test]
    fn public_api_url_is_a_fallback() {
        let c = config(&[("PUBLIC_QI_API_URL", "http://localhost:5000/api/qi")]).unwrap();
        assert_eq!(c.qi_api_url, "http://localhost:5000/api/qi");
        let c = config(&[
            ("PUBLIC_QI_API_URL", "http://localhost:5000/api/qi"),
            ("QI_API_URL", "http://qi.internal/api/qi"),
        ])
        .unwrap();
        assert_eq!(c.qi_api_url, "http://qi.internal/api/qi");
    }

    #[test]
    fn woocommerce_requires_credentials() {
        assert!(config(&[("BACKEND", "woocommerce")]).is_err());
        let c = config(&[
            ("BACKEND", "WooCommerce"),
            ("WC_API_URL", "https://shop.example"),
            ("WC_CONSUMER_KEY", "ck"),
            ("WC_CONSUMER_SECRET", "cs"),
        ])
        .unwrap();
        assert_eq!(c.backend, Backend::WooCommerce);
        assert_eq!(
            c.woocommerce.map(|w| w.base_url).as_deref(),
            Some("https://shop.example")
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(config(&[("BACKEND", "shopify")]).is_err());
        assert!(config(&[("HTTP_MAX_RETRIES", "many")]).is_err());
        assert!(config(&[("CATALOG_CACHE_TTL", "soon")]).is_err());
    }

    #[test]
    fn counts_out_of_u32_range_are_rejected() {
        assert!(config(&[("HTTP_MAX_RETRIES", "4294967296")]).is_err());
        assert!(config(&[("CONTACT_RATE_LIMIT_MAX", "4294967301")]).is_err());
        let c = config(&[("HTTP_MAX_RETRIES", "3"), ("CONTACT_RATE_LIMIT_MAX", "20")]).unwrap();
        assert_eq!(c.http_max_retries, 3);
        assert_eq!(c.contact.rate_limit_max, 20);
    }

    #[test]
    fn parses_durations() {
        assert_eq!(parse_duration("10m").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_duration("10min").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        let c = config(&[("CATALOG_CACHE_TTL", "30s")]).unwrap();
        assert_eq!(c.cache_ttl, Some(Duration::from_secs(30)));
    }

    #[test]
    fn flags() {
        assert!(flag(Some(" YES "), false));
        assert!(!flag(Some("off"), true));
        assert!(flag(Some("maybe"), true));
        assert!(!flag(None, false));
    }
}
