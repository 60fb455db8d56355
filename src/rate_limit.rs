use actix_web::HttpRequest;
use derive_more::{Display, Error};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct RateLimitEntry {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window request counter keyed by client.
pub struct RateLimiter {
    entries: RwLock<HashMap<String, RateLimitEntry>>,
    max_requests: u32,
    window: Duration,
}

#[derive(Debug, Display, Error)]
#[display("{message}")]
pub struct RateLimitError {
    pub retry_after: u64,
    #[error(ignore)]
    pub message: String,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub async fn check(&self, key: &str) -> Result<(), RateLimitError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.reset_at > now);

        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| RateLimitEntry {
                count: 0,
                reset_at: now + self.window,
            });
        entry.count += 1;
        if entry.count > self.max_requests {
            let retry_after = (entry.reset_at - now).as_secs().max(1);
            return Err(RateLimitError {
                retry_after,
                message: format!(
                    "Rate limit exceeded. Max {} requests per {} seconds",
                    self.max_requests,
                    self.window.as_secs()
                ),
            });
        }
        Ok(())
    }
}

pub fn client_ip(req: &HttpRequest) -> String {
    if let Some(first_ip) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first_ip.to_string();
    }
    if let Some(real_ip) = req
        .headers()
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
    {
        return real_ip.trim().to_string();
    }
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[tokio::test]
    async fn limits_per_key() {
        let limiter = RateLimiter::new(2, Duration::from_secs(600));
        assert!(limiter.check("a").await.is_ok());
        assert!(limiter.check("a").await.is_ok());
        let err = limiter.check("a").await.unwrap_err();
        assert!(err.retry_after > 0 && err.retry_after <= 600);
        assert!(limiter.check("b").await.is_ok());
    }

    #[tokio::test]
    async fn window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        assert!(limiter.check("a").await.is_ok());
        assert!(limiter.check("a").await.is_err());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.check("a").await.is_ok());
    }

    #[test]
    fn prefers_forwarded_headers() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "203.0.113.7, 10.0.0.1"))
            .insert_header(("x-real-ip", "10.0.0.2"))
            .to_http_request();
        assert_eq!(client_ip(&req), "203.0.113.7");

        let req = TestRequest::default()
            .insert_header(("x-real-ip", "10.0.0.2"))
            .to_http_request();
        assert_eq!(client_ip(&req), "10.0.0.2");

        let req = TestRequest::default()
            .peer_addr("192.0.2.1:4000".parse().unwrap())
            .to_http_request();
        assert_eq!(client_ip(&req), "192.0.2.1");
    }
}
