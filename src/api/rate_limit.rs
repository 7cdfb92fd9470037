//! Per-IP rate limiting middleware for the trigger API
//!
//! Token-bucket limiting keyed by client IP, with configurable exempt paths
//! and exempt IPs. Distinct from [`crate::rate_limit::RateLimiter`], which
//! paces outbound provider calls.

use axum::{
    Json,
    extract::{ConnectInfo, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::Instant,
};
use tokio::sync::Mutex;

use crate::config::RateLimitConfig;
use crate::error::ApiError;

/// Simple token bucket
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    rate: f64,
    capacity: u32,
}

impl TokenBucket {
    fn new(rate: f64, capacity: u32) -> Self {
        Self {
            tokens: capacity as f64,
            last_refill: Instant::now(),
            rate,
            capacity,
        }
    }

    /// Consume one token, or return the seconds until one is available
    fn try_consume(&mut self) -> Option<u64> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity as f64);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            None
        } else {
            let wait_secs = ((1.0 - self.tokens) / self.rate).ceil() as u64;
            Some(wait_secs)
        }
    }
}

/// Rate limiter with per-IP tracking
pub struct IpRateLimiter {
    buckets: Mutex<HashMap<IpAddr, TokenBucket>>,
    config: RateLimitConfig,
}

impl IpRateLimiter {
    /// Create a new rate limiter from configuration
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            config,
        }
    }

    fn is_path_exempt(&self, path: &str) -> bool {
        self.config
            .exempt_paths
            .iter()
            .any(|exempt| path == exempt || path.starts_with(exempt))
    }

    fn is_ip_exempt(&self, addr: &SocketAddr) -> bool {
        self.config.exempt_ips.contains(&addr.ip())
    }

    /// Check a request; `Some(wait)` means it should be rejected
    pub async fn check(&self, path: &str, addr: SocketAddr) -> Option<u64> {
        if self.is_path_exempt(path) || self.is_ip_exempt(&addr) {
            return None;
        }

        // Lock scope covers try_consume; the bucket is mutated in place
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets.entry(addr.ip()).or_insert_with(|| {
            TokenBucket::new(
                self.config.requests_per_second as f64,
                self.config.burst_size,
            )
        });
        bucket.try_consume()
    }
}

/// Rate limiting middleware function
pub async fn rate_limit_middleware(
    axum::extract::State(limiter): axum::extract::State<Arc<IpRateLimiter>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: axum::middleware::Next,
) -> Response {
    match limiter.check(req.uri().path(), addr).await {
        None => next.run(req).await,
        Some(retry_after) => {
            tracing::warn!(ip = %addr.ip(), path = req.uri().path(), "Rate limit exceeded");
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ApiError::new("rate_limited", "too many requests")),
            )
                .into_response();
            if let Ok(value) = retry_after.to_string().parse() {
                response
                    .headers_mut()
                    .insert(axum::http::header::RETRY_AFTER, value);
            }
            response
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn addr(last_octet: u8) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::new(10, 0, 0, last_octet), 40000))
    }

    fn strict_config() -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            requests_per_second: 1,
            burst_size: 2,
            exempt_paths: vec!["/api/v1/health".to_string()],
            exempt_ips: vec![IpAddr::V4(Ipv4Addr::LOCALHOST)],
        }
    }

    #[tokio::test]
    async fn burst_is_allowed_then_excess_rejected() {
        let limiter = IpRateLimiter::new(strict_config());

        assert!(limiter.check("/api/v1/generate", addr(1)).await.is_none());
        assert!(limiter.check("/api/v1/generate", addr(1)).await.is_none());

        let wait = limiter.check("/api/v1/generate", addr(1)).await;
        assert!(wait.is_some(), "third request within the burst window");
        assert!(wait.unwrap() >= 1);
    }

    #[tokio::test]
    async fn buckets_are_tracked_per_ip() {
        let limiter = IpRateLimiter::new(strict_config());

        limiter.check("/api/v1/generate", addr(1)).await;
        limiter.check("/api/v1/generate", addr(1)).await;
        assert!(limiter.check("/api/v1/generate", addr(1)).await.is_some());

        // A different client still has its full burst
        assert!(limiter.check("/api/v1/generate", addr(2)).await.is_none());
    }

    #[tokio::test]
    async fn exempt_path_is_never_limited() {
        let limiter = IpRateLimiter::new(strict_config());

        for _ in 0..10 {
            assert!(limiter.check("/api/v1/health", addr(1)).await.is_none());
        }
    }

    #[tokio::test]
    async fn exempt_ip_is_never_limited() {
        let limiter = IpRateLimiter::new(strict_config());
        let localhost = SocketAddr::from((Ipv4Addr::LOCALHOST, 40000));

        for _ in 0..10 {
            assert!(limiter.check("/api/v1/generate", localhost).await.is_none());
        }
    }
}
