// middleware/rate_limit.rs - per-address token bucket throttle
use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::warn;

use crate::app::AppState;
use crate::error::ApiError;

pub const UNKNOWN_ADDRESS_MESSAGE: &str = "IP出錯";
pub const THROTTLED_MESSAGE: &str = "太多請求 請稍後";

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    refreshed: Instant,
}

/// Buckets are created on first sight of an address and kept for the process lifetime.
#[derive(Debug)]
pub struct RateLimiter {
    per_second: f64,
    burst: f64,
    buckets: DashMap<IpAddr, Bucket>,
}

impl RateLimiter {
    pub fn new(per_second: f64, burst: f64) -> Self {
        Self {
            per_second,
            burst,
            buckets: DashMap::new(),
        }
    }

    /// Takes one token from the address's bucket if one is available.
    pub fn allow(&self, addr: IpAddr) -> bool {
        let now = Instant::now();
        let mut bucket = self.buckets.entry(addr).or_insert(Bucket {
            tokens: self.burst,
            refreshed: now,
        });

        let elapsed = now.saturating_duration_since(bucket.refreshed).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.per_second).min(self.burst);
        bucket.refreshed = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    pub fn tracked(&self) -> usize {
        self.buckets.len()
    }
}

pub async fn rate_limit_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let addr = match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => addr.ip(),
        None => {
            warn!("request without peer address");
            return ApiError::bad_request(UNKNOWN_ADDRESS_MESSAGE).into_response();
        }
    };

    if !state.limiter.allow(addr) {
        warn!(ip = %addr, "too many requests");
        return ApiError::too_many_requests(THROTTLED_MESSAGE).into_response();
    }
    next.run(request).await
}
