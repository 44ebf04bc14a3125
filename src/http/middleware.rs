//! Admission control middleware.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use super::error::ApiError;
use super::AppState;
use crate::ratelimit::{Clock, RateLimitStatus};

/// Identifier used when no client address can be found.
pub const UNKNOWN_CLIENT: &str = "unknown";

pub const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const X_RATELIMIT_RESET: &str = "x-ratelimit-reset";

/// Extract the client address from proxy headers
/// (`X-Forwarded-For` → `X-Real-IP` → `"unknown"`).
pub fn extract_client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

/// Rate limit middleware.
///
/// Checks the caller's quota once per request. Limited callers get a 429
/// without reaching the handler; admitted responses carry the quota state
/// in `X-RateLimit-*` headers.
pub async fn rate_limit_middleware<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    request: Request,
    next: Next,
) -> Response {
    let client = extract_client_ip(request.headers());
    let status = state.limiter.check_rate_limit(&client);
    let limit = state.limiter.settings().max_requests;

    if status.limited {
        let retry_after_secs = status.retry_after_secs(state.limiter.clock().now_ms());
        warn!(
            client = %client,
            retry_after_secs = retry_after_secs,
            path = %request.uri().path(),
            "Rejecting rate limited request"
        );
        let mut response = ApiError::TooManyRequests { retry_after_secs }.into_response();
        insert_quota_headers(response.headers_mut(), limit, &status);
        return response;
    }

    debug!(
        client = %client,
        remaining = status.remaining,
        "Request admitted"
    );

    let mut response = next.run(request).await;
    insert_quota_headers(response.headers_mut(), limit, &status);
    response
}

fn insert_quota_headers(headers: &mut HeaderMap, limit: u64, status: &RateLimitStatus) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(status.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(status.reset_time));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn test_forwarded_for_single() {
        let map = headers(&[("x-forwarded-for", "192.168.1.1")]);
        assert_eq!(extract_client_ip(&map), "192.168.1.1");
    }

    #[test]
    fn test_forwarded_for_chain_uses_first_hop() {
        let map = headers(&[("x-forwarded-for", "10.0.0.1, 172.16.0.1, 192.168.1.1")]);
        assert_eq!(extract_client_ip(&map), "10.0.0.1");
    }

    #[test]
    fn test_real_ip_fallback() {
        let map = headers(&[("x-real-ip", "203.0.113.9")]);
        assert_eq!(extract_client_ip(&map), "203.0.113.9");
    }

    #[test]
    fn test_empty_forwarded_for_falls_through() {
        let map = headers(&[("x-forwarded-for", " "), ("x-real-ip", "203.0.113.9")]);
        assert_eq!(extract_client_ip(&map), "203.0.113.9");
    }

    #[test]
    fn test_missing_headers_use_sentinel() {
        assert_eq!(extract_client_ip(&HeaderMap::new()), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_quota_headers() {
        let mut map = HeaderMap::new();
        let status = RateLimitStatus {
            limited: false,
            remaining: 3,
            reset_time: 1_700_000_900_000,
        };

        insert_quota_headers(&mut map, 5, &status);

        assert_eq!(map[X_RATELIMIT_LIMIT], "5");
        assert_eq!(map[X_RATELIMIT_REMAINING], "3");
        assert_eq!(map[X_RATELIMIT_RESET], "1700000900000");
    }
}
