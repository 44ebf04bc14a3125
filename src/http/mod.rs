//! HTTP boundary: admission control in front of the contact endpoint.

mod error;
mod middleware;
mod server;
mod service;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::ratelimit::{Clock, RateLimiter, SystemClock};

pub use error::ApiError;
pub use middleware::{
    extract_client_ip, rate_limit_middleware, UNKNOWN_CLIENT, X_RATELIMIT_LIMIT,
    X_RATELIMIT_REMAINING, X_RATELIMIT_RESET,
};
pub use server::HttpServer;
pub use service::{contact_handler, health_handler, ContactRequest, ContactResponse};

/// Shared state handed to every handler.
pub struct AppState<C: Clock = SystemClock> {
    /// The rate limiter guarding the contact endpoint
    pub limiter: Arc<RateLimiter<C>>,
}

impl<C: Clock> AppState<C> {
    pub fn new(limiter: Arc<RateLimiter<C>>) -> Self {
        Self { limiter }
    }
}

impl<C: Clock> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            limiter: Arc::clone(&self.limiter),
        }
    }
}

/// Build the application router.
///
/// Only `/api/contact` is rate limited; `/health` stays reachable for
/// probes regardless of the caller's quota.
pub fn router<C: Clock + 'static>(state: AppState<C>) -> Router {
    let contact = Router::new()
        .route("/api/contact", post(contact_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware::<C>,
        ));

    Router::new()
        .route("/health", get(health_handler::<C>))
        .merge(contact)
        .with_state(state)
}
