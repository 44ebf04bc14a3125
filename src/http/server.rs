//! HTTP server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use super::{router, AppState};
use crate::error::{Result, TurnstileError};
use crate::ratelimit::{Clock, RateLimiter, SystemClock};

/// HTTP server for the contact endpoint.
pub struct HttpServer<C: Clock + 'static = SystemClock> {
    /// Address to bind to
    addr: SocketAddr,
    /// The rate limiter instance
    rate_limiter: Arc<RateLimiter<C>>,
}

impl<C: Clock + 'static> HttpServer<C> {
    /// Create a new HTTP server around a shared rate limiter.
    pub fn new(addr: SocketAddr, rate_limiter: Arc<RateLimiter<C>>) -> Self {
        Self { addr, rate_limiter }
    }

    /// Start the HTTP server.
    ///
    /// This method will block until the server is shut down.
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending::<()>()).await
    }

    /// Start the HTTP server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let settings = self.rate_limiter.settings();

        info!(
            addr = %local_addr,
            window_ms = settings.window_ms,
            max_requests = settings.max_requests,
            "Starting HTTP server"
        );

        let app = router(AppState::new(self.rate_limiter));

        axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP server failed");
                TurnstileError::Server(e.to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_server_creation() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let rate_limiter = Arc::new(RateLimiter::default());
        let _server = HttpServer::new(addr, rate_limiter);
    }

    #[tokio::test]
    async fn test_serve_stops_on_signal() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let server = HttpServer::new(addr, Arc::new(RateLimiter::default()));

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            server.serve_with_shutdown(async {}),
        )
        .await;

        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = occupied.local_addr().unwrap();
        let server = HttpServer::new(addr, Arc::new(RateLimiter::default()));

        let result = server.serve_with_shutdown(async {}).await;
        assert!(matches!(result, Err(TurnstileError::Io(_))));
    }
}
