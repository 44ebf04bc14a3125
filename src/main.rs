use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use turnstile::config::{LogFormat, LoggingConfig, TurnstileConfig};
use turnstile::http::HttpServer;
use turnstile::ratelimit::{spawn_sweeper, RateLimiter};

/// Fixed-window admission control for the contact endpoint.
#[derive(Parser, Debug)]
#[command(name = "turnstile", version, about)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to serve HTTP on
    #[arg(long)]
    http_addr: Option<SocketAddr>,

    /// Length of the rate limit window in milliseconds
    #[arg(long)]
    window_ms: Option<u64>,

    /// Maximum requests per client per window
    #[arg(long)]
    max_requests: Option<u64>,

    /// Seconds between sweeps of expired records (0 disables)
    #[arg(long)]
    sweep_interval_secs: Option<u64>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

impl Args {
    /// Apply command-line overrides on top of file and environment values.
    fn apply(&self, config: &mut TurnstileConfig) {
        if let Some(addr) = self.http_addr {
            config.server.http_addr = addr;
        }
        if let Some(window_ms) = self.window_ms {
            config.rate_limiting.window_ms = window_ms;
        }
        if let Some(max_requests) = self.max_requests {
            config.rate_limiting.max_requests = max_requests;
        }
        if let Some(secs) = self.sweep_interval_secs {
            config.rate_limiting.sweep_interval_secs = secs;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = TurnstileConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    init_tracing(&config.logging)?;

    info!("Starting Turnstile");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(http_addr = %config.server.http_addr, "Configuration loaded");

    // One limiter per process, shared explicitly with its consumers
    let rate_limiter = Arc::new(RateLimiter::new(config.rate_limiting.limiter_settings()));
    info!(
        window_ms = config.rate_limiting.window_ms,
        max_requests = config.rate_limiting.max_requests,
        "Rate limiter initialized"
    );

    let sweeper = config
        .rate_limiting
        .sweep_interval()
        .map(|period| spawn_sweeper(rate_limiter.clone(), period));

    let http_server = HttpServer::new(config.server.http_addr, rate_limiter);

    // Run the server with graceful shutdown on Ctrl+C
    http_server.serve_with_shutdown(shutdown_signal()).await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }

    info!("Turnstile stopped");
    Ok(())
}

/// Initialize tracing. `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }

    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
