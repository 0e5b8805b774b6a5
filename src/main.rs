use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;

use hypertube_info_service::auth::TokenVerifier;
use hypertube_info_service::config::AppConfig;
use hypertube_info_service::database::Database;
use hypertube_info_service::middleware::RateLimiter;
use hypertube_info_service::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Refuses to start without JWT_SECRET and DATABASE_URL
    let config = AppConfig::from_env().context("invalid configuration")?;

    let db = Database::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    let verifier = Arc::new(TokenVerifier::new(&config.security.jwt_secret));
    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit.requests as usize,
        config.rate_limit.window(),
        config.rate_limit.idle_ttl(),
    ));

    // Periodic idle-key eviction keeps limiter memory bounded
    {
        let limiter = Arc::clone(&limiter);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(limiter.idle_ttl());
            loop {
                interval.tick().await;
                limiter.sweep(Instant::now());
            }
        });
    }

    let state = AppState { db, verifier, limiter };
    let router = app(state);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Hypertube info-service listening on http://{}", bind_addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
