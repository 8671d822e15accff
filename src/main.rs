use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod locations;
mod market;
mod range;
mod routes;

use config::Config;
use market::entsoe::EntsoeClient;
use market::fetch::MarketFetcher;
use routes::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "entsoe_proxy=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Upstream client and the in-memory fetch cache in front of it
    let entsoe_client = Arc::new(EntsoeClient::new(&config)?);
    let fetcher = Arc::new(MarketFetcher::new(entsoe_client, config.cache_settings()));

    let bind_addr = config.bind_addr.clone();
    tracing::info!(
        "Anchoring date ranges to {} (max {} days)",
        config.app_timezone,
        config.max_date_range_days
    );

    let state = AppState {
        config: Arc::new(config),
        fetcher,
    };

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(bind_addr.as_str()).await?;
    tracing::info!("Server starting on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
