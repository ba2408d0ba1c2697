mod config;
mod errors;
mod explore;
mod feed;
mod models;
mod placement;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, PostBackend};
use crate::feed::{PostSource, RestPostSource, StaticPostSource};
use crate::placement::{HttpDimensionProbe, PlacementConfig};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Explore API v{}", env!("CARGO_PKG_VERSION"));

    // Post source: hosted store, or a fixture file for offline runs
    let posts: Arc<dyn PostSource> = match &config.posts {
        PostBackend::Rest { url, api_key } => {
            info!("Post source: {url} (limit {})", config.feed_limit);
            Arc::new(RestPostSource::new(url, api_key.clone(), config.feed_limit))
        }
        PostBackend::Fixture(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Could not read post fixture {}", path.display()))?;
            let source = StaticPostSource::from_json(&raw)?.with_limit(config.feed_limit);
            info!(
                "Post source: fixture {} ({} posts, limit {})",
                path.display(),
                source.len(),
                config.feed_limit
            );
            Arc::new(source)
        }
    };

    // Image dimension probe
    let probe = HttpDimensionProbe::new(Duration::from_secs(config.probe_timeout_secs))?;
    info!(
        "Dimension probe initialized (timeout {}s)",
        config.probe_timeout_secs
    );

    let placement = PlacementConfig::default();
    info!(
        "Placement config: padding {} spacing {} ring capacity {}..={}",
        placement.padding, placement.min_spacing, placement.min_per_ring, placement.max_per_ring
    );

    let state = AppState {
        posts,
        probe: Arc::new(probe),
        placement,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
