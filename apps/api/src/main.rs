mod config;
mod dmed;
mod errors;
mod layout;
mod render;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::dmed::session::SessionStore;
use crate::render::header_image::{source_from_location, HeaderImageHandle};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("dmed_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting DMED API v{}", env!("CARGO_PKG_VERSION"));

    // Start loading the header image; declarations wait on it
    let source = source_from_location(&config.header_image)
        .with_context(|| format!("invalid HEADER_IMAGE '{}'", config.header_image))?;
    info!("Loading header image from {}", source.describe());
    let header_image = HeaderImageHandle::spawn(source);

    info!(
        "Declarations for year {} issued by {}, {}",
        config.declaration_year, config.issuer_sector, config.issuer_city
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        sessions: SessionStore::default(),
        header_image,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
