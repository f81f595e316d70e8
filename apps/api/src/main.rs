mod config;
mod errors;
mod matching;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::matching::backends::Backends;
use crate::matching::engine::MatchEngine;
use crate::matching::pdf::PdfExtract;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Matcher API v{}", env!("CARGO_PKG_VERSION"));

    // Load NER + embedding backends once; a failure here is fatal
    info!("Loading backends (embedding: {})", config.embedding_backend);
    let backends = Arc::new(Backends::from_settings(config.backend_settings()));
    let loaded = {
        let backends = backends.clone();
        tokio::task::spawn_blocking(move || backends.get_or_load().cloned())
            .await
            .context("backend loading task panicked")??
    };

    let engine = Arc::new(
        MatchEngine::new(&loaded, config.score_weights).context("SCORE_WEIGHTS is invalid")?,
    );
    info!(
        "Match engine ready (ner: {}, embeddings: {})",
        engine.extractor().backend_name(),
        engine.aggregator().embeddings().backend_name()
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        engine,
        pdf: Arc::new(PdfExtract),
    };

    // Build router
    // Layers are applied innermost-first: Cors wraps Trace wraps Timeout.
    let app = build_router(state)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
