mod analysis;
mod config;
mod dataset;
mod errors;
mod llm_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::dataset::DatasetStore;
use crate::llm_client::GroqClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting real-estate analysis API v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Narrative client. A missing key is allowed; narration degrades per request.
    if config.groq_api_key.is_none() {
        warn!("GROQ_API_KEY not set; narratives will degrade to the sentinel message");
    }
    let narrator = Arc::new(GroqClient::new(config.groq_api_key.clone()));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Current-dataset store; empty until an upload or the first analyze,
    // which falls back to the bundled default file.
    let datasets = DatasetStore::new();
    info!("default dataset path: {}", config.default_data_path);

    let state = AppState {
        datasets,
        narrator,
        config: config.clone(),
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
