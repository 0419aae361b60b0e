// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use quizdeck::ai::{GeminiClient, QuestionGenerator};
use quizdeck::catalog::{CatalogStore, refresh::spawn_refresher};
use quizdeck::config::Config;
use quizdeck::engine::registry::spawn_sweeper;
use quizdeck::routes;
use quizdeck::state::AppState;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Load the quiz catalog
    let catalog = Arc::new(CatalogStore::open(&config.catalog_path).await?);
    spawn_refresher(catalog.clone(), config.catalog_refresh);

    // Optional question generator
    let generator: Option<Arc<dyn QuestionGenerator>> = match GeminiClient::from_config(&config)? {
        Some(client) => {
            tracing::info!(model = %client.model(), "Gemini question generation enabled");
            Some(Arc::new(client))
        }
        None => {
            tracing::info!("GEMINI_API_KEY not set; question generation disabled");
            None
        }
    };

    let port = config.port;
    let idle_ttl = config.session_idle_ttl;

    // Create AppState
    let state = AppState::new(config, catalog, generator)?;
    spawn_sweeper(state.sessions.clone(), idle_ttl);

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Start the server
    axum::serve(listener, app).await?;
    Ok(())
}
