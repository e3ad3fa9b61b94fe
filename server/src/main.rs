//! Vocard server: loads settings from the environment (and `.env`), connects the table store,
//! configures the generation client and serves all routes.
//!
//! Run from repo root: `cargo run -p vocard-server`

use std::sync::Arc;
use tokio::net::TcpListener;
use vocard::{
    app, AppState, MemoryTableStore, OpenAiGenerator, PgTableStore, Settings, StorageBackend, TableStore,
    TextGenerator, UnconfiguredGenerator,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("vocard=info,vocard_server=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;

    let store: Arc<dyn TableStore> = match &settings.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory table store; data is lost on restart");
            Arc::new(MemoryTableStore::new())
        }
        StorageBackend::Postgres { url } => Arc::new(
            PgTableStore::connect(url, &settings.storage.schema, settings.storage.max_connections).await?,
        ),
    };

    let generator: Arc<dyn TextGenerator> = if settings.generation.api_key.is_some() {
        Arc::new(OpenAiGenerator::new(&settings.generation)?)
    } else {
        tracing::warn!("OPENAI_API_KEY not set; generation endpoints will fail");
        Arc::new(UnconfiguredGenerator)
    };

    let state = AppState::new(store, generator);
    let router = app(state, settings.server.body_limit);

    let listener = TcpListener::bind(&settings.server.bind_addr).await?;
    tracing::info!("vocard listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
