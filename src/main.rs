use anyhow::Result;
use std::sync::Arc;

mod config;
mod error;
mod logging;
mod routes;
mod services;
pub mod models;

use services::excel::{ExtractorOptions, WorkbookExtractor};
use services::ingestor::PlanIngestor;
use services::project_store::ProjectStore;
use services::storage_client::StorageClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::load_config()?;

    // Build our application state
    let state = Arc::new(AppState::new(config)?);
    let addr = state.config.bind_addr;

    let app = routes::app(state);

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// Application state
pub struct AppState {
    config: config::Config,
    store: Arc<ProjectStore>,
    ingestor: PlanIngestor,
}

impl AppState {
    fn new(config: config::Config) -> Result<Self> {
        let store = Arc::new(ProjectStore::open(&config.database_path)?);
        let storage = StorageClient::new(config.storage.clone(), config.max_file_size);
        let extractor = WorkbookExtractor::new(ExtractorOptions {
            price_per_session: config.price_per_session,
        });
        let ingestor = PlanIngestor::new(store.clone(), storage, extractor);

        Ok(Self {
            config,
            store,
            ingestor,
        })
    }
}
