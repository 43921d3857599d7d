pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::EngineError;
pub use models::*;

use anyhow::Result;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub events: Arc<services::events::EventStore>,
    pub catalog: Arc<services::catalog::InMemoryCatalog>,
    pub content: Arc<services::content::StaticContentProvider>,
    pub cold_start: Arc<services::coldstart::InMemoryColdStartStore>,
    pub recommendation_service: Arc<services::recommendation::RecommendationService>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);

        let events = Arc::new(services::events::EventStore::new());
        let catalog = Arc::new(services::catalog::InMemoryCatalog::new());
        let content = Arc::new(services::content::StaticContentProvider::new());
        let cold_start = Arc::new(services::coldstart::InMemoryColdStartStore::new());

        let recommendation_service = Arc::new(
            services::recommendation::RecommendationService::new(
                config.clone(),
                events.clone(),
                catalog.clone(),
                content.clone(),
                cold_start.clone(),
            ),
        );

        Ok(Self {
            config,
            events,
            catalog,
            content,
            cold_start,
            recommendation_service,
        })
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
