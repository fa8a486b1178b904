pub mod config;
pub mod error;
pub mod fetch;
pub mod registry;
pub mod rest;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;

use config::DeckConfig;
use fetch::ManifestFetcher;
use registry::games::GameLibrary;
use registry::SourceRegistry;
use storage::{KvStore, SqliteKv};

/// Shared application state passed to the status server and CLI handlers.
///
/// The registries are process-wide mutable state owned here exclusively;
/// everything downstream reads snapshots and issues the named operations.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<DeckConfig>,
    pub store: Arc<dyn KvStore>,
    pub registry: Arc<SourceRegistry>,
    pub games: Arc<GameLibrary>,
    pub started_at: std::time::Instant,
}

impl AppContext {
    /// Open the store under the config's data dir and restore both
    /// registries. A corrupt persisted blob downgrades to built-ins only
    /// instead of failing startup.
    pub async fn init(config: DeckConfig) -> Result<Arc<Self>> {
        let config = Arc::new(config);
        let store: Arc<dyn KvStore> = Arc::new(SqliteKv::new(&config.data_dir).await?);
        let fetcher = ManifestFetcher::new(config.fetch_timeout_secs)?;

        let registry = Arc::new(SourceRegistry::new(store.clone(), fetcher.clone()));
        if let Err(e) = registry.load().await {
            tracing::warn!("failed to load persisted registry, using built-ins: {e}");
        }

        let games = Arc::new(GameLibrary::new(store.clone(), fetcher));
        if let Err(e) = games.load().await {
            tracing::warn!("failed to load persisted game URLs: {e}");
        }

        Ok(Arc::new(Self {
            config,
            store,
            registry,
            games,
            started_at: std::time::Instant::now(),
        }))
    }
}
