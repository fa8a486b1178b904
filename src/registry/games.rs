//! Games library: a flat list of game source URLs.
//!
//! Games sources skip the app pipeline entirely: their manifests are bare
//! JSON arrays concatenated in order, with no dedup, no namespacing, and no
//! source attribution. The asymmetry with app sources is observed behavior
//! and kept as-is.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::error::{RegistryError, Result};
use crate::fetch::ManifestFetcher;
use crate::storage::KvStore;

use super::model::GameEntry;
use super::persist;

/// Ordered list of game source URLs, persisted under one key.
pub struct GameLibrary {
    store: Arc<dyn KvStore>,
    fetcher: ManifestFetcher,
    urls: RwLock<Vec<String>>,
}

impl GameLibrary {
    pub fn new(store: Arc<dyn KvStore>, fetcher: ManifestFetcher) -> Self {
        Self {
            store,
            fetcher,
            urls: RwLock::new(Vec::new()),
        }
    }

    /// Restore the persisted URL list.
    pub async fn load(&self) -> Result<()> {
        let urls = persist::load_game_urls(&self.store).await?;
        *self.urls.write().await = urls;
        Ok(())
    }

    /// Snapshot of the URL list.
    pub async fn urls(&self) -> Vec<String> {
        self.urls.read().await.clone()
    }

    /// Add a game source URL after probe-fetching it.
    ///
    /// The URL must currently serve a decodable games array, otherwise the
    /// add fails and the list is unchanged. Adding a URL that is already in
    /// the list is a no-op.
    pub async fn add_url(&self, url: &str) -> Result<()> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|_| RegistryError::InvalidUrl(url.to_string()))?;
        if parsed.host_str().is_none() {
            return Err(RegistryError::InvalidUrl(url.to_string()));
        }
        let canonical = parsed.to_string();

        if self.urls.read().await.iter().any(|u| *u == canonical) {
            return Ok(());
        }

        // Probe: the manifest must decode before the URL is accepted.
        self.fetcher.fetch_games(&canonical).await?;

        let urls = {
            let mut urls = self.urls.write().await;
            // Re-check: a concurrent add may have landed during the probe.
            if !urls.iter().any(|u| *u == canonical) {
                urls.push(canonical.clone());
            }
            urls.clone()
        };
        info!(url = %canonical, "game source URL added");
        persist::save_game_urls(&self.store, &urls).await
    }

    /// Remove a game source URL. Unknown URLs are a no-op.
    pub async fn remove_url(&self, url: &str) -> Result<()> {
        let urls = {
            let mut urls = self.urls.write().await;
            urls.retain(|u| u != url);
            urls.clone()
        };
        info!(url, "game source URL removed");
        persist::save_game_urls(&self.store, &urls).await
    }

    /// Fetch every game source in order and concatenate the results.
    ///
    /// Duplicates across sources are kept. Any failing URL fails the whole
    /// fetch; the URL list itself is never mutated here.
    pub async fn fetch_all(&self) -> Result<Vec<GameEntry>> {
        let urls = self.urls().await;
        let mut all = Vec::new();
        for url in &urls {
            let games = self.fetcher.fetch_games(url).await?;
            all.extend(games);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKv;

    fn make_library() -> GameLibrary {
        GameLibrary::new(Arc::new(MemoryKv::new()), ManifestFetcher::new(2).unwrap())
    }

    #[tokio::test]
    async fn invalid_url_rejected_without_mutation() {
        let lib = make_library();
        assert!(matches!(
            lib.add_url("not a url").await.unwrap_err(),
            RegistryError::InvalidUrl(_)
        ));
        assert!(lib.urls().await.is_empty());
    }

    #[tokio::test]
    async fn load_restores_persisted_urls() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
        persist::save_game_urls(&store, &["https://g.test/games.json".to_string()])
            .await
            .unwrap();
        let lib = GameLibrary::new(store, ManifestFetcher::new(2).unwrap());
        lib.load().await.unwrap();
        assert_eq!(lib.urls().await, vec!["https://g.test/games.json".to_string()]);
    }

    #[tokio::test]
    async fn remove_unknown_url_is_a_noop() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
        persist::save_game_urls(&store, &["https://g.test/games.json".to_string()])
            .await
            .unwrap();
        let lib = GameLibrary::new(store, ManifestFetcher::new(2).unwrap());
        lib.load().await.unwrap();
        lib.remove_url("https://other.test/x.json").await.unwrap();
        assert_eq!(lib.urls().await.len(), 1);
    }
}
