//! Persistence adapter between the registries and the key-value store.
//!
//! Built-in state is never written: the built-in source and its entries are
//! reconstructed statically on load, so only user-added state round-trips.

use std::sync::Arc;

use crate::error::{RegistryError, Result};
use crate::storage::KvStore;

use super::model::{Entry, Source, BUILTIN_SOURCE_ID};

/// Key holding the JSON array of non-built-in sources.
pub const SOURCES_KEY: &str = "app_sources";
/// Key holding the JSON array of non-built-in entries.
pub const ENTRIES_KEY: &str = "app_list";
/// Key holding the JSON array of game source URLs.
pub const GAME_URLS_KEY: &str = "game_urls";

fn persist_err(e: impl std::fmt::Display) -> RegistryError {
    RegistryError::Persist(e.to_string())
}

/// Serialize sources and entries minus the built-in ones.
pub async fn save(store: &Arc<dyn KvStore>, sources: &[Source], entries: &[Entry]) -> Result<()> {
    let user_sources: Vec<&Source> = sources.iter().filter(|s| !s.is_builtin()).collect();
    let user_entries: Vec<&Entry> =
        entries.iter().filter(|e| e.source != BUILTIN_SOURCE_ID).collect();

    let sources_json = serde_json::to_string(&user_sources).map_err(persist_err)?;
    let entries_json = serde_json::to_string(&user_entries).map_err(persist_err)?;

    store.set(SOURCES_KEY, &sources_json).await.map_err(persist_err)?;
    store.set(ENTRIES_KEY, &entries_json).await.map_err(persist_err)?;
    Ok(())
}

/// Read back the persisted user sources and entries.
///
/// Absent keys yield empty lists; malformed JSON is a [`RegistryError::Persist`]
/// and the caller falls back to built-ins only.
pub async fn load(store: &Arc<dyn KvStore>) -> Result<(Vec<Source>, Vec<Entry>)> {
    let sources = match store.get(SOURCES_KEY).await.map_err(persist_err)? {
        Some(raw) => serde_json::from_str::<Vec<Source>>(&raw).map_err(persist_err)?,
        None => Vec::new(),
    };
    let entries = match store.get(ENTRIES_KEY).await.map_err(persist_err)? {
        Some(raw) => serde_json::from_str::<Vec<Entry>>(&raw).map_err(persist_err)?,
        None => Vec::new(),
    };
    Ok((sources, entries))
}

/// Persist the games-library URL list.
pub async fn save_game_urls(store: &Arc<dyn KvStore>, urls: &[String]) -> Result<()> {
    let json = serde_json::to_string(urls).map_err(persist_err)?;
    store.set(GAME_URLS_KEY, &json).await.map_err(persist_err)
}

/// Read back the games-library URL list. Absent key yields an empty list.
pub async fn load_game_urls(store: &Arc<dyn KvStore>) -> Result<Vec<String>> {
    match store.get(GAME_URLS_KEY).await.map_err(persist_err)? {
        Some(raw) => serde_json::from_str(&raw).map_err(persist_err),
        None => Ok(Vec::new()),
    }
}
