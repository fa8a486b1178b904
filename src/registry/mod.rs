//! Source and entry registries.
//!
//! The `SourceRegistry` is the single owner of all mutable registry state.
//! Its three operations — add, refresh, delete — are the entire mutation
//! surface; everything else reads snapshots. Operations mutate in-memory
//! state under one write lock (no awaits while held), then persist. A
//! persistence failure after a successful mutation is surfaced but not
//! rolled back.

pub mod games;
pub mod model;
pub mod persist;
pub mod validate;

use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::{RegistryError, Result};
use crate::fetch::ManifestFetcher;
use crate::storage::KvStore;

use model::{builtin_entries, Entry, Source};
use validate::validate_and_namespace;

struct RegistryState {
    sources: Vec<Source>,
    entries: Vec<Entry>,
}

impl RegistryState {
    fn builtin_only() -> Self {
        Self {
            sources: vec![Source::builtin()],
            entries: builtin_entries(),
        }
    }
}

/// Owner of the source list and the entry list.
pub struct SourceRegistry {
    store: Arc<dyn KvStore>,
    fetcher: ManifestFetcher,
    state: RwLock<RegistryState>,
    /// Source ids with a refresh currently in flight. An overlapping refresh
    /// of the same source fails fast with `Busy` instead of racing the first
    /// one's completion.
    in_flight: StdMutex<HashSet<String>>,
    /// Every id handed out by `fresh_source_id` this process lifetime.
    /// Registration happens only after a successful fetch, so the source
    /// list alone cannot arbitrate overlapping adds.
    issued_ids: StdMutex<HashSet<String>>,
}

/// Releases the in-flight slot when a refresh finishes on any path.
struct InFlightGuard<'a> {
    set: &'a StdMutex<HashSet<String>>,
    id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.id);
        }
    }
}

impl SourceRegistry {
    pub fn new(store: Arc<dyn KvStore>, fetcher: ManifestFetcher) -> Self {
        Self {
            store,
            fetcher,
            state: RwLock::new(RegistryState::builtin_only()),
            in_flight: StdMutex::new(HashSet::new()),
            issued_ids: StdMutex::new(HashSet::new()),
        }
    }

    /// Restore persisted sources and entries on top of the built-ins.
    ///
    /// On a persistence error the in-memory state stays built-ins only; the
    /// caller decides whether to surface or just log the error.
    pub async fn load(&self) -> Result<()> {
        let (sources, entries) = persist::load(&self.store).await?;
        let mut state = self.state.write().await;
        *state = RegistryState::builtin_only();
        state.sources.extend(sources);
        state.entries.extend(entries);
        info!(
            sources = state.sources.len(),
            entries = state.entries.len(),
            "registry loaded"
        );
        Ok(())
    }

    /// Snapshot of the source list.
    pub async fn sources(&self) -> Vec<Source> {
        self.state.read().await.sources.clone()
    }

    /// Snapshot of the entry list.
    pub async fn entries(&self) -> Vec<Entry> {
        self.state.read().await.entries.clone()
    }

    pub async fn get_source(&self, id: &str) -> Option<Source> {
        self.state.read().await.sources.iter().find(|s| s.id == id).cloned()
    }

    /// Register a remote source and fold its validated entries in.
    ///
    /// All-or-nothing: a fetch or manifest failure aborts before any state
    /// mutation. On success the new source and its entries are appended and
    /// persisted.
    pub async fn add_source(&self, url: &str) -> Result<Source> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|_| RegistryError::InvalidUrl(url.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| RegistryError::InvalidUrl(url.to_string()))?
            .to_string();

        let source_id = self.fresh_source_id().await;
        let raw = self.fetcher.fetch_apps(parsed.as_str()).await?;

        let (source, new_entries, sources, entries) = {
            let mut state = self.state.write().await;
            let new_entries = validate_and_namespace(raw, &source_id, &state.entries);
            let source = Source {
                id: source_id,
                name: host,
                url: parsed.to_string(),
            };
            state.sources.push(source.clone());
            state.entries.extend(new_entries.iter().cloned());
            (source, new_entries, state.sources.clone(), state.entries.clone())
        };

        info!(
            source = %source.id,
            url = %source.url,
            added = new_entries.len(),
            "source added"
        );
        persist::save(&self.store, &sources, &entries).await?;
        Ok(source)
    }

    /// Re-fetch a source's manifest and replace its entries wholesale.
    ///
    /// No-op for the built-in source. A fetch or manifest failure leaves the
    /// prior entries untouched. Entries that disappeared from the manifest
    /// are dropped — this is a full replace, not a patch.
    pub async fn refresh_source(&self, source_id: &str) -> Result<Vec<Entry>> {
        let source = self
            .get_source(source_id)
            .await
            .ok_or_else(|| RegistryError::UnknownSource(source_id.to_string()))?;
        if source.is_builtin() {
            return Ok(builtin_entries());
        }

        let _guard = {
            let mut set = self
                .in_flight
                .lock()
                .map_err(|_| RegistryError::Busy(source_id.to_string()))?;
            if !set.insert(source.id.clone()) {
                return Err(RegistryError::Busy(source_id.to_string()));
            }
            InFlightGuard { set: &self.in_flight, id: source.id.clone() }
        };

        // Prior entries stay in place until the new set is fully validated.
        let raw = self.fetcher.fetch_apps(&source.url).await?;

        let (refreshed, sources, entries) = {
            let mut state = self.state.write().await;
            let mut others: Vec<Entry> = state
                .entries
                .iter()
                .filter(|e| e.source != source.id)
                .cloned()
                .collect();
            let refreshed = validate_and_namespace(raw, &source.id, &others);
            others.extend(refreshed.iter().cloned());
            state.entries = others;
            (refreshed, state.sources.clone(), state.entries.clone())
        };

        info!(source = %source.id, entries = refreshed.len(), "source refreshed");
        persist::save(&self.store, &sources, &entries).await?;
        Ok(refreshed)
    }

    /// Remove a source and cascade-delete its entries.
    ///
    /// No-op for the built-in source and for unknown ids. The in-memory
    /// mutation always succeeds; a persistence failure is surfaced without
    /// rollback.
    pub async fn delete_source(&self, source_id: &str) -> Result<()> {
        if source_id == model::BUILTIN_SOURCE_ID {
            return Ok(());
        }

        let (sources, entries) = {
            let mut state = self.state.write().await;
            state.sources.retain(|s| s.id != source_id);
            state.entries.retain(|e| e.source != source_id);
            (state.sources.clone(), state.entries.clone())
        };

        info!(source = source_id, "source deleted");
        persist::save(&self.store, &sources, &entries).await
    }

    /// Generate a collision-resistant source id for the process lifetime.
    ///
    /// Timestamp-based like the original scheme, but the id is reserved in
    /// `issued_ids` at generation time: overlapping adds landing in the same
    /// millisecond, or ids restored from persistence, push the later caller
    /// onto a random token instead of duplicating.
    async fn fresh_source_id(&self) -> String {
        let candidate = format!("source_{}", chrono::Utc::now().timestamp_millis());
        let in_sources = {
            let state = self.state.read().await;
            state.sources.iter().any(|s| s.id == candidate)
        };
        let mut issued = match self.issued_ids.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if in_sources || !issued.insert(candidate.clone()) {
            let fallback = format!("source_{}", uuid::Uuid::new_v4().simple());
            warn!(%candidate, %fallback, "source id collision, using random id");
            issued.insert(fallback.clone());
            return fallback;
        }
        candidate
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
