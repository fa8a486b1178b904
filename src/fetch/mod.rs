//! Remote manifest fetcher.
//!
//! Thin reqwest wrapper that turns transport failures and non-2xx statuses
//! into [`RegistryError::Fetch`], and JSON/schema violations into
//! [`RegistryError::InvalidManifest`]. Nothing here mutates registry state.

use serde_json::Value;
use tracing::debug;

use crate::error::{RegistryError, Result};
use crate::registry::model::{GameEntry, RawAppEntry};

/// HTTP client for source manifests.
#[derive(Clone)]
pub struct ManifestFetcher {
    client: reqwest::Client,
}

impl ManifestFetcher {
    pub fn new(timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    /// GET `url` and decode the body as JSON.
    async fn fetch_json(&self, url: &str) -> Result<Value> {
        debug!(url, "fetching manifest");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RegistryError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Fetch(format!("HTTP status {status} from {url}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| RegistryError::InvalidManifest(e.to_string()))
    }

    /// Fetch an apps manifest: a JSON object whose `apps` field is an array.
    ///
    /// A missing or non-array `apps` field is a hard validation failure; the
    /// caller aborts before any state mutation.
    pub async fn fetch_apps(&self, url: &str) -> Result<Vec<RawAppEntry>> {
        let body = self.fetch_json(url).await?;
        let apps = match body.get("apps") {
            Some(Value::Array(apps)) => apps.clone(),
            _ => {
                return Err(RegistryError::InvalidManifest(
                    "manifest has no `apps` array".to_string(),
                ))
            }
        };
        serde_json::from_value::<Vec<RawAppEntry>>(Value::Array(apps))
            .map_err(|e| RegistryError::InvalidManifest(e.to_string()))
    }

    /// Fetch a games manifest: a bare JSON array of game records.
    pub async fn fetch_games(&self, url: &str) -> Result<Vec<GameEntry>> {
        let body = self.fetch_json(url).await?;
        if !body.is_array() {
            return Err(RegistryError::InvalidManifest(
                "games manifest is not a JSON array".to_string(),
            ));
        }
        serde_json::from_value::<Vec<GameEntry>>(body)
            .map_err(|e| RegistryError::InvalidManifest(e.to_string()))
    }
}
