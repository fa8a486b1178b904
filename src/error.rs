//! Error types for registry operations.
//!
//! Every fallible registry operation returns [`RegistryError`]. All variants
//! are surfaced at the operation boundary (CLI subcommand or RPC handler);
//! none of them terminate the process.

/// Errors returned by source/entry registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The given string could not be parsed as an absolute URL with a host.
    #[error("invalid source URL: {0}")]
    InvalidUrl(String),

    /// Network failure or non-2xx status while fetching a manifest.
    #[error("manifest fetch failed: {0}")]
    Fetch(String),

    /// The fetched body was not valid JSON or violated the manifest schema.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// Local key-value store I/O failure.
    ///
    /// When this is returned after a registry mutation, the in-memory state
    /// has already changed and is NOT rolled back; the persisted copy may
    /// diverge until the next successful save.
    #[error("persistence failed: {0}")]
    Persist(String),

    /// A refresh for the same source is already in flight.
    #[error("refresh already in progress for source {0}")]
    Busy(String),

    /// The referenced source id is not registered.
    #[error("unknown source: {0}")]
    UnknownSource(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
