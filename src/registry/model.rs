//! Registry data models.
//!
//! `Source` is a named origin of launchable entries — either the built-in
//! source (always present, never persisted) or a user-added remote manifest
//! URL. `Entry` is a launchable app attributed to exactly one source.
//! `GameEntry` is the games-library record, which deliberately bypasses the
//! app validation pipeline (see `registry::games`).

use serde::{Deserialize, Serialize};

/// Id of the always-present built-in source.
pub const BUILTIN_SOURCE_ID: &str = "default";

/// Sentinel URL marking the built-in source as non-fetchable.
pub const BUILTIN_SOURCE_URL: &str = "builtin://default";

/// Reserved id prefix for built-in entries. Remote manifests may not claim
/// ids under this prefix; the validator rewrites them.
pub const RESERVED_ID_PREFIX: &str = "default_";

// ─── Source ──────────────────────────────────────────────────────────────────

/// A named origin of launchable entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    /// Display label — the URL's host component for remote sources.
    pub name: String,
    /// Manifest origin, or [`BUILTIN_SOURCE_URL`] for the built-in source.
    pub url: String,
}

impl Source {
    /// The built-in source. Exists for the process lifetime; never persisted,
    /// refreshed, or deleted.
    pub fn builtin() -> Self {
        Self {
            id: BUILTIN_SOURCE_ID.to_string(),
            name: "Built-in Apps".to_string(),
            url: BUILTIN_SOURCE_URL.to_string(),
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.id == BUILTIN_SOURCE_ID
    }
}

// ─── AppAction ───────────────────────────────────────────────────────────────

/// How activating an app entry is handled by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppAction {
    /// Internal route inside the host application.
    Builtin,
    /// Open `url` in the external browser.
    Web,
    /// Remote content rendered by the native shell.
    Native,
}

impl AppAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppAction::Builtin => "builtin",
            AppAction::Web => "web",
            AppAction::Native => "native",
        }
    }
}

// ─── Entry ───────────────────────────────────────────────────────────────────

/// A launchable app entry, attributed to exactly one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Globally unique after namespacing.
    pub id: String,
    /// Display label; also the dedup key across the whole registry.
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    pub action: AppAction,
    /// Activation target; meaning depends on `action`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Owning source's id. Lookup-only back-reference, never ownership.
    pub source: String,
}

/// The statically defined built-in entries. Exactly one maps to the reserved
/// built-in prefix.
pub fn builtin_entries() -> Vec<Entry> {
    vec![Entry {
        id: "default_games".to_string(),
        name: "Games".to_string(),
        icon: "🎮".to_string(),
        color: "$blue10".to_string(),
        action: AppAction::Builtin,
        url: Some("/apps/games".to_string()),
        source: BUILTIN_SOURCE_ID.to_string(),
    }]
}

// ─── RawAppEntry ─────────────────────────────────────────────────────────────

/// An app entry exactly as declared in a fetched manifest, before
/// deduplication, namespacing, and source attribution.
///
/// The `source` a manifest claims is ignored entirely — attribution is
/// forced by the validator.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAppEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    pub action: AppAction,
    #[serde(default)]
    pub url: Option<String>,
}

// ─── GameEntry ───────────────────────────────────────────────────────────────

/// Platform tag routing game activation to a provider screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePlatform {
    Web,
    Coolmathgames,
    Emujs,
}

/// A game record from a games-source manifest.
///
/// Games sources are a JSON array of these, consumed verbatim: no dedup, no
/// namespacing, no source attribution. This asymmetry with the app pipeline
/// is intentional and preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub genre: String,
    pub platform: GamePlatform,
    /// Manifests encode this as the bool `true` or the string `"true"`.
    #[serde(default, deserialize_with = "flexible_bool")]
    pub nsfw: bool,
}

/// Accept `true`/`false` as either JSON booleans or strings.
fn flexible_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        Str(String),
    }
    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::Str(s) => Ok(s.eq_ignore_ascii_case("true")),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
