//! Merge/validation engine for app-source manifests.
//!
//! Pure function over the raw manifest entries plus a snapshot of the
//! existing registry — it never touches shared state. The caller folds the
//! returned entries into the registry and persists.

use std::collections::HashSet;

use super::model::{Entry, RawAppEntry, RESERVED_ID_PREFIX};

/// Sanitize and namespace raw manifest entries against the current registry.
///
/// Rules, in order:
/// 1. Any raw entry whose `name` matches an existing entry's name (anywhere
///    in the registry) is dropped silently.
/// 2. A surviving entry keeps its declared id unless that id already exists
///    or starts with the reserved `default_` prefix, in which case it is
///    rewritten to `"<source_id>_<original_id>"`. If the rewritten id still
///    collides (pathological manifests), a numeric suffix is appended until
///    it is unique.
/// 3. The `source` field is overwritten with `source_id` unconditionally —
///    a manifest cannot claim attribution to another source.
///
/// Ids assigned within one call join the uniqueness set, so intra-batch
/// duplicates are namespaced too.
pub fn validate_and_namespace(
    raw: Vec<RawAppEntry>,
    source_id: &str,
    existing: &[Entry],
) -> Vec<Entry> {
    let mut ids: HashSet<String> = existing.iter().map(|e| e.id.clone()).collect();
    let names: HashSet<&str> = existing.iter().map(|e| e.name.as_str()).collect();

    let mut out = Vec::with_capacity(raw.len());
    for app in raw {
        if names.contains(app.name.as_str()) {
            continue;
        }

        let mut unique_id = app.id.clone();
        if ids.contains(&unique_id) || unique_id.starts_with(RESERVED_ID_PREFIX) {
            unique_id = format!("{source_id}_{}", app.id);
            let mut n = 2u32;
            while ids.contains(&unique_id) {
                unique_id = format!("{source_id}_{}_{n}", app.id);
                n += 1;
            }
        }
        ids.insert(unique_id.clone());

        out.push(Entry {
            id: unique_id,
            name: app.name,
            icon: app.icon,
            color: app.color,
            action: app.action,
            url: app.url,
            source: source_id.to_string(),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::model::{builtin_entries, AppAction};

    fn raw(id: &str, name: &str) -> RawAppEntry {
        RawAppEntry {
            id: id.to_string(),
            name: name.to_string(),
            icon: String::new(),
            color: String::new(),
            action: AppAction::Web,
            url: Some("https://y".to_string()),
        }
    }

    #[test]
    fn fresh_entry_keeps_declared_id() {
        let out = validate_and_namespace(vec![raw("chat", "Chat")], "source_1", &builtin_entries());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "chat");
        assert_eq!(out[0].source, "source_1");
    }

    #[test]
    fn name_collision_with_builtin_is_dropped_silently() {
        // Registry starts with only the built-in "Games" entry; a manifest app
        // also named "Games" must vanish without error.
        let out =
            validate_and_namespace(vec![raw("games", "Games")], "source_1", &builtin_entries());
        assert!(out.is_empty());
    }

    #[test]
    fn id_collision_is_namespaced() {
        let existing = builtin_entries();
        let out = validate_and_namespace(
            vec![raw("default_games", "Shop"), raw("chat", "Chat")],
            "source_9",
            &existing,
        );
        assert_eq!(out[0].id, "source_9_default_games");
        assert_eq!(out[1].id, "chat");
        let ids: Vec<_> = existing.iter().map(|e| e.id.as_str()).collect();
        for e in &out {
            assert!(!ids.contains(&e.id.as_str()));
        }
    }

    #[test]
    fn reserved_prefix_cannot_be_spoofed() {
        let out = validate_and_namespace(
            vec![raw("default_admin", "Admin")],
            "source_2",
            &builtin_entries(),
        );
        assert_eq!(out[0].id, "source_2_default_admin");
        assert!(!out[0].id.starts_with("default_"));
    }

    #[test]
    fn source_attribution_is_forced() {
        // RawAppEntry has no source field at all: whatever a manifest claims
        // is discarded during decode, and attribution is assigned here.
        let out = validate_and_namespace(vec![raw("a", "A")], "source_3", &[]);
        assert_eq!(out[0].source, "source_3");
    }

    #[test]
    fn intra_batch_duplicate_ids_are_namespaced() {
        let out = validate_and_namespace(
            vec![raw("tool", "Tool One"), raw("tool", "Tool Two"), raw("tool", "Tool Three")],
            "s",
            &[],
        );
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].id, "tool");
        assert_eq!(out[1].id, "s_tool");
        assert_eq!(out[2].id, "s_tool_2");
    }

    #[test]
    fn dedup_is_idempotent() {
        let existing = builtin_entries();
        let input = vec![raw("games", "Games"), raw("chat", "Chat")];
        let first = validate_and_namespace(input.clone(), "s1", &existing);
        let second = validate_and_namespace(input, "s1", &existing);
        assert_eq!(first, second);
    }
}
