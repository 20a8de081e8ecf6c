//! Tiered Store (spec §4.3, component E, second half): a read-only
//! `(mode, tier) → template` table with a packaged-dist → source-tree →
//! hard-coded fallback chain.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Assistant,
    Developer,
    Planning,
    Debugger,
    User,
}

impl Mode {
    fn as_str(self) -> &'static str {
        match self {
            Mode::Assistant => "assistant",
            Mode::Developer => "developer",
            Mode::Planning => "planning",
            Mode::Debugger => "debugger",
            Mode::User => "user",
        }
    }
}

const HARDCODED_DEVELOPER_3: &str = "You are an autonomous coding agent operating inside a local terminal. \
Work through the task methodically, verify before you declare done, and keep the user informed of consequential actions.";

/// Read-only `(mode, tier)` table (spec §4.3). Tier axis is 1..=5, matching
/// [`crate::size::ContextTier::index`].
pub struct TieredStore {
    templates: FxHashMap<(Mode, u8), String>,
}

impl TieredStore {
    /// Load from a template directory following the fallback chain
    /// packaged-dist → source-tree → hard-coded (spec §4.3). Either root may
    /// be absent; only files actually present are loaded.
    pub fn load(packaged_dist: Option<&Path>, source_tree: Option<&Path>) -> Self {
        let mut templates = FxHashMap::default();

        for root in [packaged_dist, source_tree] {
            let Some(root) = root else { continue };
            for mode in [Mode::Assistant, Mode::Developer, Mode::Planning, Mode::Debugger, Mode::User] {
                for tier in 1..=5u8 {
                    let path = root.join(format!("{}-{tier}.md", mode.as_str()));
                    if let Ok(content) = std::fs::read_to_string(&path) {
                        templates.entry((mode, tier)).or_insert(content);
                    }
                }
            }
        }

        templates.entry((Mode::Developer, 3)).or_insert_with(|| HARDCODED_DEVELOPER_3.to_string());

        Self { templates }
    }

    /// In-memory store with no filesystem backing, for tests and embedding.
    pub fn in_memory(entries: impl IntoIterator<Item = ((Mode, u8), String)>) -> Self {
        let mut templates: FxHashMap<(Mode, u8), String> = entries.into_iter().collect();
        templates.entry((Mode::Developer, 3)).or_insert_with(|| HARDCODED_DEVELOPER_3.to_string());
        Self { templates }
    }

    /// Lookup: exact → same-mode lower tier → developer-3 (spec §4.3).
    pub fn lookup(&self, mode: Mode, tier: u8) -> &str {
        if let Some(template) = self.templates.get(&(mode, tier)) {
            return template;
        }
        for lower in (1..tier).rev() {
            if let Some(template) = self.templates.get(&(mode, lower)) {
                return template;
            }
        }
        self.templates
            .get(&(Mode::Developer, 3))
            .expect("developer-3 hard-coded fallback is always present")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_developer_3_when_store_is_empty() {
        let store = TieredStore::in_memory([]);
        assert_eq!(store.lookup(Mode::Planning, 4), HARDCODED_DEVELOPER_3);
    }

    #[test]
    fn falls_back_to_same_mode_lower_tier() {
        let store = TieredStore::in_memory([((Mode::Planning, 2), "planning tier 2".to_string())]);
        assert_eq!(store.lookup(Mode::Planning, 4), "planning tier 2");
    }

    #[test]
    fn exact_match_wins_over_fallback() {
        let store = TieredStore::in_memory([((Mode::Planning, 4), "planning tier 4".to_string())]);
        assert_eq!(store.lookup(Mode::Planning, 4), "planning tier 4");
    }

    #[test]
    fn packaged_dist_wins_over_source_tree_on_collision() {
        let dist = tempdir("dist");
        let src = tempdir("src");
        std::fs::write(dist.join("developer-2.md"), "dist version").unwrap();
        std::fs::write(src.join("developer-2.md"), "source-tree version").unwrap();
        std::fs::write(src.join("developer-1.md"), "source-tree only").unwrap();

        let store = TieredStore::load(Some(&dist), Some(&src));
        assert_eq!(store.lookup(Mode::Developer, 2), "dist version");
        assert_eq!(store.lookup(Mode::Developer, 1), "source-tree only");
    }

    fn tempdir(label: &str) -> std::path::PathBuf {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!("tiered-store-test-{label}-{}-{unique}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
