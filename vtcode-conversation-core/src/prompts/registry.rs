//! Prompt Registry (spec §4.3, component E, first half): an insertion-order
//! store of mandates, sanity checks, skills, and goals-adjacent snippets.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptSource {
    Static,
    Extension,
    Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptEntry {
    pub id: String,
    pub name: String,
    pub content: String,
    pub description: Option<String>,
    pub required_tools: Vec<String>,
    pub tags: Vec<String>,
    pub source: PromptSource,
    pub source_name: Option<String>,
    pub registered_at: DateTime<Utc>,
}

/// Insertion-order mapping from prompt id to entry (spec §4.3).
#[derive(Debug, Default)]
pub struct PromptRegistry {
    entries: IndexMap<String, PromptEntry>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-registering the same id replaces the prior definition exactly once
    /// (spec Property 13).
    pub fn register(&mut self, entry: PromptEntry) {
        self.entries.insert(entry.id.clone(), entry);
    }

    pub fn unregister(&mut self, id: &str) -> Option<PromptEntry> {
        self.entries.shift_remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&PromptEntry> {
        self.entries.get(id)
    }

    pub fn list(&self) -> impl Iterator<Item = &PromptEntry> {
        self.entries.values()
    }

    pub fn list_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a PromptEntry> {
        self.entries.values().filter(move |entry| entry.tags.iter().any(|t| t == tag))
    }

    pub fn list_by_source(&self, source: PromptSource) -> impl Iterator<Item = &PromptEntry> {
        self.entries.values().filter(move |entry| entry.source == source)
    }

    /// Used when an extension disconnects (spec §4.3).
    pub fn clear_by_source(&mut self, source: PromptSource, source_name: Option<&str>) {
        self.entries.retain(|_, entry| {
            !(entry.source == source && entry.source_name.as_deref() == source_name)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, content: &str) -> PromptEntry {
        PromptEntry {
            id: id.to_string(),
            name: id.to_string(),
            content: content.to_string(),
            description: None,
            required_tools: Vec::new(),
            tags: Vec::new(),
            source: PromptSource::Static,
            source_name: None,
            registered_at: Utc::now(),
        }
    }

    #[test]
    fn reregistering_same_id_replaces_the_prior_entry() {
        let mut registry = PromptRegistry::new();
        registry.register(entry("skill.rust", "v1"));
        registry.register(entry("skill.rust", "v2"));
        assert_eq!(registry.list().count(), 1);
        assert_eq!(registry.get("skill.rust").unwrap().content, "v2");
    }

    #[test]
    fn clear_by_source_only_removes_matching_extension() {
        let mut registry = PromptRegistry::new();
        let mut ext_entry = entry("ext.tool", "content");
        ext_entry.source = PromptSource::Extension;
        ext_entry.source_name = Some("my-ext".to_string());
        registry.register(ext_entry);
        registry.register(entry("static.one", "content"));

        registry.clear_by_source(PromptSource::Extension, Some("my-ext"));

        assert!(registry.get("ext.tool").is_none());
        assert!(registry.get("static.one").is_some());
    }
}
