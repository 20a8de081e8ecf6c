//! Model Database & Router (spec §4.13, component B). Grounded on the
//! layered built-in + user-override load pattern in
//! `vtcode-core::models_manager::manager`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// A capability a routing profile may require of a candidate model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Streaming,
    ToolCalling,
    Vision,
}

/// A `(user_size, server_size)` pair a model was measured or configured at
/// (spec §6.4 "User model overrides" schema: `context_profiles`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextProfile {
    pub size: u32,
    pub ollama_context_size: u32,
}

/// One entry of the model catalog (spec §6.4, "User model overrides" schema).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    pub name: String,
    pub family: String,
    pub max_context_window: u32,
    pub parameter_count_billion: f64,
    #[serde(default)]
    pub context_profiles: Vec<ContextProfile>,
    pub capabilities: Vec<Capability>,
}

impl ModelEntry {
    fn has_capability(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }
}

/// The on-disk shape of a single entry in the user model overrides document
/// (spec §6.4): `{id, name, max_context_window, context_profiles, capabilities:
/// {toolCalling, vision, streaming}}`. Kept distinct from [`ModelEntry`]
/// because the wire document's `capabilities` is an object of booleans, not
/// the internal `Vec<Capability>` representation.
#[derive(Debug, Clone, Deserialize)]
struct UserModelOverrideEntry {
    id: String,
    name: String,
    max_context_window: u32,
    #[serde(default)]
    context_profiles: Vec<ContextProfile>,
    capabilities: UserModelCapabilityFlags,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct UserModelCapabilityFlags {
    #[serde(default, rename = "toolCalling")]
    tool_calling: bool,
    #[serde(default)]
    vision: bool,
    #[serde(default)]
    streaming: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct UserModelOverridesDocument {
    #[serde(default)]
    user_models: Vec<UserModelOverrideEntry>,
}

impl From<UserModelOverrideEntry> for ModelEntry {
    fn from(entry: UserModelOverrideEntry) -> Self {
        let mut capabilities = Vec::new();
        if entry.capabilities.streaming {
            capabilities.push(Capability::Streaming);
        }
        if entry.capabilities.tool_calling {
            capabilities.push(Capability::ToolCalling);
        }
        if entry.capabilities.vision {
            capabilities.push(Capability::Vision);
        }
        Self {
            family: infer_family(&entry.id),
            id: entry.id,
            name: entry.name,
            max_context_window: entry.max_context_window,
            parameter_count_billion: 0.0,
            context_profiles: entry.context_profiles,
            capabilities,
        }
    }
}

/// Best-effort family tag for a user-supplied model id lacking one, taken as
/// the prefix before the first `:` or `-` (e.g. `qwen2.5-coder:14b` → `qwen2.5`).
fn infer_family(id: &str) -> String {
    let cut = id.find([':', '-']).unwrap_or(id.len());
    id[..cut].to_string()
}

#[derive(Debug, Error)]
pub enum ModelDatabaseError {
    #[error("malformed user model overrides document: {0}")]
    MalformedOverrides(#[from] serde_json::Error),
}

/// Static built-in catalog plus user-override JSON merge (spec §6.4,
/// grounded on `vtcode-core::models_manager::manager`'s layered load
/// pattern: built-ins seed the table, then `refresh` re-applies the user
/// document on top so neither load order nor repeated refreshes lose data).
#[derive(Debug, Clone, Default)]
pub struct ModelDatabase {
    models: HashMap<String, ModelEntry>,
}

impl ModelDatabase {
    /// Seeds the database from the built-in catalog only (no user overrides).
    pub fn with_builtin_catalog() -> Self {
        let mut models = HashMap::new();
        for model in builtin_catalog() {
            models.insert(model.id.clone(), model);
        }
        Self { models }
    }

    /// Parses a user model overrides document (spec §6.4 schema) and merges
    /// each entry into the database, overwriting any built-in or previously
    /// loaded entry with the same id.
    pub fn merge_overrides_json(&mut self, json: &str) -> Result<usize, ModelDatabaseError> {
        let document: UserModelOverridesDocument = serde_json::from_str(json)?;
        let count = document.user_models.len();
        for entry in document.user_models {
            let model: ModelEntry = entry.into();
            self.models.insert(model.id.clone(), model);
        }
        Ok(count)
    }

    /// Resets to the built-in catalog, then re-applies `overrides_json` (empty
    /// string is treated as "no overrides file present").
    pub fn refresh(&mut self, overrides_json: &str) -> Result<usize, ModelDatabaseError> {
        *self = Self::with_builtin_catalog();
        if overrides_json.trim().is_empty() {
            return Ok(0);
        }
        self.merge_overrides_json(overrides_json)
    }

    pub fn get(&self, id: &str) -> Option<&ModelEntry> {
        self.models.get(id)
    }

    pub fn all(&self) -> Vec<&ModelEntry> {
        self.models.values().collect()
    }
}

/// Seed catalog (spec §6.4, a small representative set of commonly-served
/// local models; a real deployment grows this from its own Ollama/LM Studio
/// inventory at startup).
fn builtin_catalog() -> Vec<ModelEntry> {
    vec![
        ModelEntry {
            id: "llama3.1:8b".to_string(),
            name: "Llama 3.1 8B".to_string(),
            family: "llama".to_string(),
            max_context_window: 131072,
            parameter_count_billion: 8.0,
            context_profiles: vec![
                ContextProfile { size: 8192, ollama_context_size: 6963 },
                ContextProfile { size: 32768, ollama_context_size: 27852 },
            ],
            capabilities: vec![Capability::Streaming, Capability::ToolCalling],
        },
        ModelEntry {
            id: "qwen2.5-coder:14b".to_string(),
            name: "Qwen2.5 Coder 14B".to_string(),
            family: "qwen".to_string(),
            max_context_window: 32768,
            parameter_count_billion: 14.0,
            context_profiles: vec![ContextProfile { size: 16384, ollama_context_size: 13926 }],
            capabilities: vec![Capability::Streaming, Capability::ToolCalling],
        },
        ModelEntry {
            id: "mistral:7b".to_string(),
            name: "Mistral 7B".to_string(),
            family: "mistral".to_string(),
            max_context_window: 32768,
            parameter_count_billion: 7.0,
            context_profiles: vec![ContextProfile { size: 8192, ollama_context_size: 6963 }],
            capabilities: vec![Capability::Streaming],
        },
        ModelEntry {
            id: "phi3:3.8b".to_string(),
            name: "Phi-3 Mini".to_string(),
            family: "phi".to_string(),
            max_context_window: 4096,
            parameter_count_billion: 3.8,
            context_profiles: vec![ContextProfile { size: 4096, ollama_context_size: 3482 }],
            capabilities: vec![Capability::Streaming],
        },
    ]
}

/// A named routing profile (spec §3, "Routing Profile").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingProfile {
    pub name: String,
    pub preferred_families: Vec<String>,
    pub required_capabilities: Vec<Capability>,
    pub min_context_window: u32,
    pub fallback: Option<String>,
}

/// Static table of built-in profiles (spec §4.13).
pub fn builtin_profiles() -> HashMap<String, RoutingProfile> {
    let mut profiles = HashMap::new();
    profiles.insert(
        "fast".to_string(),
        RoutingProfile {
            name: "fast".to_string(),
            preferred_families: vec!["phi".to_string(), "gemma".to_string(), "mistral".to_string()],
            required_capabilities: vec![Capability::Streaming],
            min_context_window: 4096,
            fallback: Some("general".to_string()),
        },
    );
    profiles.insert(
        "general".to_string(),
        RoutingProfile {
            name: "general".to_string(),
            preferred_families: vec!["llama".to_string(), "mistral".to_string(), "qwen".to_string()],
            required_capabilities: vec![Capability::Streaming],
            min_context_window: 8192,
            fallback: None,
        },
    );
    profiles.insert(
        "code".to_string(),
        RoutingProfile {
            name: "code".to_string(),
            preferred_families: vec!["codellama".to_string(), "deepseek-coder".to_string(), "qwen".to_string()],
            required_capabilities: vec![Capability::Streaming],
            min_context_window: 16384,
            fallback: Some("general".to_string()),
        },
    );
    profiles.insert(
        "creative".to_string(),
        RoutingProfile {
            name: "creative".to_string(),
            preferred_families: vec!["llama".to_string(), "mistral".to_string()],
            required_capabilities: vec![Capability::Streaming],
            min_context_window: 8192,
            fallback: Some("general".to_string()),
        },
    );
    profiles
}

/// Model Router: profile→model selection with fallback and capability
/// filtering (spec §4.13).
pub struct ModelRouter {
    profiles: HashMap<String, RoutingProfile>,
    overrides: HashMap<String, String>,
}

impl ModelRouter {
    pub fn new() -> Self {
        Self { profiles: builtin_profiles(), overrides: HashMap::new() }
    }

    pub fn with_profiles(profiles: HashMap<String, RoutingProfile>) -> Self {
        Self { profiles, overrides: HashMap::new() }
    }

    /// Force a profile to resolve to a specific model name regardless of
    /// availability (spec §4.13 step 1 — the caller must handle absence).
    pub fn set_override(&mut self, profile_name: impl Into<String>, model_name: impl Into<String>) {
        self.overrides.insert(profile_name.into(), model_name.into());
    }

    pub fn route(&self, profile_name: &str, available: &[ModelEntry]) -> Option<String> {
        if let Some(forced) = self.overrides.get(profile_name) {
            return Some(forced.clone());
        }
        self.route_inner(profile_name, available, 0)
    }

    fn route_inner(&self, profile_name: &str, available: &[ModelEntry], depth: u8) -> Option<String> {
        // Guard against cyclic fallback chains in misconfigured profile tables.
        if depth > 8 {
            return None;
        }
        let profile = self.profiles.get(profile_name)?;

        let candidates: Vec<&ModelEntry> = available
            .iter()
            .filter(|model| {
                model.max_context_window >= profile.min_context_window
                    && profile.required_capabilities.iter().all(|cap| model.has_capability(*cap))
            })
            .collect();

        if let Some(best) = score_and_pick(&candidates, profile) {
            return Some(best);
        }

        match &profile.fallback {
            Some(fallback_name) => self.route_inner(fallback_name, available, depth + 1),
            None => None,
        }
    }
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self::new()
    }
}

fn score_and_pick(candidates: &[&ModelEntry], profile: &RoutingProfile) -> Option<String> {
    if candidates.is_empty() {
        return None;
    }

    let min_context = candidates.iter().map(|m| m.max_context_window).min().unwrap_or(1).max(1);

    let mut best: Option<(&ModelEntry, f64)> = None;
    for model in candidates {
        let family_bonus = profile
            .preferred_families
            .iter()
            .position(|family| model.family.eq_ignore_ascii_case(family))
            .map(|index| 10.0 * (profile.preferred_families.len() - index) as f64)
            .unwrap_or(0.0);

        let context_bonus = (f64::from(model.max_context_window) / f64::from(min_context)).log2();
        let score = family_bonus + context_bonus;

        best = match best {
            Some((current_best, current_score)) if current_score > score => Some((current_best, current_score)),
            Some((current_best, current_score)) if (current_score - score).abs() < f64::EPSILON => {
                // Smaller parameters as tiebreaker.
                if model.parameter_count_billion < current_best.parameter_count_billion {
                    Some((model, score))
                } else {
                    Some((current_best, current_score))
                }
            }
            _ => Some((model, score)),
        };
    }

    best.map(|(model, _)| model.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mistral_7b() -> ModelEntry {
        ModelEntry {
            id: "mistral:7b".to_string(),
            name: "Mistral 7B".to_string(),
            family: "mistral".to_string(),
            max_context_window: 8192,
            parameter_count_billion: 7.0,
            context_profiles: vec![],
            capabilities: vec![Capability::Streaming],
        }
    }

    #[test]
    fn s6_routing_falls_back_when_primary_profile_has_no_candidate() {
        let router = ModelRouter::new();
        let available = vec![mistral_7b()];
        assert_eq!(router.route("code", &available), Some("mistral:7b".to_string()));
    }

    #[test]
    fn routing_is_deterministic_given_identical_inputs() {
        let router = ModelRouter::new();
        let available = vec![mistral_7b()];
        let first = router.route("general", &available);
        let second = router.route("general", &available);
        assert_eq!(first, second);
    }

    #[test]
    fn override_wins_even_when_unavailable() {
        let mut router = ModelRouter::new();
        router.set_override("general", "ghost-model");
        assert_eq!(router.route("general", &[]), Some("ghost-model".to_string()));
    }

    #[test]
    fn unknown_profile_without_override_returns_none() {
        let router = ModelRouter::new();
        assert_eq!(router.route("nonexistent", &[mistral_7b()]), None);
    }

    #[test]
    fn capability_filter_excludes_models_missing_required_capabilities() {
        let router = ModelRouter::new();
        let no_streaming = ModelEntry { capabilities: vec![], ..mistral_7b() };
        assert_eq!(router.route("general", &[no_streaming]), None);
    }

    #[test]
    fn builtin_catalog_seeds_the_database() {
        let db = ModelDatabase::with_builtin_catalog();
        assert!(db.get("llama3.1:8b").is_some());
        assert!(db.all().len() >= 4);
    }

    #[test]
    fn user_overrides_merge_on_top_of_builtins_and_win_on_id_collision() {
        let mut db = ModelDatabase::with_builtin_catalog();
        let json = r#"{
            "user_models": [
                {
                    "id": "mistral:7b",
                    "name": "Mistral 7B (custom)",
                    "max_context_window": 65536,
                    "context_profiles": [{"size": 32768, "ollama_context_size": 27852}],
                    "capabilities": {"toolCalling": true, "vision": false, "streaming": true}
                },
                {
                    "id": "custom-model:1b",
                    "name": "Custom Model",
                    "max_context_window": 2048,
                    "capabilities": {"toolCalling": false, "vision": false, "streaming": true}
                }
            ]
        }"#;
        let merged = db.merge_overrides_json(json).unwrap();
        assert_eq!(merged, 2);

        let overridden = db.get("mistral:7b").unwrap();
        assert_eq!(overridden.max_context_window, 65536);
        assert!(overridden.has_capability(Capability::ToolCalling));

        let new_model = db.get("custom-model:1b").unwrap();
        assert_eq!(new_model.family, "custom");
    }

    #[test]
    fn refresh_with_empty_overrides_restores_just_the_builtin_catalog() {
        let mut db = ModelDatabase::with_builtin_catalog();
        db.merge_overrides_json(r#"{"user_models":[{"id":"ghost:1b","name":"Ghost","max_context_window":2048,"capabilities":{"toolCalling":false,"vision":false,"streaming":true}}]}"#).unwrap();
        assert!(db.get("ghost:1b").is_some());

        db.refresh("").unwrap();
        assert!(db.get("ghost:1b").is_none());
        assert!(db.get("llama3.1:8b").is_some());
    }

    #[test]
    fn malformed_overrides_document_is_a_typed_error() {
        let mut db = ModelDatabase::with_builtin_catalog();
        let result = db.merge_overrides_json("not json");
        assert!(matches!(result, Err(ModelDatabaseError::MalformedOverrides(_))));
    }
}
