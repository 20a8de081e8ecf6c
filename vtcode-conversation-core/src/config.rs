//! Tunable configuration surface (`SPEC_FULL.md` §2, "Config surface").
//!
//! The spec's thresholds and factors (§3, §4.1, §4.9, §4.10, §5) are given
//! as literal numbers; this struct exposes them as overridable, serde-backed
//! fields the same way `vtcode_config::timeouts::TimeoutsConfig` exposes
//! ceiling/decay constants, so a deployment can tune without recompiling.
//! Defaults reproduce the spec's literals exactly.
//!
//! Threaded into [`crate::context_manager::ContextManager::with_config`],
//! [`crate::agent_loop::AgentLoop::with_config`],
//! [`crate::tools::ToolRegistry::with_config`], and
//! [`crate::provider::ollama::OllamaAdapter::with_config`] — the `new`/
//! `with_hooks` constructors on each of those delegate to their `with_config`
//! counterpart with [`ConversationCoreConfig::default`], so existing call
//! sites keep the spec's literal behavior unless they opt into overrides.
//! `kv_safety_factor` is the exception: it is a default handed to the pure
//! sizing functions in [`crate::size`] (`optimal_size`, `tiers_available`),
//! which already take a safety factor as an explicit argument, so the
//! embedding application reads it from here and passes it through rather
//! than this crate calling itself.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ConversationCoreConfig {
    /// `server_size = round(user_size * ratio)` (spec §3).
    #[serde(default = "ConversationCoreConfig::default_server_ratio")]
    pub server_ratio: f64,
    /// KV-cache sizing safety margin (spec §3, "KV Cache Model").
    #[serde(default = "ConversationCoreConfig::default_kv_safety_factor")]
    pub kv_safety_factor: f64,
    /// Normal-compression trigger, as a fraction of `server_size` (spec §4.10).
    #[serde(default = "ConversationCoreConfig::default_compression_threshold")]
    pub compression_threshold: f64,
    /// Informational low-usage warning threshold (spec §4.10).
    #[serde(default = "ConversationCoreConfig::default_warning_low_threshold")]
    pub warning_low_threshold: f64,
    /// Emergency-compression trigger threshold (spec §4.10).
    #[serde(default = "ConversationCoreConfig::default_warning_critical_threshold")]
    pub warning_critical_threshold: f64,
    /// Emergency-rollover trigger threshold (spec §4.10).
    #[serde(default = "ConversationCoreConfig::default_rollover_threshold")]
    pub rollover_threshold: f64,
    /// Age (in compression events) at or above which a checkpoint targets L1 (spec §4.7).
    #[serde(default = "ConversationCoreConfig::default_age_l1_threshold")]
    pub age_l1_threshold: u64,
    /// Age at or above which a checkpoint targets L2 (spec §4.7).
    #[serde(default = "ConversationCoreConfig::default_age_l2_threshold")]
    pub age_l2_threshold: u64,
    /// Minimum accumulated L1 checkpoints before merging is offered (spec §4.7).
    #[serde(default = "ConversationCoreConfig::default_merge_min_count")]
    pub merge_min_count: usize,
    /// Messages retained live by `emergency_rollover` (spec §4.9).
    #[serde(default = "ConversationCoreConfig::default_rollover_keep_recent")]
    pub rollover_keep_recent: usize,
    /// Default per-tool execution timeout, in seconds (spec §4.11).
    #[serde(default = "ConversationCoreConfig::default_tool_timeout_seconds")]
    pub tool_timeout_seconds: u64,
    /// Overall-turn timeout, in seconds (spec §5).
    #[serde(default = "ConversationCoreConfig::default_turn_timeout_seconds")]
    pub turn_timeout_seconds: u64,
    /// Single-frame receive timeout, in seconds (spec §5).
    #[serde(default = "ConversationCoreConfig::default_frame_timeout_seconds")]
    pub frame_timeout_seconds: u64,
    /// Summarization request timeout, in seconds (spec §5).
    #[serde(default = "ConversationCoreConfig::default_summarization_timeout_seconds")]
    pub summarization_timeout_seconds: u64,
    /// Default multi-turn ceiling for the Agent Loop (spec §4.12).
    #[serde(default = "ConversationCoreConfig::default_max_turns")]
    pub max_turns: u8,
    /// Local LLM server base URL (spec §6.5).
    #[serde(default = "ConversationCoreConfig::default_base_url")]
    pub base_url: String,
}

impl Default for ConversationCoreConfig {
    fn default() -> Self {
        Self {
            server_ratio: Self::default_server_ratio(),
            kv_safety_factor: Self::default_kv_safety_factor(),
            compression_threshold: Self::default_compression_threshold(),
            warning_low_threshold: Self::default_warning_low_threshold(),
            warning_critical_threshold: Self::default_warning_critical_threshold(),
            rollover_threshold: Self::default_rollover_threshold(),
            age_l1_threshold: Self::default_age_l1_threshold(),
            age_l2_threshold: Self::default_age_l2_threshold(),
            merge_min_count: Self::default_merge_min_count(),
            rollover_keep_recent: Self::default_rollover_keep_recent(),
            tool_timeout_seconds: Self::default_tool_timeout_seconds(),
            turn_timeout_seconds: Self::default_turn_timeout_seconds(),
            frame_timeout_seconds: Self::default_frame_timeout_seconds(),
            summarization_timeout_seconds: Self::default_summarization_timeout_seconds(),
            max_turns: Self::default_max_turns(),
            base_url: Self::default_base_url(),
        }
    }
}

impl ConversationCoreConfig {
    const fn default_server_ratio() -> f64 {
        crate::size::SERVER_RATIO
    }
    const fn default_kv_safety_factor() -> f64 {
        0.85
    }
    const fn default_compression_threshold() -> f64 {
        0.70
    }
    const fn default_warning_low_threshold() -> f64 {
        0.80
    }
    const fn default_warning_critical_threshold() -> f64 {
        0.95
    }
    const fn default_rollover_threshold() -> f64 {
        1.00
    }
    const fn default_age_l1_threshold() -> u64 {
        10
    }
    const fn default_age_l2_threshold() -> u64 {
        5
    }
    const fn default_merge_min_count() -> usize {
        3
    }
    const fn default_rollover_keep_recent() -> usize {
        5
    }
    const fn default_tool_timeout_seconds() -> u64 {
        30
    }
    const fn default_turn_timeout_seconds() -> u64 {
        600
    }
    const fn default_frame_timeout_seconds() -> u64 {
        30
    }
    const fn default_summarization_timeout_seconds() -> u64 {
        60
    }
    const fn default_max_turns() -> u8 {
        5
    }
    fn default_base_url() -> String {
        crate::provider::ollama::DEFAULT_BASE_URL.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_literals() {
        let config = ConversationCoreConfig::default();
        assert_eq!(config.server_ratio, 0.85);
        assert_eq!(config.compression_threshold, 0.70);
        assert_eq!(config.warning_low_threshold, 0.80);
        assert_eq!(config.warning_critical_threshold, 0.95);
        assert_eq!(config.rollover_threshold, 1.00);
        assert_eq!(config.age_l1_threshold, 10);
        assert_eq!(config.age_l2_threshold, 5);
        assert_eq!(config.rollover_keep_recent, 5);
        assert_eq!(config.max_turns, 5);
    }

    #[test]
    fn deserializes_from_partial_json_using_defaults() {
        let config: ConversationCoreConfig = serde_json::from_str(r#"{"compression_threshold": 0.60}"#).unwrap();
        assert_eq!(config.compression_threshold, 0.60);
        assert_eq!(config.server_ratio, 0.85);
    }

    #[test]
    fn round_trips_through_json() {
        let config = ConversationCoreConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ConversationCoreConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }
}
