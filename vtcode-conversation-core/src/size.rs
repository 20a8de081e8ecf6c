//! Size Calculator (spec §4.1, component A): pure VRAM/context arithmetic.
//!
//! No I/O, no async. Mirrors the "pre-calculated in LLM_profiles.json" ratio
//! from the source as a single constant per `spec.md` §9's Open Questions.

use serde::{Deserialize, Serialize};

/// Fixed ratio between what the user sees and what is sent as `num_ctx`.
pub const SERVER_RATIO: f64 = 0.85;

/// Valid user-facing context sizes, ascending.
pub const VALID_USER_SIZES: &[u32] = &[2048, 4096, 8192, 16384, 32768, 65536, 131072];

/// Context tiers, driving system-prompt verbosity only (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextTier {
    T1Minimal,
    T2Basic,
    T3Standard,
    T4Premium,
    T5Ultra,
}

impl ContextTier {
    /// Prompt budget, in tokens, allotted to the mode×tier template (spec §3 table).
    pub fn prompt_budget_tokens(self) -> usize {
        match self {
            ContextTier::T1Minimal => 200,
            ContextTier::T2Basic => 500,
            ContextTier::T3Standard => 1000,
            ContextTier::T4Premium => 1500,
            ContextTier::T5Ultra => 1500,
        }
    }

    /// Index into the tiered prompt store's 1..5 tier axis.
    pub fn index(self) -> u8 {
        match self {
            ContextTier::T1Minimal => 1,
            ContextTier::T2Basic => 2,
            ContextTier::T3Standard => 3,
            ContextTier::T4Premium => 4,
            ContextTier::T5Ultra => 5,
        }
    }
}

impl Default for ContextTier {
    fn default() -> Self {
        ContextTier::T3Standard
    }
}

/// Nearest valid size ≤ `proposed`, minimum 2048 (spec §3, "Clamping").
pub fn clamp(proposed: u32) -> u32 {
    VALID_USER_SIZES
        .iter()
        .rev()
        .find(|&&size| size <= proposed)
        .copied()
        .unwrap_or(VALID_USER_SIZES[0])
}

/// Membership test against the valid user-size set.
pub fn is_valid(user_size: u32) -> bool {
    VALID_USER_SIZES.contains(&user_size)
}

/// `round(user_size * 0.85)`.
pub fn server_size(user_size: u32) -> u32 {
    (f64::from(user_size) * SERVER_RATIO).round() as u32
}

/// Inverse of [`server_size`], clamped to the valid set.
pub fn user_size_from_server(server_size: u32) -> u32 {
    let proposed = (f64::from(server_size) / SERVER_RATIO).round() as u32;
    clamp(proposed)
}

/// Table lookup from a valid user size to its tier label (spec §3 table).
pub fn tier_of(user_size: u32) -> ContextTier {
    match user_size {
        0..=4096 => ContextTier::T1Minimal,
        4097..=8192 => ContextTier::T2Basic,
        8193..=16384 => ContextTier::T3Standard,
        16385..=32768 => ContextTier::T4Premium,
        _ => ContextTier::T5Ultra,
    }
}

/// Every tier whose `server_size` fits within `vram_bytes` at `safety_factor`.
pub fn tiers_available(vram_bytes: u64, bytes_per_token: u64, safety_factor: f64) -> Vec<ContextTier> {
    let budget_tokens = ((vram_bytes as f64) * safety_factor / (bytes_per_token.max(1) as f64)) as u32;
    VALID_USER_SIZES
        .iter()
        .filter(|&&user_size| server_size(user_size) <= budget_tokens)
        .map(|&user_size| tier_of(user_size))
        .collect()
}

/// Per-token KV-cache footprint for a model family/quantisation pair.
///
/// A small static table covering the common local-serving families; unknown
/// pairs fall back to a conservative fp16-class estimate.
pub fn bytes_per_token(model_family: &str, quantisation: &str) -> u64 {
    let family = model_family.to_ascii_lowercase();
    let quant = quantisation.to_ascii_lowercase();

    let base: u64 = if family.contains("llama") || family.contains("mistral") || family.contains("qwen") {
        128 * 1024
    } else if family.contains("phi") || family.contains("gemma") {
        96 * 1024
    } else if family.contains("codellama") || family.contains("deepseek") {
        160 * 1024
    } else {
        128 * 1024
    };

    if quant.contains("q4") {
        base / 2
    } else if quant.contains("q8") {
        (base * 3) / 4
    } else {
        base
    }
}

/// `clamp(floor(vram_bytes * safety / bytes_per_token))`, a recommendation only.
pub fn optimal_size(vram_bytes: u64, bytes_per_token: u64, safety: f64) -> u32 {
    let budget_tokens = ((vram_bytes as f64) * safety / (bytes_per_token.max(1) as f64)).floor();
    clamp(budget_tokens as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn server_size_applies_the_fixed_ratio() {
        assert_eq!(server_size(16384), 13926);
        assert_eq!(server_size(32768), 27853);
    }

    #[test]
    fn clamp_picks_nearest_lower_or_equal_valid_size() {
        assert_eq!(clamp(1000), 2048);
        assert_eq!(clamp(5000), 4096);
        assert_eq!(clamp(200_000), 131072);
        assert_eq!(clamp(0), 2048);
    }

    #[test]
    fn tier_mapping_matches_spec_table() {
        assert_eq!(tier_of(2048).index(), 1);
        assert_eq!(tier_of(4096).index(), 1);
        assert_eq!(tier_of(8192).index(), 2);
        assert_eq!(tier_of(16384).index(), 3);
        assert_eq!(tier_of(32768).index(), 4);
        assert_eq!(tier_of(65536).index(), 5);
        assert_eq!(tier_of(131072).index(), 5);
    }

    #[test]
    fn resize_scenario_s1() {
        // S1: T3 at 16384 -> user sets 32768 -> T4, server_size 27200-ish (round(32768*.85)).
        assert_eq!(tier_of(32768), ContextTier::T4Premium);
        assert_eq!(server_size(32768), 27853);
    }

    #[test]
    fn is_valid_rejects_non_member_sizes() {
        assert!(is_valid(8192));
        assert!(!is_valid(8000));
    }

    #[test]
    fn optimal_size_never_exceeds_clamp_ceiling() {
        let size = optimal_size(4 * 1024 * 1024 * 1024, bytes_per_token("llama", "q4"), 0.85);
        assert!(is_valid(size));
    }
}
