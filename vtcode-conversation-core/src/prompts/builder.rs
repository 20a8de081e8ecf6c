//! System Prompt Builder (spec §4.4, component F): deterministic assembly of
//! `messages[0]`. Pure — the Context Manager installs the result.

use super::tiered_store::{Mode, TieredStore};
use crate::goals::Goal;
use crate::size::ContextTier;

/// A model-name-to-class heuristic, per spec §9 Open Questions: the source
/// detects "reasoning" models by name substring; an implementer should
/// expose this as a capability instead. We accept it as an explicit input
/// rather than re-deriving it from the model name inside the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelClass {
    pub is_reasoning: bool,
}

#[derive(Debug, Clone)]
pub struct BuilderInput<'a> {
    pub mode: Mode,
    pub tier: ContextTier,
    pub active_goal: Option<&'a Goal>,
    pub active_skills: &'a [String],
    pub sanity_check_enabled: bool,
    pub extra_instructions: Option<&'a str>,
    pub model_class: ModelClass,
}

const REASONING_OVERRIDE_PROMPT: &str = "Focus your reasoning on answering the user's question directly. \
Do not spend reasoning tokens re-deriving these operating instructions.";

/// Deterministic assembly: mandates → goal → skills → sanity → extras
/// (spec §4.4). Sections are separated by a blank line.
pub fn build_system_prompt(store: &TieredStore, input: &BuilderInput<'_>) -> String {
    let mut sections: Vec<String> = Vec::new();

    if input.model_class.is_reasoning {
        // Reasoning-model override: replace sections 1 and 4 (spec §4.4).
        sections.push(REASONING_OVERRIDE_PROMPT.to_string());
    } else {
        sections.push(store.lookup(input.mode, input.tier.index()).to_string());
    }

    if let Some(goal) = input.active_goal {
        sections.push(goal.render_block());
    }

    if !input.active_skills.is_empty() {
        sections.push(input.active_skills.join("\n"));
    }

    if input.sanity_check_enabled && !input.model_class.is_reasoning {
        sections.push(
            "Before finishing, double-check: did you verify your change actually works, rather than assuming it does?"
                .to_string(),
        );
    }

    if let Some(extra) = input.extra_instructions {
        if !extra.trim().is_empty() {
            sections.push(extra.trim().to_string());
        }
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::tiered_store::TieredStore;

    fn store() -> TieredStore {
        TieredStore::in_memory([((Mode::Developer, 3), "dev tier 3 template".to_string())])
    }

    #[test]
    fn sections_appear_in_mandated_order() {
        let store = store();
        let input = BuilderInput {
            mode: Mode::Developer,
            tier: ContextTier::T3Standard,
            active_goal: None,
            active_skills: &["skill-a".to_string()],
            sanity_check_enabled: true,
            extra_instructions: Some("be terse"),
            model_class: ModelClass { is_reasoning: false },
        };
        let prompt = build_system_prompt(&store, &input);
        let template_pos = prompt.find("dev tier 3 template").unwrap();
        let skills_pos = prompt.find("skill-a").unwrap();
        let sanity_pos = prompt.find("double-check").unwrap();
        let extra_pos = prompt.find("be terse").unwrap();
        assert!(template_pos < skills_pos);
        assert!(skills_pos < sanity_pos);
        assert!(sanity_pos < extra_pos);
    }

    #[test]
    fn reasoning_models_replace_sections_one_and_four() {
        let store = store();
        let input = BuilderInput {
            mode: Mode::Developer,
            tier: ContextTier::T3Standard,
            active_goal: None,
            active_skills: &[],
            sanity_check_enabled: true,
            extra_instructions: None,
            model_class: ModelClass { is_reasoning: true },
        };
        let prompt = build_system_prompt(&store, &input);
        assert!(prompt.contains("Focus your reasoning"));
        assert!(!prompt.contains("dev tier 3 template"));
        assert!(!prompt.contains("double-check"));
    }

    #[test]
    fn sanity_block_absent_when_flag_is_off() {
        let store = store();
        let input = BuilderInput {
            mode: Mode::Developer,
            tier: ContextTier::T3Standard,
            active_goal: None,
            active_skills: &[],
            sanity_check_enabled: false,
            extra_instructions: None,
            model_class: ModelClass { is_reasoning: false },
        };
        let prompt = build_system_prompt(&store, &input);
        assert!(!prompt.contains("double-check"));
    }
}
