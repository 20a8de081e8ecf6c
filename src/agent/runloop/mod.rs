#[allow(dead_code)]
mod context_usage;
mod git;
mod mcp_elicitation;
mod mcp_events;
mod model_picker;
mod prompt;
mod skills_commands;
mod slash_commands;
mod telemetry;
mod text_tools;
mod tool_output;
mod ui;
pub mod unified;
mod welcome;

// Re-export ResumeSession for backward compatibility with modules that import it from runloop
pub use crate::agent::agents::ResumeSession;
pub use skills_commands::{
    SkillCommandAction, SkillCommandOutcome, handle_skill_command, parse_skill_command,
};
