mod compiled;
mod engine;
mod interpret;
mod interpret_events;
mod types;
mod utils;

#[cfg(test)]
mod tests;

pub use engine::LifecycleHookEngine;
#[allow(unused_imports)]
pub use types::{
    HookMessage, HookMessageLevel, PostToolHookOutcome, PreToolHookDecision, PreToolHookOutcome,
    SessionEndReason, SessionStartHookOutcome, SessionStartTrigger, UserPromptHookOutcome,
};
