//! Domain events emitted by the Context Manager (spec §6.2). Consumers (UI,
//! hooks) see a totally ordered log — callers choose the channel.

use uuid::Uuid;

use crate::prompts::Mode;
use crate::size::ContextTier;

#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    TierChanged { new_tier: ContextTier },
    ModeChanged { new_mode: Mode },
    SystemPromptUpdated { tier: ContextTier, mode: Mode },
    ContextWarningLow { usage_pct: f64 },
    MemoryWarning { usage_pct: f64 },
    ContextWarningCritical { usage_pct: f64 },
    Compressed { new_checkpoint_id: Uuid, tokens_freed: usize },
    Summarizing { phase: String },
    AutoSummaryFailed { error: String },
    SessionSaved { snapshot_id: Uuid },
    TurnAborted { reason: String },
    ToolApprovalRequested { tool: String, args: serde_json::Value },
}
