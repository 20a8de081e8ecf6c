//! Emergency Actions (spec §4.9, component K): snapshot-guarded last-resort
//! operations to free context space. All four actions create a snapshot
//! before any destructive work (Property 6, Property 19).

use uuid::Uuid;

use crate::checkpoints::{self, Checkpoint, CheckpointError, CompressionLevel};
use crate::goals::Goal;
use crate::message::Message;
use crate::prompts::Mode;
use crate::size::ContextTier;
use crate::snapshot::{Snapshot, SnapshotError, SnapshotReason, SnapshotStore};
use crate::summarize::{SummarizationService, SummaryResult};

#[derive(Debug, Clone, Copy)]
pub struct EmergencyContext {
    pub tier: ContextTier,
    pub mode: Mode,
    pub user_size: u32,
}

async fn safety_snapshot(
    store: &dyn SnapshotStore,
    messages: &[Message],
    checkpoints: &[Checkpoint],
    goal: Option<&Goal>,
    ctx: &EmergencyContext,
    reason: SnapshotReason,
) -> Result<Uuid, SnapshotError> {
    let snapshot = Snapshot {
        id: Uuid::new_v4(),
        messages: messages.to_vec(),
        checkpoints: checkpoints.to_vec(),
        active_goal: goal.cloned(),
        tier: ctx.tier,
        mode: ctx.mode,
        user_size: ctx.user_size,
        reason,
        created_at: chrono::Utc::now(),
    };
    store.create(snapshot).await
}

#[derive(Debug, Clone)]
pub struct ActionResult {
    pub action: &'static str,
    pub success: bool,
    pub tokens_freed: usize,
    pub snapshot_id: String,
    pub details: Option<String>,
    pub error: Option<String>,
}

/// `compress_checkpoint`: aggressive recompress of `checkpoint` to L1 (spec §4.9).
pub async fn compress_checkpoint(
    store: &dyn SnapshotStore,
    summarizer: &dyn SummarizationService,
    checkpoint: &Checkpoint,
    all_messages: &[Message],
    all_checkpoints: &[Checkpoint],
    goal: Option<&Goal>,
    ctx: &EmergencyContext,
) -> ActionResult {
    let snapshot_id = match safety_snapshot(store, all_messages, all_checkpoints, goal, ctx, SnapshotReason::Emergency).await {
        Ok(id) => id,
        Err(err) => return failure("compress", err.to_string()),
    };

    match checkpoints::compress_single(summarizer, checkpoint, CompressionLevel::L1Compact).await {
        Ok((_, tokens_freed)) if tokens_freed > 0 => ActionResult {
            action: "compress",
            success: true,
            tokens_freed,
            snapshot_id: snapshot_id.to_string(),
            details: None,
            error: None,
        },
        Ok((_, tokens_freed)) => ActionResult {
            action: "compress",
            success: false,
            tokens_freed,
            snapshot_id: snapshot_id.to_string(),
            details: None,
            error: Some("recompression freed no tokens".to_string()),
        },
        Err(err) => ActionResult {
            action: "compress",
            success: false,
            tokens_freed: 0,
            snapshot_id: snapshot_id.to_string(),
            details: None,
            error: Some(checkpoint_error_message(err)),
        },
    }
}

/// `merge_checkpoints`: requires k >= 2 (spec §4.9).
pub async fn merge_checkpoints(
    store: &dyn SnapshotStore,
    summarizer: &dyn SummarizationService,
    targets: &[Checkpoint],
    all_messages: &[Message],
    all_checkpoints: &[Checkpoint],
    goal: Option<&Goal>,
    ctx: &EmergencyContext,
) -> ActionResult {
    let snapshot_id = match safety_snapshot(store, all_messages, all_checkpoints, goal, ctx, SnapshotReason::Emergency).await {
        Ok(id) => id,
        Err(err) => return failure("merge", err.to_string()),
    };

    if targets.len() < 2 {
        return ActionResult {
            action: "merge",
            success: false,
            tokens_freed: 0,
            snapshot_id: snapshot_id.to_string(),
            details: None,
            error: Some("merge requires at least 2 checkpoints".to_string()),
        };
    }

    match checkpoints::merge_checkpoints(summarizer, targets).await {
        Ok((merged, tokens_freed)) => ActionResult {
            action: "merge",
            success: true,
            tokens_freed,
            snapshot_id: snapshot_id.to_string(),
            details: Some(format!("merged into checkpoint {}", merged.id)),
            error: None,
        },
        Err(err) => ActionResult {
            action: "merge",
            success: false,
            tokens_freed: 0,
            snapshot_id: snapshot_id.to_string(),
            details: None,
            error: Some(checkpoint_error_message(err)),
        },
    }
}

#[derive(Debug, Clone)]
pub struct RolloverResult {
    pub snapshot_id: String,
    pub messages_archived: usize,
    pub checkpoints_archived: usize,
    pub tokens_freed: usize,
    pub success: bool,
    pub error: Option<String>,
}

/// `emergency_rollover`: discards all but the last `keep_recent` messages and
/// all checkpoints, which live on in the snapshot (spec §4.9, S7).
pub async fn emergency_rollover(
    store: &dyn SnapshotStore,
    messages: &[Message],
    checkpoints: &[Checkpoint],
    goal: Option<&Goal>,
    ctx: &EmergencyContext,
    keep_recent: usize,
) -> (RolloverResult, Vec<Message>) {
    let snapshot_id = match safety_snapshot(store, messages, checkpoints, goal, ctx, SnapshotReason::Rollover).await {
        Ok(id) => id,
        Err(err) => {
            return (
                RolloverResult {
                    snapshot_id: String::new(),
                    messages_archived: 0,
                    checkpoints_archived: 0,
                    tokens_freed: 0,
                    success: false,
                    error: Some(err.to_string()),
                },
                messages.to_vec(),
            );
        }
    };

    let keep_from = messages.len().saturating_sub(keep_recent);
    let messages_archived = keep_from;
    let retained: Vec<Message> = messages[keep_from..].to_vec();
    let archived_tokens: usize = messages[..keep_from].iter().map(crate::estimator::estimate_message).sum();
    let checkpoint_tokens: usize = checkpoints.iter().map(|c| c.token_count).sum();
    let tokens_freed = archived_tokens + checkpoint_tokens;

    (
        RolloverResult {
            snapshot_id: snapshot_id.to_string(),
            messages_archived,
            checkpoints_archived: checkpoints.len(),
            tokens_freed,
            success: true,
            error: None,
        },
        retained,
    )
}

#[derive(Debug, Clone)]
pub struct AggressiveSummarizationResult {
    pub messages_summarized: usize,
    pub original_tokens: usize,
    pub summarized_tokens: usize,
    pub tokens_freed: usize,
    pub checkpoint: Option<Checkpoint>,
    pub success: bool,
    pub error: Option<String>,
}

/// `aggressive_summarization`: empty input fails (spec §4.9).
pub async fn aggressive_summarization(
    store: &dyn SnapshotStore,
    summarizer: &dyn SummarizationService,
    messages_subset: &[Message],
    all_messages: &[Message],
    all_checkpoints: &[Checkpoint],
    goal: Option<&Goal>,
    ctx: &EmergencyContext,
) -> AggressiveSummarizationResult {
    let snapshot_result = safety_snapshot(store, all_messages, all_checkpoints, goal, ctx, SnapshotReason::Emergency).await;
    if let Err(err) = snapshot_result {
        return AggressiveSummarizationResult {
            messages_summarized: 0,
            original_tokens: 0,
            summarized_tokens: 0,
            tokens_freed: 0,
            checkpoint: None,
            success: false,
            error: Some(err.to_string()),
        };
    }

    if messages_subset.is_empty() {
        return AggressiveSummarizationResult {
            messages_summarized: 0,
            original_tokens: 0,
            summarized_tokens: 0,
            tokens_freed: 0,
            checkpoint: None,
            success: false,
            error: Some("no messages to summarize".to_string()),
        };
    }

    let original_tokens: usize = messages_subset.iter().map(crate::estimator::estimate_message).sum();

    let summary: SummaryResult = match summarizer.summarize_messages(CompressionLevel::L1Compact, messages_subset).await {
        Ok(summary) => summary,
        Err(err) => {
            return AggressiveSummarizationResult {
                messages_summarized: 0,
                original_tokens,
                summarized_tokens: 0,
                tokens_freed: 0,
                checkpoint: None,
                success: false,
                error: Some(err.to_string()),
            };
        }
    };

    let checkpoint = Checkpoint {
        id: Uuid::new_v4(),
        timestamp: chrono::Utc::now(),
        summary: summary.summary,
        original_message_ids: messages_subset.iter().map(|m| m.id).collect(),
        token_count: summary.token_count,
        level: CompressionLevel::L1Compact,
        compression_number: all_checkpoints.iter().map(|c| c.compression_number).max().unwrap_or(0) + 1,
        metadata: crate::checkpoints::CheckpointMetadata {
            originating_model: summary.model,
            created_at: chrono::Utc::now(),
            compressed_at: chrono::Utc::now(),
        },
    };

    let tokens_freed = original_tokens.saturating_sub(summary.token_count);

    AggressiveSummarizationResult {
        messages_summarized: messages_subset.len(),
        original_tokens,
        summarized_tokens: summary.token_count,
        tokens_freed,
        checkpoint: Some(checkpoint),
        success: true,
        error: None,
    }
}

fn failure(action: &'static str, error: String) -> ActionResult {
    ActionResult { action, success: false, tokens_freed: 0, snapshot_id: String::new(), details: None, error: Some(error) }
}

fn checkpoint_error_message(err: CheckpointError) -> String {
    err.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::InMemorySnapshotStore;
    use crate::summarize::MockSummarizer;

    fn ctx() -> EmergencyContext {
        EmergencyContext { tier: ContextTier::T3Standard, mode: Mode::Developer, user_size: 16384 }
    }

    fn make_messages(n: usize) -> Vec<Message> {
        (0..n).map(|i| Message::user(format!("message number {i} with some padding text"))).collect()
    }

    #[tokio::test]
    async fn s7_rollover_archives_all_but_keep_recent() {
        let store = InMemorySnapshotStore::new();
        let messages = make_messages(40);
        let checkpoints: Vec<Checkpoint> = Vec::new();
        let (result, retained) = emergency_rollover(&store, &messages, &checkpoints, None, &ctx(), 5).await;
        assert!(result.success);
        assert_eq!(result.messages_archived, 35);
        assert_eq!(result.checkpoints_archived, 0);
        assert_eq!(retained.len(), 5);
    }

    #[tokio::test]
    async fn aggressive_summarization_fails_on_empty_input() {
        let store = InMemorySnapshotStore::new();
        let summarizer = MockSummarizer::shrinking();
        let result = aggressive_summarization(&store, &summarizer, &[], &[], &[], None, &ctx()).await;
        assert!(!result.success);
        assert_eq!(result.tokens_freed, 0);
        assert!(!store.list().await.unwrap().is_empty(), "safety snapshot is still created on failure of the action itself");
    }

    #[tokio::test]
    async fn aggressive_summarization_succeeds_and_frees_tokens() {
        let store = InMemorySnapshotStore::new();
        let summarizer = MockSummarizer::shrinking();
        let subset = make_messages(10);
        let result = aggressive_summarization(&store, &summarizer, &subset, &subset, &[], None, &ctx()).await;
        assert!(result.success);
        assert!(result.tokens_freed > 0);
        assert!(result.checkpoint.is_some());
    }

    #[tokio::test]
    async fn merge_requiring_fewer_than_two_fails_without_freeing_tokens() {
        let store = InMemorySnapshotStore::new();
        let summarizer = MockSummarizer::shrinking();
        let result = merge_checkpoints(&store, &summarizer, &[], &[], &[], None, &ctx()).await;
        assert!(!result.success);
        assert_eq!(result.tokens_freed, 0);
        assert!(!result.snapshot_id.is_empty());
    }
}
