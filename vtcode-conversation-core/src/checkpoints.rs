//! Checkpoint data model and Checkpoint Lifecycle (spec §3, §4.7, component I).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::summarize::{SummarizationError, SummarizationService, SummaryResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CompressionLevel {
    L1Compact = 1,
    L2Reduced = 2,
    L3Standard = 3,
}

impl CompressionLevel {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::L1Compact),
            2 => Some(Self::L2Reduced),
            3 => Some(Self::L3Standard),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub originating_model: String,
    pub created_at: DateTime<Utc>,
    pub compressed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    pub original_message_ids: Vec<Uuid>,
    pub token_count: usize,
    pub level: CompressionLevel,
    pub compression_number: u64,
    pub metadata: CheckpointMetadata,
}

/// Target level given how many compression events have elapsed since a
/// checkpoint was created (spec §4.7, "Age"). `l1_threshold`/`l2_threshold`
/// come from [`crate::config::ConversationCoreConfig`] so a deployment can
/// retune the aging curve without recompiling.
pub fn target_level_for_age(age: u64, l1_threshold: u64, l2_threshold: u64) -> CompressionLevel {
    if age >= l1_threshold {
        CompressionLevel::L1Compact
    } else if age >= l2_threshold {
        CompressionLevel::L2Reduced
    } else {
        CompressionLevel::L3Standard
    }
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("merge requires at least 2 checkpoints, got {0}")]
    NotEnoughToMerge(usize),
    #[error("cannot compress to the same or a higher level")]
    InvalidTargetLevel,
    #[error("summarization failed: {0}")]
    Summarization(#[from] SummarizationError),
}

#[derive(Debug, Clone)]
pub struct AgeResult {
    pub original_id: Uuid,
    pub aged_checkpoint: Checkpoint,
    pub new_level: CompressionLevel,
    pub tokens_freed: usize,
}

/// Checkpoints whose level exceeds their age-derived target (spec §4.7).
pub fn checkpoints_needing_aging(checkpoints: &[Checkpoint], compression_number: u64, l1_threshold: u64, l2_threshold: u64) -> Vec<&Checkpoint> {
    checkpoints
        .iter()
        .filter(|checkpoint| {
            let age = compression_number.saturating_sub(checkpoint.compression_number);
            checkpoint.level > target_level_for_age(age, l1_threshold, l2_threshold)
        })
        .collect()
}

/// L1 checkpoints iff at least `min_count` are present, else empty (spec §4.7).
pub fn checkpoints_eligible_for_merging(checkpoints: &[Checkpoint], min_count: usize) -> Vec<&Checkpoint> {
    let l1: Vec<&Checkpoint> = checkpoints.iter().filter(|c| c.level == CompressionLevel::L1Compact).collect();
    if l1.len() >= min_count { l1 } else { Vec::new() }
}

/// Re-summarise every checkpoint whose level exceeds its age-derived target
/// (spec §4.7, "Age"). Idempotent on failure: an error leaves `checkpoints`
/// conceptually unchanged from the caller's perspective — callers apply the
/// returned results themselves rather than having this function mutate in
/// place, so a partial failure can simply be discarded.
pub async fn age_checkpoints(
    summarizer: &dyn SummarizationService,
    checkpoints: &[Checkpoint],
    compression_number: u64,
    l1_threshold: u64,
    l2_threshold: u64,
) -> Vec<AgeResult> {
    let mut results = Vec::new();
    for checkpoint in checkpoints {
        let age = compression_number.saturating_sub(checkpoint.compression_number);
        let target = target_level_for_age(age, l1_threshold, l2_threshold);
        if checkpoint.level <= target {
            continue;
        }

        let summary = match summarizer.summarize_text(&checkpoint.summary, target).await {
            Ok(summary) => summary,
            Err(_) => continue,
        };

        let tokens_freed = checkpoint.token_count.saturating_sub(summary.token_count);
        let aged = Checkpoint {
            id: checkpoint.id,
            timestamp: checkpoint.timestamp,
            summary: summary.summary,
            original_message_ids: checkpoint.original_message_ids.clone(),
            token_count: summary.token_count,
            level: target,
            compression_number: checkpoint.compression_number,
            metadata: CheckpointMetadata {
                originating_model: summary.model,
                created_at: checkpoint.metadata.created_at,
                compressed_at: Utc::now(),
            },
        };

        results.push(AgeResult {
            original_id: checkpoint.id,
            aged_checkpoint: aged,
            new_level: target,
            tokens_freed,
        });
    }
    results
}

/// Merge `k >= 2` checkpoints into one new L1 checkpoint (spec §4.7, "Merge").
pub async fn merge_checkpoints(
    summarizer: &dyn SummarizationService,
    checkpoints: &[Checkpoint],
) -> Result<(Checkpoint, usize), CheckpointError> {
    if checkpoints.len() < 2 {
        return Err(CheckpointError::NotEnoughToMerge(checkpoints.len()));
    }

    let concatenated: String = checkpoints.iter().map(|c| c.summary.as_str()).collect::<Vec<_>>().join("\n\n");
    let summary = summarizer.summarize_text(&concatenated, CompressionLevel::L1Compact).await?;

    let total_input_tokens: usize = checkpoints.iter().map(|c| c.token_count).sum();
    let tokens_freed = total_input_tokens.saturating_sub(summary.token_count);

    let merged = Checkpoint {
        id: Uuid::new_v4(),
        timestamp: Utc::now(),
        summary: summary.summary,
        original_message_ids: checkpoints.iter().flat_map(|c| c.original_message_ids.clone()).collect(),
        token_count: summary.token_count,
        level: CompressionLevel::L1Compact,
        compression_number: checkpoints.iter().map(|c| c.compression_number).max().unwrap_or(0),
        metadata: CheckpointMetadata {
            originating_model: summary.model,
            created_at: Utc::now(),
            compressed_at: Utc::now(),
        },
    };

    Ok((merged, tokens_freed))
}

/// Recompress one checkpoint to a strictly lower level (spec §4.7, "Compress").
pub async fn compress_single(
    summarizer: &dyn SummarizationService,
    checkpoint: &Checkpoint,
    target_level: CompressionLevel,
) -> Result<(Checkpoint, usize), CheckpointError> {
    if target_level >= checkpoint.level {
        return Err(CheckpointError::InvalidTargetLevel);
    }

    let summary = summarizer.summarize_text(&checkpoint.summary, target_level).await?;
    let tokens_freed = checkpoint.token_count.saturating_sub(summary.token_count);

    let recompressed = Checkpoint {
        id: checkpoint.id,
        timestamp: checkpoint.timestamp,
        summary: summary.summary,
        original_message_ids: checkpoint.original_message_ids.clone(),
        token_count: summary.token_count,
        level: target_level,
        compression_number: checkpoint.compression_number,
        metadata: CheckpointMetadata {
            originating_model: summary.model,
            created_at: checkpoint.metadata.created_at,
            compressed_at: Utc::now(),
        },
    };

    Ok((recompressed, tokens_freed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarize::MockSummarizer;

    fn checkpoint(compression_number: u64, level: CompressionLevel, token_count: usize) -> Checkpoint {
        Checkpoint {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            summary: "decided to use sqlite for persistence".to_string(),
            original_message_ids: vec![Uuid::new_v4()],
            token_count,
            level,
            compression_number,
            metadata: CheckpointMetadata {
                originating_model: "llama3:8b".to_string(),
                created_at: Utc::now(),
                compressed_at: Utc::now(),
            },
        }
    }

    #[test]
    fn s5_aging_targets_match_spec_table() {
        // N=12, compressionNumber in {0,1,2,5,9} => ages {12,11,10,7,3} => targets {1,1,1,2,3}.
        let ages_and_targets = [(12, CompressionLevel::L1Compact), (11, CompressionLevel::L1Compact), (10, CompressionLevel::L1Compact), (7, CompressionLevel::L2Reduced), (3, CompressionLevel::L3Standard)];
        for (age, expected) in ages_and_targets {
            assert_eq!(target_level_for_age(age, 10, 5), expected);
        }
    }

    #[tokio::test]
    async fn s5_aging_skips_checkpoints_already_at_or_below_target() {
        let checkpoints = vec![
            checkpoint(0, CompressionLevel::L3Standard, 1000),
            checkpoint(1, CompressionLevel::L3Standard, 1000),
            checkpoint(2, CompressionLevel::L3Standard, 1000),
            checkpoint(5, CompressionLevel::L3Standard, 1000),
            checkpoint(9, CompressionLevel::L3Standard, 1000),
        ];
        let summarizer = MockSummarizer::shrinking();
        let results = age_checkpoints(&summarizer, &checkpoints, 12, 10, 5).await;
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.tokens_freed > 0));
    }

    #[tokio::test]
    async fn merge_fails_with_fewer_than_two_checkpoints() {
        let summarizer = MockSummarizer::shrinking();
        let result = merge_checkpoints(&summarizer, &[checkpoint(1, CompressionLevel::L1Compact, 100)]).await;
        assert!(matches!(result, Err(CheckpointError::NotEnoughToMerge(1))));
    }

    #[tokio::test]
    async fn merge_concatenates_message_ids_and_takes_max_compression_number() {
        let a = checkpoint(3, CompressionLevel::L1Compact, 100);
        let b = checkpoint(7, CompressionLevel::L1Compact, 120);
        let expected_ids: Vec<Uuid> = a.original_message_ids.iter().chain(b.original_message_ids.iter()).copied().collect();

        let summarizer = MockSummarizer::shrinking();
        let (merged, tokens_freed) = merge_checkpoints(&summarizer, &[a, b]).await.unwrap();

        assert_eq!(merged.original_message_ids, expected_ids);
        assert_eq!(merged.level, CompressionLevel::L1Compact);
        assert_eq!(merged.compression_number, 7);
        assert!(tokens_freed > 0);
        assert!(merged.token_count < 220);
    }

    #[tokio::test]
    async fn compress_single_rejects_same_or_higher_target_level() {
        let summarizer = MockSummarizer::shrinking();
        let checkpoint = checkpoint(1, CompressionLevel::L2Reduced, 100);
        let result = compress_single(&summarizer, &checkpoint, CompressionLevel::L2Reduced).await;
        assert!(matches!(result, Err(CheckpointError::InvalidTargetLevel)));
        let result = compress_single(&summarizer, &checkpoint, CompressionLevel::L3Standard).await;
        assert!(matches!(result, Err(CheckpointError::InvalidTargetLevel)));
    }
}
