//! Context Manager (spec §4.10, component L): sole owner of the live
//! context. Routes threshold events, selects compression strategy, and owns
//! E/F/G/H/I/J/K. No external reference to internal vectors is ever handed
//! out (spec §5, "Shared resource policy").

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::checkpoints::{self, Checkpoint, CompressionLevel};
use crate::config::ConversationCoreConfig;
use crate::emergency::{self, EmergencyContext};
use crate::estimator;
use crate::events::DomainEvent;
use crate::goals::{Goal, GoalManager};
use crate::message::Message;
use crate::prompts::{BuilderInput, ModelClass, Mode, PromptRegistry, TieredStore, build_system_prompt};
use crate::size::{self, ContextTier};
use crate::snapshot::{Snapshot, SnapshotReason, SnapshotStore};
use crate::summarize::SummarizationService;

#[derive(Debug, Error)]
pub enum ContextManagerError {
    #[error("operation rejected: a streaming turn is in progress")]
    StreamInProgress,
    #[error("snapshot operation failed: {0}")]
    Snapshot(#[from] crate::snapshot::SnapshotError),
}

/// Deferred mutation queued while a turn is streaming (spec §5, "Mid-stream
/// invariants"); applied the moment `end_turn` is called.
#[derive(Debug, Clone)]
enum PendingChange {
    UserSize(u32),
    Mode(Mode),
}

pub struct ContextManager {
    messages: Vec<Message>,
    checkpoints: Vec<Checkpoint>,
    compression_number: u64,
    user_size: u32,
    tier: ContextTier,
    mode: Mode,
    goals: GoalManager,
    tiered_store: TieredStore,
    prompt_registry: PromptRegistry,
    summarizer: Arc<dyn SummarizationService>,
    snapshot_store: Arc<dyn SnapshotStore>,
    streaming: bool,
    pending: Vec<PendingChange>,
    events: Vec<DomainEvent>,
    config: ConversationCoreConfig,
}

impl ContextManager {
    pub fn new(
        user_size: u32,
        mode: Mode,
        tiered_store: TieredStore,
        summarizer: Arc<dyn SummarizationService>,
        snapshot_store: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self::with_config(user_size, mode, tiered_store, summarizer, snapshot_store, ConversationCoreConfig::default())
    }

    /// Same as [`Self::new`] but with every threshold/timing knob in
    /// [`ConversationCoreConfig`] overridable instead of defaulted.
    pub fn with_config(
        user_size: u32,
        mode: Mode,
        tiered_store: TieredStore,
        summarizer: Arc<dyn SummarizationService>,
        snapshot_store: Arc<dyn SnapshotStore>,
        config: ConversationCoreConfig,
    ) -> Self {
        let user_size = size::clamp(user_size);
        let tier = size::tier_of(user_size);
        let mut manager = Self {
            messages: Vec::new(),
            checkpoints: Vec::new(),
            compression_number: 0,
            user_size,
            tier,
            mode,
            goals: GoalManager::new(),
            tiered_store,
            prompt_registry: PromptRegistry::new(),
            summarizer,
            snapshot_store,
            streaming: false,
            pending: Vec::new(),
            events: Vec::new(),
            config,
        };
        let prompt = manager.rebuild_system_prompt(ModelClass { is_reasoning: false });
        manager.messages.push(Message::system(prompt));
        manager
    }

    pub fn config(&self) -> &ConversationCoreConfig {
        &self.config
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn active_goal(&self) -> Option<&Goal> {
        self.goals.active_goal()
    }

    pub fn goals_mut(&mut self) -> &mut GoalManager {
        &mut self.goals
    }

    pub fn prompt_registry_mut(&mut self) -> &mut PromptRegistry {
        &mut self.prompt_registry
    }

    pub fn tier(&self) -> ContextTier {
        self.tier
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn server_size(&self) -> u32 {
        (f64::from(self.user_size) * self.config.server_ratio).round() as u32
    }

    pub fn drain_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    /// Exposed crate-wide (not just to this module) so `AgentLoop` can push
    /// turn-lifecycle events (`turn-aborted`, `tool-approval-requested`) into
    /// the same ordered log without `ContextManager` needing to know about
    /// the Agent Loop's internals.
    pub(crate) fn emit(&mut self, event: DomainEvent) {
        self.events.push(event);
    }

    fn rebuild_system_prompt(&self, model_class: ModelClass) -> String {
        let input = BuilderInput {
            mode: self.mode,
            tier: self.tier,
            active_goal: self.goals.active_goal(),
            active_skills: &[],
            sanity_check_enabled: true,
            extra_instructions: None,
            model_class,
        };
        build_system_prompt(&self.tiered_store, &input)
    }

    fn replace_system_prompt(&mut self) {
        let prompt = self.rebuild_system_prompt(ModelClass { is_reasoning: false });
        if let Some(first) = self.messages.first_mut() {
            *first = Message::system(prompt);
        } else {
            self.messages.insert(0, Message::system(prompt));
        }
        self.emit(DomainEvent::SystemPromptUpdated { tier: self.tier, mode: self.mode });
    }

    /// `set_user_size` (spec §4.10, "Resize flow"). Rejected mid-stream.
    pub fn set_user_size(&mut self, new_size: u32) -> Result<(), ContextManagerError> {
        if self.streaming {
            self.pending.push(PendingChange::UserSize(new_size));
            return Err(ContextManagerError::StreamInProgress);
        }
        self.apply_user_size(new_size);
        Ok(())
    }

    fn apply_user_size(&mut self, new_size: u32) {
        let clamped = size::clamp(new_size);
        self.user_size = clamped;
        let new_tier = size::tier_of(clamped);
        if new_tier != self.tier {
            self.tier = new_tier;
            self.emit(DomainEvent::TierChanged { new_tier });
            self.replace_system_prompt();
        }
    }

    /// `set_mode`, rejected mid-stream for the same reason as resize.
    pub fn set_mode(&mut self, new_mode: Mode) -> Result<(), ContextManagerError> {
        if self.streaming {
            self.pending.push(PendingChange::Mode(new_mode));
            return Err(ContextManagerError::StreamInProgress);
        }
        self.apply_mode(new_mode);
        Ok(())
    }

    fn apply_mode(&mut self, new_mode: Mode) {
        if new_mode != self.mode {
            self.mode = new_mode;
            self.emit(DomainEvent::ModeChanged { new_mode });
            self.replace_system_prompt();
        }
    }

    /// Marks the start of a streaming turn (spec §5, "Mid-stream invariants").
    pub fn begin_turn(&mut self) {
        self.streaming = true;
    }

    /// Marks the end of a streaming turn and applies any deferred changes.
    pub fn end_turn(&mut self) {
        self.streaming = false;
        let pending = std::mem::take(&mut self.pending);
        for change in pending {
            match change {
                PendingChange::UserSize(size) => self.apply_user_size(size),
                PendingChange::Mode(mode) => self.apply_mode(mode),
            }
        }
    }

    pub fn append_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Tokens consumed by messages + system prompt, excluding the active goal
    /// block (it is rendered *inside* the system prompt but excluded from the
    /// percentage per spec §4.10's parenthetical).
    fn usage_tokens(&self) -> usize {
        let goal_tokens = self.goals.active_goal().map(|g| estimator::estimate_tokens(&g.render_block())).unwrap_or(0);
        estimator::estimate_messages(&self.messages).saturating_sub(goal_tokens)
    }

    fn usage_pct(&self) -> f64 {
        let server_size = self.server_size().max(1) as f64;
        self.usage_tokens() as f64 / server_size
    }

    /// `validate_budget`: called before every turn (spec §4.12 step 1).
    /// Performs threshold monitoring and, if warranted, a single compression
    /// pass. No-op while streaming (mid-stream safety defers via `pending`,
    /// but this call itself happens before `begin_turn`).
    pub async fn validate_budget(&mut self) -> Result<(), ContextManagerError> {
        let usage = self.usage_pct();

        if usage >= self.config.rollover_threshold {
            self.emit(DomainEvent::ContextWarningCritical { usage_pct: usage });
            self.run_emergency_rollover().await?;
            return Ok(());
        }

        if usage >= self.config.warning_critical_threshold {
            self.emit(DomainEvent::MemoryWarning { usage_pct: usage });
            self.run_emergency_compression().await?;
            return Ok(());
        }

        if usage >= self.config.warning_low_threshold {
            self.emit(DomainEvent::ContextWarningLow { usage_pct: usage });
        }

        if usage >= self.config.compression_threshold {
            self.run_normal_compression().await?;
        }

        Ok(())
    }

    fn next_compression_number(&self) -> u64 {
        self.compression_number + 1
    }

    async fn snapshot_pre_compression(&mut self) -> Result<Uuid, ContextManagerError> {
        let snapshot = Snapshot {
            id: Uuid::new_v4(),
            messages: self.messages.clone(),
            checkpoints: self.checkpoints.clone(),
            active_goal: self.goals.active_goal().cloned(),
            tier: self.tier,
            mode: self.mode,
            user_size: self.user_size,
            reason: SnapshotReason::PreCompression,
            created_at: chrono::Utc::now(),
        };
        let id = self.snapshot_store.create(snapshot).await?;
        self.emit(DomainEvent::SessionSaved { snapshot_id: id });
        Ok(id)
    }

    /// Manual user-requested snapshot (spec §4.10, "Snapshots").
    pub async fn snapshot_manual(&mut self) -> Result<Uuid, ContextManagerError> {
        let snapshot = Snapshot {
            id: Uuid::new_v4(),
            messages: self.messages.clone(),
            checkpoints: self.checkpoints.clone(),
            active_goal: self.goals.active_goal().cloned(),
            tier: self.tier,
            mode: self.mode,
            user_size: self.user_size,
            reason: SnapshotReason::Manual,
            created_at: chrono::Utc::now(),
        };
        let id = self.snapshot_store.create(snapshot).await?;
        self.emit(DomainEvent::SessionSaved { snapshot_id: id });
        Ok(id)
    }

    /// Oldest contiguous non-goal-bearing block whose combined tokens cover
    /// `overshoot_tokens` (spec §4.10, "Normal compression").
    fn select_overshoot_block(&self, overshoot_tokens: usize) -> Option<(usize, usize)> {
        let mut covered = 0usize;
        let mut end = 0usize;
        for (index, message) in self.messages.iter().enumerate().skip(1) {
            if covered >= overshoot_tokens {
                break;
            }
            covered += estimator::estimate_message(message);
            end = index + 1;
        }
        if end <= 1 { None } else { Some((1, end)) }
    }

    async fn run_normal_compression(&mut self) -> Result<(), ContextManagerError> {
        let server_size = self.server_size().max(1) as usize;
        let overshoot = self.usage_tokens().saturating_sub((server_size as f64 * self.config.compression_threshold) as usize);
        let Some((start, end)) = self.select_overshoot_block(overshoot) else {
            self.emit(DomainEvent::AutoSummaryFailed { error: "no compressible messages available".to_string() });
            return Ok(());
        };

        self.snapshot_pre_compression().await?;

        let block = self.messages[start..end].to_vec();
        let original_tokens: usize = block.iter().map(estimator::estimate_message).sum();

        self.emit(DomainEvent::Summarizing { phase: "normal_compression".to_string() });
        match self.summarizer.summarize_messages(CompressionLevel::L3Standard, &block).await {
            Ok(summary) => {
                let compression_number = self.next_compression_number();
                let checkpoint = Checkpoint {
                    id: Uuid::new_v4(),
                    timestamp: chrono::Utc::now(),
                    summary: summary.summary,
                    original_message_ids: block.iter().map(|m| m.id).collect(),
                    token_count: summary.token_count,
                    level: CompressionLevel::L3Standard,
                    compression_number,
                    metadata: crate::checkpoints::CheckpointMetadata {
                        originating_model: summary.model,
                        created_at: chrono::Utc::now(),
                        compressed_at: chrono::Utc::now(),
                    },
                };
                let tokens_freed = original_tokens.saturating_sub(checkpoint.token_count);
                let checkpoint_id = checkpoint.id;

                self.messages.splice(start..end, std::iter::empty());
                self.checkpoints.push(checkpoint);
                self.compression_number = compression_number;

                self.emit(DomainEvent::Compressed { new_checkpoint_id: checkpoint_id, tokens_freed });
                self.run_checkpoint_maintenance().await;
            }
            Err(err) => {
                self.emit(DomainEvent::AutoSummaryFailed { error: err.to_string() });
            }
        }

        Ok(())
    }

    /// Age then, if eligible, merge (spec §4.10, "Checkpoint maintenance").
    async fn run_checkpoint_maintenance(&mut self) {
        let (l1_threshold, l2_threshold) = (self.config.age_l1_threshold, self.config.age_l2_threshold);
        if !checkpoints::checkpoints_needing_aging(&self.checkpoints, self.compression_number, l1_threshold, l2_threshold).is_empty() {
            self.emit(DomainEvent::Summarizing { phase: "checkpoint_aging".to_string() });
        }
        let age_results =
            checkpoints::age_checkpoints(self.summarizer.as_ref(), &self.checkpoints, self.compression_number, l1_threshold, l2_threshold).await;
        for result in age_results {
            if let Some(checkpoint) = self.checkpoints.iter_mut().find(|c| c.id == result.original_id) {
                *checkpoint = result.aged_checkpoint;
            }
        }

        let merge_min_count = self.config.merge_min_count;
        let eligible_ids: Vec<Uuid> = checkpoints::checkpoints_eligible_for_merging(&self.checkpoints, merge_min_count)
            .into_iter()
            .map(|c| c.id)
            .collect();
        if eligible_ids.len() < merge_min_count {
            return;
        }

        self.emit(DomainEvent::Summarizing { phase: "checkpoint_merge".to_string() });
        let targets: Vec<Checkpoint> = self.checkpoints.iter().filter(|c| eligible_ids.contains(&c.id)).cloned().collect();
        if let Ok((merged, _tokens_freed)) = checkpoints::merge_checkpoints(self.summarizer.as_ref(), &targets).await {
            self.checkpoints.retain(|c| !eligible_ids.contains(&c.id));
            self.checkpoints.push(merged);
        }
    }

    fn emergency_context(&self) -> EmergencyContext {
        EmergencyContext { tier: self.tier, mode: self.mode, user_size: self.user_size }
    }

    /// `K.compress_checkpoint` on largest, else `K.aggressive_summarization`
    /// on oldest non-goal messages (spec §4.10, "≥95%").
    async fn run_emergency_compression(&mut self) -> Result<(), ContextManagerError> {
        let goal = self.goals.active_goal().cloned();
        let ctx = self.emergency_context();

        if let Some(largest) = self.checkpoints.iter().max_by_key(|c| c.token_count).cloned() {
            self.emit(DomainEvent::Summarizing { phase: "emergency_compression".to_string() });
            let result = emergency::compress_checkpoint(
                self.snapshot_store.as_ref(),
                self.summarizer.as_ref(),
                &largest,
                &self.messages,
                &self.checkpoints,
                goal.as_ref(),
                &ctx,
            )
            .await;
            if result.success {
                if let Some(slot) = self.checkpoints.iter_mut().find(|c| c.id == largest.id) {
                    slot.level = CompressionLevel::L1Compact;
                }
                self.emit(DomainEvent::Compressed { new_checkpoint_id: largest.id, tokens_freed: result.tokens_freed });
                return Ok(());
            }
        }

        let subset: Vec<Message> = self.messages.iter().skip(1).take(10).cloned().collect();
        let subset_ids: Vec<Uuid> = subset.iter().map(|m| m.id).collect();
        self.emit(DomainEvent::Summarizing { phase: "emergency_aggressive_summarize".to_string() });
        let result = emergency::aggressive_summarization(
            self.snapshot_store.as_ref(),
            self.summarizer.as_ref(),
            &subset,
            &self.messages,
            &self.checkpoints,
            goal.as_ref(),
            &ctx,
        )
        .await;

        if result.success {
            if let Some(checkpoint) = result.checkpoint {
                self.messages.retain(|m| !subset_ids.contains(&m.id));
                let checkpoint_id = checkpoint.id;
                self.checkpoints.push(checkpoint);
                self.emit(DomainEvent::Compressed { new_checkpoint_id: checkpoint_id, tokens_freed: result.tokens_freed });
            }
        } else {
            self.emit(DomainEvent::AutoSummaryFailed { error: result.error.unwrap_or_default() });
        }

        Ok(())
    }

    /// `K.emergency_rollover` (spec §4.10, "≥100%").
    async fn run_emergency_rollover(&mut self) -> Result<(), ContextManagerError> {
        let goal = self.goals.active_goal().cloned();
        let ctx = self.emergency_context();
        let (result, retained) = emergency::emergency_rollover(
            self.snapshot_store.as_ref(),
            &self.messages,
            &self.checkpoints,
            goal.as_ref(),
            &ctx,
            self.config.rollover_keep_recent,
        )
        .await;

        if result.success {
            self.messages = retained;
            self.checkpoints.clear();
            self.emit(DomainEvent::Compressed { new_checkpoint_id: Uuid::nil(), tokens_freed: result.tokens_freed });
        } else {
            self.emit(DomainEvent::AutoSummaryFailed { error: result.error.unwrap_or_default() });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::InMemorySnapshotStore;
    use crate::summarize::MockSummarizer;

    fn manager() -> ContextManager {
        let store = TieredStore::in_memory([((Mode::Developer, 3), "dev tier 3".to_string())]);
        ContextManager::new(16384, Mode::Developer, store, Arc::new(MockSummarizer::shrinking()), Arc::new(InMemorySnapshotStore::new()))
    }

    #[test]
    fn constructing_installs_a_system_prompt_as_the_first_message() {
        let manager = manager();
        assert_eq!(manager.messages().len(), 1);
        assert_eq!(manager.messages()[0].role, crate::message::Role::System);
    }

    #[test]
    fn resizing_across_a_tier_boundary_emits_tier_changed_and_prompt_updated() {
        let mut manager = manager();
        manager.set_user_size(32768).unwrap();
        let events = manager.drain_events();
        assert!(events.iter().any(|e| matches!(e, DomainEvent::TierChanged { new_tier: ContextTier::T4Premium })));
        assert!(events.iter().any(|e| matches!(e, DomainEvent::SystemPromptUpdated { .. })));
    }

    #[test]
    fn mid_stream_resize_is_rejected_and_deferred() {
        let mut manager = manager();
        manager.begin_turn();
        let result = manager.set_user_size(32768);
        assert!(matches!(result, Err(ContextManagerError::StreamInProgress)));
        assert_eq!(manager.tier(), ContextTier::T3Standard);
        manager.end_turn();
        assert_eq!(manager.tier(), ContextTier::T4Premium);
    }

    #[tokio::test]
    async fn high_usage_triggers_normal_compression_and_creates_a_checkpoint() {
        let mut manager = manager();
        for i in 0..400 {
            manager.append_message(Message::user(format!("padding message number {i} with extra filler words to grow tokens")));
        }
        manager.validate_budget().await.unwrap();
        assert!(!manager.checkpoints().is_empty(), "expected at least one checkpoint after high-usage compression");
    }

    #[tokio::test]
    async fn normal_compression_emits_a_summarizing_event_before_checkpointing() {
        let mut manager = manager();
        for i in 0..400 {
            manager.append_message(Message::user(format!("padding message number {i} with extra filler words to grow tokens")));
        }
        manager.validate_budget().await.unwrap();
        let events = manager.drain_events();
        assert!(events.iter().any(|e| matches!(e, DomainEvent::Summarizing { phase } if phase == "normal_compression")));
    }

    #[tokio::test]
    async fn a_raised_compression_threshold_suppresses_compression_the_default_would_trigger() {
        let store = TieredStore::in_memory([((Mode::Developer, 3), "dev tier 3".to_string())]);
        let config = ConversationCoreConfig { compression_threshold: 0.99, ..ConversationCoreConfig::default() };
        let mut manager = ContextManager::with_config(
            16384,
            Mode::Developer,
            store,
            Arc::new(MockSummarizer::shrinking()),
            Arc::new(InMemorySnapshotStore::new()),
            config,
        );
        for i in 0..400 {
            manager.append_message(Message::user(format!("padding message number {i} with extra filler words to grow tokens")));
        }
        // The same 400 padding messages trigger compression under the default 0.70
        // threshold (see `high_usage_triggers_normal_compression_and_creates_a_checkpoint`).
        manager.validate_budget().await.unwrap();
        assert!(manager.checkpoints().is_empty(), "a 0.99 threshold should not have triggered compression yet");
    }

    #[tokio::test]
    async fn emergency_rollover_triggers_past_100_percent() {
        let mut manager = manager();
        for i in 0..2000 {
            manager.append_message(Message::user(format!("padding message number {i} with extra filler words to grow tokens even more than before")));
        }
        manager.validate_budget().await.unwrap();
        let events = manager.drain_events();
        assert!(events.iter().any(|e| matches!(e, DomainEvent::ContextWarningCritical { .. } | DomainEvent::MemoryWarning { .. })));
    }
}
