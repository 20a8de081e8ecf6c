//! Goal Manager (spec §4.5, component G). Goal content is excluded from all
//! compression paths (spec Property 12) — the Context Manager never hands
//! goal state to the Summarization Service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalCheckpoint {
    pub id: Uuid,
    pub description: String,
    pub status: CheckpointStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub description: String,
    pub rationale: String,
    pub locked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactAction {
    Created,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub artifact_type: String,
    pub path: String,
    pub action: ArtifactAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub description: String,
    pub priority: u8,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub checkpoints: Vec<GoalCheckpoint>,
    pub decisions: Vec<Decision>,
    pub artifacts: Vec<Artifact>,
}

impl Goal {
    /// Fraction of checkpoints completed, as `(completed, total)`.
    pub fn progress(&self) -> (usize, usize) {
        let completed = self.checkpoints.iter().filter(|c| c.status == CheckpointStatus::Completed).count();
        (completed, self.checkpoints.len())
    }

    /// Verbatim block rendered into the system prompt (spec §4.4, section 2).
    pub fn render_block(&self) -> String {
        let (done, total) = self.progress();
        let mut block = format!("Goal: {}\nProgress: {done}/{total} checkpoints\n", self.description);
        for checkpoint in &self.checkpoints {
            block.push_str(&format!("- [{:?}] {}\n", checkpoint.status, checkpoint.description));
        }
        for decision in &self.decisions {
            let lock_marker = if decision.locked { " (locked)" } else { "" };
            block.push_str(&format!("Decision{lock_marker}: {} — {}\n", decision.description, decision.rationale));
        }
        for artifact in &self.artifacts {
            block.push_str(&format!("Artifact [{:?}]: {}\n", artifact.action, artifact.path));
        }
        block
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GoalError {
    #[error("no active goal")]
    NoActiveGoal,
    #[error("a goal is already active")]
    GoalAlreadyActive,
    #[error("checkpoint not found")]
    CheckpointNotFound,
    #[error("decision is locked and cannot be re-locked or mutated")]
    DecisionLocked,
    #[error("decision not found")]
    DecisionNotFound,
}

/// State machine: `[create] → active → (pause ↔ active) → completed`. At
/// most one goal may be active at a time (spec §3, "Goal").
#[derive(Debug, Default)]
pub struct GoalManager {
    goals: Vec<Goal>,
    active: Option<Uuid>,
}

impl GoalManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_goal(&self) -> Option<&Goal> {
        self.active.and_then(|id| self.goals.iter().find(|g| g.id == id))
    }

    fn goal_mut(&mut self, id: Uuid) -> Option<&mut Goal> {
        self.goals.iter_mut().find(|g| g.id == id)
    }

    pub fn create_goal(&mut self, description: impl Into<String>, priority: u8) -> Result<Uuid, GoalError> {
        if self.active.is_some() {
            return Err(GoalError::GoalAlreadyActive);
        }
        let goal = Goal {
            id: Uuid::new_v4(),
            description: description.into(),
            priority,
            status: GoalStatus::Active,
            created_at: Utc::now(),
            completed_at: None,
            checkpoints: Vec::new(),
            decisions: Vec::new(),
            artifacts: Vec::new(),
        };
        let id = goal.id;
        self.goals.push(goal);
        self.active = Some(id);
        Ok(id)
    }

    /// Pausing the active goal activates no other goal (spec §4.5).
    pub fn pause(&mut self) -> Result<(), GoalError> {
        let id = self.active.ok_or(GoalError::NoActiveGoal)?;
        self.goal_mut(id).ok_or(GoalError::NoActiveGoal)?.status = GoalStatus::Paused;
        self.active = None;
        Ok(())
    }

    pub fn resume(&mut self, id: Uuid) -> Result<(), GoalError> {
        if self.active.is_some() {
            return Err(GoalError::GoalAlreadyActive);
        }
        let goal = self.goal_mut(id).ok_or(GoalError::NoActiveGoal)?;
        goal.status = GoalStatus::Active;
        self.active = Some(id);
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), GoalError> {
        let id = self.active.ok_or(GoalError::NoActiveGoal)?;
        let goal = self.goal_mut(id).ok_or(GoalError::NoActiveGoal)?;
        goal.status = GoalStatus::Completed;
        goal.completed_at = Some(Utc::now());
        self.active = None;
        Ok(())
    }

    pub fn add_checkpoint(&mut self, description: impl Into<String>) -> Result<Uuid, GoalError> {
        let id = self.active.ok_or(GoalError::NoActiveGoal)?;
        let checkpoint = GoalCheckpoint { id: Uuid::new_v4(), description: description.into(), status: CheckpointStatus::Pending };
        let checkpoint_id = checkpoint.id;
        self.goal_mut(id).ok_or(GoalError::NoActiveGoal)?.checkpoints.push(checkpoint);
        Ok(checkpoint_id)
    }

    pub fn update_checkpoint_status(&mut self, checkpoint_id: Uuid, status: CheckpointStatus) -> Result<(), GoalError> {
        let id = self.active.ok_or(GoalError::NoActiveGoal)?;
        let goal = self.goal_mut(id).ok_or(GoalError::NoActiveGoal)?;
        let checkpoint = goal.checkpoints.iter_mut().find(|c| c.id == checkpoint_id).ok_or(GoalError::CheckpointNotFound)?;
        checkpoint.status = status;
        Ok(())
    }

    pub fn record_decision(&mut self, description: impl Into<String>, rationale: impl Into<String>) -> Result<usize, GoalError> {
        let id = self.active.ok_or(GoalError::NoActiveGoal)?;
        let goal = self.goal_mut(id).ok_or(GoalError::NoActiveGoal)?;
        goal.decisions.push(Decision { description: description.into(), rationale: rationale.into(), locked: false });
        Ok(goal.decisions.len() - 1)
    }

    /// Locking a decision is irreversible (spec §4.5).
    pub fn lock_decision(&mut self, index: usize) -> Result<(), GoalError> {
        let id = self.active.ok_or(GoalError::NoActiveGoal)?;
        let goal = self.goal_mut(id).ok_or(GoalError::NoActiveGoal)?;
        let decision = goal.decisions.get_mut(index).ok_or(GoalError::DecisionNotFound)?;
        if decision.locked {
            return Err(GoalError::DecisionLocked);
        }
        decision.locked = true;
        Ok(())
    }

    pub fn record_artifact(&mut self, artifact_type: impl Into<String>, path: impl Into<String>, action: ArtifactAction) -> Result<(), GoalError> {
        let id = self.active.ok_or(GoalError::NoActiveGoal)?;
        self.goal_mut(id)
            .ok_or(GoalError::NoActiveGoal)?
            .artifacts
            .push(Artifact { artifact_type: artifact_type.into(), path: path.into(), action });
        Ok(())
    }
}

/// Markers recognized in assistant text by the Agent Loop's post-turn
/// extraction pass (spec §4.5, "Goal-marker parsing").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalMarker<'a> {
    Goal(&'a str),
    Checkpoint(&'a str),
    Decision(&'a str),
    Artifact(&'a str),
    Next(&'a str),
}

/// Extract `[GOAL]`, `[CHECKPOINT]`, `[DECISION]`, `[ARTIFACT]`, `[NEXT]`
/// markers from assistant text. Unknown bracketed markers are left as plain
/// text and are not returned here.
pub fn extract_markers(text: &str) -> Vec<GoalMarker<'_>> {
    const TAGS: [(&str, fn(&str) -> GoalMarker<'_>); 5] = [
        ("[GOAL]", GoalMarker::Goal),
        ("[CHECKPOINT]", GoalMarker::Checkpoint),
        ("[DECISION]", GoalMarker::Decision),
        ("[ARTIFACT]", GoalMarker::Artifact),
        ("[NEXT]", GoalMarker::Next),
    ];

    let mut markers = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        for (tag, constructor) in TAGS {
            if let Some(rest) = trimmed.strip_prefix(tag) {
                markers.push(constructor(rest.trim()));
                break;
            }
        }
    }
    markers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_most_one_goal_can_be_active() {
        let mut manager = GoalManager::new();
        manager.create_goal("ship v1", 1).unwrap();
        assert_eq!(manager.create_goal("ship v2", 1), Err(GoalError::GoalAlreadyActive));
    }

    #[test]
    fn pausing_activates_no_other_goal() {
        let mut manager = GoalManager::new();
        manager.create_goal("ship v1", 1).unwrap();
        manager.pause().unwrap();
        assert!(manager.active_goal().is_none());
    }

    #[test]
    fn locked_decisions_stay_locked() {
        let mut manager = GoalManager::new();
        manager.create_goal("ship v1", 1).unwrap();
        let index = manager.record_decision("use sqlite", "simplicity").unwrap();
        manager.lock_decision(index).unwrap();
        assert!(manager.active_goal().unwrap().decisions[index].locked);
    }

    #[test]
    fn relocking_an_already_locked_decision_is_rejected() {
        let mut manager = GoalManager::new();
        manager.create_goal("ship v1", 1).unwrap();
        let index = manager.record_decision("use sqlite", "simplicity").unwrap();
        manager.lock_decision(index).unwrap();
        assert_eq!(manager.lock_decision(index), Err(GoalError::DecisionLocked));
    }

    #[test]
    fn unknown_markers_are_not_extracted() {
        let markers = extract_markers("[GOAL] ship it\n[UNKNOWN] ignore me\n[NEXT] write tests");
        assert_eq!(markers, vec![GoalMarker::Goal("ship it"), GoalMarker::Next("write tests")]);
    }
}
