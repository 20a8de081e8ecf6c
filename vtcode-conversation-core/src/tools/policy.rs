//! Policy Engine (spec §4.11, component M, second half): approval modes and
//! risk classification. Grounded on `vtcode-core::exec_policy::approval`'s
//! requirement-enum shape, generalised from shell commands to arbitrary
//! tool calls.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

/// Process-wide approval mode (spec §4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    Yolo,
    Auto,
    Ask,
}

impl Default for ApprovalMode {
    fn default() -> Self {
        ApprovalMode::Auto
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Risk classification table keyed by tool-name prefix (`SPEC_FULL.md` §3
/// supplement): a static lookup rather than one hardcoded `match`, so
/// extensions can register new tools at a given risk class.
#[derive(Debug, Clone)]
pub struct RiskTable {
    entries: Vec<(String, RiskLevel)>,
    default_risk: RiskLevel,
}

impl Default for RiskTable {
    fn default() -> Self {
        Self {
            entries: vec![
                ("read_file".to_string(), RiskLevel::Low),
                ("list_dir".to_string(), RiskLevel::Low),
                ("search".to_string(), RiskLevel::Low),
                ("write_file".to_string(), RiskLevel::Medium),
                ("edit_file".to_string(), RiskLevel::Medium),
                ("shell".to_string(), RiskLevel::High),
                ("exec".to_string(), RiskLevel::High),
            ],
            default_risk: RiskLevel::Medium,
        }
    }
}

impl RiskTable {
    pub fn register(&mut self, tool_name_prefix: impl Into<String>, risk: RiskLevel) {
        self.entries.push((tool_name_prefix.into(), risk));
    }

    /// Risk is a pure function of `(tool_name, args)` (spec §4.11); `args` is
    /// accepted for interface parity with the spec's signature but unused by
    /// the built-in prefix table.
    pub fn classify(&self, tool_name: &str, _args: &Value) -> RiskLevel {
        self.entries
            .iter()
            .rev()
            .find(|(prefix, _)| tool_name.starts_with(prefix.as_str()))
            .map(|(_, risk)| *risk)
            .unwrap_or(self.default_risk)
    }
}

/// Outcome of [`PolicyEngine::check`]: either the call may proceed, or an
/// approval request with a reply channel is returned for the caller to await.
pub enum ApprovalOutcome {
    Proceed,
    AwaitApproval { receiver: oneshot::Receiver<bool> },
}

pub struct PendingApproval {
    pub tool: String,
    pub args: Value,
    pub reply: oneshot::Sender<bool>,
}

/// The Policy Engine (spec §4.11): decides, per tool call, whether execution
/// may proceed, is auto-denied, or needs a human decision.
pub struct PolicyEngine {
    mode: ApprovalMode,
    risk_table: RiskTable,
}

impl PolicyEngine {
    pub fn new(mode: ApprovalMode) -> Self {
        Self { mode, risk_table: RiskTable::default() }
    }

    pub fn with_risk_table(mode: ApprovalMode, risk_table: RiskTable) -> Self {
        Self { mode, risk_table }
    }

    pub fn mode(&self) -> ApprovalMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ApprovalMode) {
        self.mode = mode;
    }

    pub fn risk_table_mut(&mut self) -> &mut RiskTable {
        &mut self.risk_table
    }

    /// Whether `tool_name` with `args` requires a human decision before
    /// `execute` may run. `YOLO` never requires one; `ASK` always does;
    /// `AUTO` requires one only above low risk (spec §4.11, "Policy").
    pub fn requires_approval(&self, tool_name: &str, args: &Value) -> bool {
        match self.mode {
            ApprovalMode::Yolo => false,
            ApprovalMode::Ask => true,
            ApprovalMode::Auto => self.risk_table.classify(tool_name, args) != RiskLevel::Low,
        }
    }

    /// Produces a pending approval request (with its reply channel) when a
    /// decision is required, or `None` when the call may proceed immediately.
    pub fn check(&self, tool_name: &str, args: &Value) -> (ApprovalOutcome, Option<PendingApproval>) {
        if !self.requires_approval(tool_name, args) {
            return (ApprovalOutcome::Proceed, None);
        }
        let (sender, receiver) = oneshot::channel();
        let pending = PendingApproval { tool: tool_name.to_string(), args: args.clone(), reply: sender };
        (ApprovalOutcome::AwaitApproval { receiver }, Some(pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_table_classifies_built_in_tools() {
        let table = RiskTable::default();
        assert_eq!(table.classify("read_file", &Value::Null), RiskLevel::Low);
        assert_eq!(table.classify("write_file", &Value::Null), RiskLevel::Medium);
        assert_eq!(table.classify("shell", &Value::Null), RiskLevel::High);
    }

    #[test]
    fn unknown_tool_falls_back_to_medium() {
        let table = RiskTable::default();
        assert_eq!(table.classify("custom_extension_tool", &Value::Null), RiskLevel::Medium);
    }

    #[test]
    fn yolo_never_requires_approval() {
        let engine = PolicyEngine::new(ApprovalMode::Yolo);
        assert!(!engine.requires_approval("shell", &Value::Null));
    }

    #[test]
    fn ask_always_requires_approval() {
        let engine = PolicyEngine::new(ApprovalMode::Ask);
        assert!(engine.requires_approval("read_file", &Value::Null));
    }

    #[test]
    fn auto_only_requires_approval_above_low_risk() {
        let engine = PolicyEngine::new(ApprovalMode::Auto);
        assert!(!engine.requires_approval("read_file", &Value::Null));
        assert!(engine.requires_approval("write_file", &Value::Null));
        assert!(engine.requires_approval("shell", &Value::Null));
    }

    #[tokio::test]
    async fn approval_request_carries_a_working_reply_channel() {
        let engine = PolicyEngine::new(ApprovalMode::Ask);
        let (outcome, pending) = engine.check("read_file", &Value::Null);
        let ApprovalOutcome::AwaitApproval { receiver } = outcome else { panic!("expected AwaitApproval") };
        pending.unwrap().reply.send(true).unwrap();
        assert!(receiver.await.unwrap());
    }
}
