pub mod agent_optimization;
pub mod async_command;
pub mod cancellation;
pub mod code_executor;
pub mod events;
pub mod integration_tests;
pub mod pii_tokenizer;
pub mod sdk_ipc;
pub mod skill_manager;
pub mod tool_versioning;

pub use agent_optimization::{
    AgentBehaviorAnalyzer, AppliedRecovery, CodePattern, FailurePatterns, RecoveryPattern,
    SkillStatistics, ToolStatistics,
};
pub use code_executor::{CodeExecutor, ExecutionConfig, ExecutionResult, Language};
pub use pii_tokenizer::{DetectedPii, PiiToken, PiiTokenizer, PiiType};
pub use sdk_ipc::{ToolIpcHandler, ToolRequest, ToolResponse};
pub use skill_manager::{Skill, SkillManager, SkillMetadata};
pub use tool_versioning::{
    BreakingChange, CompatibilityReport, Deprecation, Migration, SkillCompatibilityChecker,
    ToolDependency, ToolVersion, VersionCompatibility,
};
