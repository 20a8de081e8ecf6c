//! Context budget, tiered system prompt, compression/checkpoint lifecycle,
//! tool policy, and agent loop for a local-LLM-backed terminal coding agent.
//!
//! This crate implements the "Conversation Core" described alongside it:
//! it sizes the context window against available GPU memory, composes a
//! tiered system prompt, streams model output through a pluggable provider
//! adapter, executes tool calls under a risk-based approval policy, and
//! reclaims context space through a multi-level compression and
//! checkpoint-aging pipeline backed by durable snapshots.
//!
//! Module-to-component mapping:
//!
//! | Module | Component |
//! |---|---|
//! | [`size`] | A — Size Calculator |
//! | [`router`] | B — Model Database & Router |
//! | [`estimator`] | C — Token Estimator |
//! | [`provider`] | D — Provider Adapter |
//! | [`prompts`] | E/F — Prompt Registry, Tiered Store, System Prompt Builder |
//! | [`goals`] | G — Goal Manager |
//! | [`summarize`] | H — Summarization Service |
//! | [`checkpoints`] | I — Checkpoint Lifecycle |
//! | [`snapshot`] | J — Snapshot Lifecycle |
//! | [`emergency`] | K — Emergency Actions |
//! | [`context_manager`] | L — Context Manager |
//! | [`tools`] | M — Tool Registry & Policy Engine |
//! | [`agent_loop`] | N — Agent Loop |

pub mod agent_loop;
pub mod checkpoints;
pub mod config;
pub mod context_manager;
pub mod emergency;
pub mod estimator;
pub mod events;
pub mod goals;
pub mod message;
pub mod prompts;
pub mod provider;
pub mod router;
pub mod size;
pub mod snapshot;
pub mod summarize;
pub mod think_parser;
pub mod tools;

pub use agent_loop::{AgentHooks, AgentLoop, AgentLoopError, NoopHooks, TurnOutcome};
pub use checkpoints::{Checkpoint, CheckpointError, CompressionLevel};
pub use config::ConversationCoreConfig;
pub use context_manager::{ContextManager, ContextManagerError};
pub use events::DomainEvent;
pub use goals::{Goal, GoalManager};
pub use message::{Message, MessagePart, Role};
pub use provider::{AbortSignal, ProviderAdapter};
pub use router::{ModelDatabase, ModelRouter};
pub use size::ContextTier;
pub use snapshot::{Snapshot, SnapshotStore};
pub use tools::{PolicyEngine, ToolRegistry};
