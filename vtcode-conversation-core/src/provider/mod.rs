//! Provider Adapter (spec §4.2, component D): a local-LLM streaming chat
//! contract. Grounded on `vtcode-core::llm::provider::provider_trait::LLMProvider`
//! and `vtcode-core::llm::provider::response::LLMStreamEvent`, generalised to
//! the tagged event set spec'd in §4.2/§6.1 and the option-key mirroring the
//! local wire protocol requires.

mod wire;
pub mod ollama;

pub use wire::{WireFrame, WireRequest, WireToolCallFrame};
pub use ollama::OllamaAdapter;

use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use std::pin::Pin;
use thiserror::Error;

use crate::message::Message;

/// Tool schema handed to the adapter for a request (spec §4.2, §6.1).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Reason a stream reached its sole non-error terminal event (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    Tool,
}

/// Transport/protocol error surfaced by the adapter (spec §4.2, §7).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdapterErrorCode {
    #[error("connection refused")]
    ConnRefused,
    #[error("host not found")]
    NotFound,
    #[error("receive timed out")]
    TimedOut,
    #[error("malformed protocol frame")]
    Proto,
    #[error("context window overflow")]
    CtxOverflow,
    #[error("other: {0}")]
    Other(String),
}

/// One event in the lazy, finite, non-restartable stream the adapter yields
/// (spec §4.2, "Event kinds").
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Text { value: String },
    ToolCall { id: String, name: String, args: Value },
    Thinking { value: String },
    Error { message: String, code: Option<AdapterErrorCode> },
    Finish { reason: FinishReason },
}

pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Request parameters for a single streaming turn.
#[derive(Debug, Clone)]
pub struct AdapterRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSchema>,
    /// Raw option map as supplied by the caller; `num_ctx` and the
    /// `maxTokens` mirror triple are filled in by [`build_wire_request`].
    pub options: serde_json::Map<String, Value>,
    pub server_context_size: u32,
    pub think: bool,
}

/// Cooperative cancellation handle: cloning shares one cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(std::sync::Arc<std::sync::atomic::AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// The Provider Adapter contract (spec §4.2).
///
/// Implementations translate local message/tool types to and from a
/// specific local LLM server's wire protocol. A new logical stream is
/// opened per request; implementations must not be shared across turns
/// in a way that lets state leak between them (spec §5).
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Open a streaming chat request. The returned stream is finite and
    /// terminates with exactly one of `Error` or `Finish`.
    async fn stream_chat(&self, request: AdapterRequest, abort: AbortSignal) -> EventStream;
}

/// Build the option map with `num_ctx` and the `maxTokens` mirror applied
/// (spec §4.2, "Option key mirroring" — compatibility-critical, tested by
/// [`crate::provider::wire::tests::max_tokens_mirrors_to_all_three_keys`]).
pub fn build_wire_request(request: &AdapterRequest) -> WireRequest {
    wire::build_wire_request(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_reason_round_trips_through_serde() {
        let reason = FinishReason::Tool;
        let json = serde_json::to_string(&reason).unwrap();
        assert_eq!(json, "\"tool\"");
    }
}
