//! Agent Loop (spec §4.12, component N): multi-turn orchestration over the
//! Provider Adapter (D), Context Manager (L), and Tool Registry/Policy
//! Engine (M). Grounded on the turn-processing shape of
//! `vtcode-core::agent::runloop::unified::turn::turn_loop` and the
//! fixed-point hook events of `vtcode-core::hooks::lifecycle`, narrowed to
//! the single-turn contract specified in §4.12.

use std::sync::Arc;

use futures::StreamExt;
use thiserror::Error;
use uuid::Uuid;

use crate::config::ConversationCoreConfig;
use crate::context_manager::{ContextManager, ContextManagerError};
use crate::events::DomainEvent;
use crate::goals::extract_markers;
use crate::message::{Message, MessagePart, ReasoningBlock, Role};
use crate::provider::{
    AbortSignal, AdapterErrorCode, AdapterRequest, FinishReason, ProviderAdapter, StreamEvent, ToolSchema,
};
use crate::think_parser::{ThinkEvent, ThinkTagParser};
use crate::tools::{ApprovalOutcome, PendingApproval, PolicyEngine, ToolOutcome, ToolRegistry};

/// Fixed hook points emitted during a turn (spec §4.12, "Hook events").
/// Handlers are best-effort and cannot mutate the conversation — they are
/// invoked synchronously and their errors are swallowed by the caller.
pub trait AgentHooks: Send + Sync {
    fn before_model(&self, _turn: u8) {}
    fn after_model(&self, _turn: u8) {}
    fn before_tool(&self, _tool_name: &str, _args: &serde_json::Value) {}
    fn after_tool(&self, _tool_name: &str, _outcome: &ToolOutcome) {}

    /// Called when the Policy Engine decides a tool call needs a human
    /// decision (spec §4.11). The hook owns `pending.reply` and is
    /// responsible for sending a decision into it — dropping `pending`
    /// without replying denies the call (the receiver resolves to `Err`).
    /// The default auto-approves: a caller that hasn't wired up an approver
    /// has nothing to route the request to, and silently denying every
    /// gated call would defeat `ApprovalMode::Auto`/`Ask` for callers who
    /// never asked to be blocked on a decision they can't make.
    fn on_approval_requested(&self, pending: PendingApproval) {
        let _ = pending.reply.send(true);
    }
}

/// A no-op hook set for callers that do not need observability.
pub struct NoopHooks;
impl AgentHooks for NoopHooks {}

/// Text delta callback invoked as the assistant message streams in (spec
/// §4.12 step 3c). Kept as a plain closure rather than a trait so callers
/// can use a channel sender, a TUI widget, or nothing at all.
pub type OnText<'a> = dyn FnMut(&str) + Send + 'a;

#[derive(Debug, Error)]
pub enum AgentLoopError {
    #[error("context manager error: {0}")]
    ContextManager(#[from] ContextManagerError),
    #[error("model stream error: {0}")]
    Stream(String),
    #[error("turn aborted")]
    Aborted,
}

/// Outcome of a single call to [`AgentLoop::run_turn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The assistant produced a final text answer with no pending tool calls.
    Completed,
    /// `max_turns` was reached with tool calls still pending.
    MaxTurnsReached,
    /// The caller's `abort_signal` fired mid-turn.
    Aborted,
}

struct PendingToolCall {
    id: String,
    name: String,
    args: serde_json::Value,
}

/// Multi-turn orchestration over D + L + M (spec §4.12, component N).
pub struct AgentLoop<H: AgentHooks = NoopHooks> {
    adapter: Arc<dyn ProviderAdapter>,
    tools: Arc<ToolRegistry>,
    policy: PolicyEngine,
    hooks: H,
    max_turns: u8,
    last_model: Option<String>,
}

impl AgentLoop<NoopHooks> {
    pub fn new(adapter: Arc<dyn ProviderAdapter>, tools: Arc<ToolRegistry>, policy: PolicyEngine) -> Self {
        Self::with_hooks(adapter, tools, policy, NoopHooks)
    }
}

impl<H: AgentHooks> AgentLoop<H> {
    pub fn with_hooks(adapter: Arc<dyn ProviderAdapter>, tools: Arc<ToolRegistry>, policy: PolicyEngine, hooks: H) -> Self {
        Self::with_config(adapter, tools, policy, hooks, ConversationCoreConfig::default())
    }

    /// Same as [`Self::with_hooks`] but with `max_turns` sourced from
    /// [`ConversationCoreConfig`] instead of the spec default.
    pub fn with_config(
        adapter: Arc<dyn ProviderAdapter>,
        tools: Arc<ToolRegistry>,
        policy: PolicyEngine,
        hooks: H,
        config: ConversationCoreConfig,
    ) -> Self {
        Self { adapter, tools, policy, hooks, max_turns: config.max_turns.max(1), last_model: None }
    }

    pub fn set_max_turns(&mut self, max_turns: u8) {
        self.max_turns = max_turns.max(1);
    }

    /// Run one user turn to completion (spec §4.12). `model` is re-resolved
    /// by the caller each call (e.g. from the Model Router); a change since
    /// the previous turn flushes the `<think>` parser state (step 3a).
    pub async fn run_turn(
        &mut self,
        context: &mut ContextManager,
        model: &str,
        user_input: String,
        tool_schemas: Vec<ToolSchema>,
        mut on_text: Box<OnText<'_>>,
        abort: AbortSignal,
    ) -> Result<TurnOutcome, AgentLoopError> {
        context.append_message(Message::user(user_input));
        context.validate_budget().await?;

        let model_changed = self.last_model.as_deref() != Some(model);
        self.last_model = Some(model.to_string());

        context.begin_turn();
        let outcome = self.drive_turns(context, model, tool_schemas, &mut on_text, abort, model_changed).await;
        context.end_turn();
        outcome
    }

    async fn drive_turns(
        &mut self,
        context: &mut ContextManager,
        model: &str,
        tool_schemas: Vec<ToolSchema>,
        on_text: &mut Box<OnText<'_>>,
        abort: AbortSignal,
        model_changed: bool,
    ) -> Result<TurnOutcome, AgentLoopError> {
        // A fresh `ThinkTagParser` is created per model turn below regardless
        // of `model_changed` — a change only matters because it means no
        // carried-over reasoning state should leak across turns, which the
        // per-turn construction already guarantees.
        let _ = model_changed;
        let mut retried_overflow = false;

        for turn in 1..=self.max_turns {
            if abort.is_aborted() {
                context.append_message(Message::assistant(String::new()));
                context.emit(DomainEvent::TurnAborted { reason: "abort signal set before turn started".to_string() });
                return Ok(TurnOutcome::Aborted);
            }

            self.hooks.before_model(turn);

            let request = AdapterRequest {
                model: model.to_string(),
                messages: context.messages().to_vec(),
                tools: tool_schemas.clone(),
                options: serde_json::Map::new(),
                server_context_size: context.server_size(),
                think: false,
            };

            let mut think_parser = ThinkTagParser::new();
            let mut native_thinking_seen = false;

            let mut assistant_text = String::new();
            let mut reasoning_text = String::new();
            let mut pending_tool_calls: Vec<PendingToolCall> = Vec::new();
            let mut overflow = false;
            let mut stream_errored = false;

            let mut stream = self.adapter.stream_chat(request, abort.clone()).await;
            while let Some(event) = stream.next().await {
                if abort.is_aborted() {
                    self.hooks.after_model(turn);
                    context.append_message(Message::assistant(assistant_text));
                    context.emit(DomainEvent::TurnAborted { reason: "abort signal set mid-stream".to_string() });
                    return Ok(TurnOutcome::Aborted);
                }

                match event {
                    StreamEvent::Thinking { value } => {
                        native_thinking_seen = true;
                        reasoning_text.push_str(&value);
                    }
                    StreamEvent::Text { value } => {
                        if native_thinking_seen {
                            assistant_text.push_str(&value);
                            on_text(&value);
                        } else {
                            for think_event in think_parser.process_chunk(&value) {
                                match think_event {
                                    ThinkEvent::Display(text) => {
                                        assistant_text.push_str(&text);
                                        on_text(&text);
                                    }
                                    ThinkEvent::Reasoning(text) => reasoning_text.push_str(&text),
                                }
                            }
                        }
                    }
                    StreamEvent::ToolCall { id, name, args } => {
                        pending_tool_calls.push(PendingToolCall { id, name, args });
                    }
                    StreamEvent::Error { message, code } => {
                        if matches!(code, Some(AdapterErrorCode::CtxOverflow)) && !retried_overflow {
                            overflow = true;
                        } else {
                            stream_errored = true;
                        }
                        let _ = message;
                        break;
                    }
                    StreamEvent::Finish { reason: _ } => break,
                }
            }

            self.hooks.after_model(turn);

            if overflow {
                retried_overflow = true;
                context.validate_budget().await?;
                continue;
            }

            if stream_errored {
                context.append_message(Message::assistant(assistant_text));
                return Err(AgentLoopError::Stream("provider returned a non-overflow error".to_string()));
            }

            if !native_thinking_seen {
                if let Some(ThinkEvent::Reasoning(text) | ThinkEvent::Display(text)) = think_parser.finalize() {
                    // Trailing unclosed tag content at stream end: surface as
                    // display text rather than silently dropping it.
                    assistant_text.push_str(&text);
                }
            }

            let reasoning = (!reasoning_text.is_empty()).then(|| ReasoningBlock {
                token_count: crate::estimator::estimate_tokens(&reasoning_text),
                duration_ms: 0,
                collapsed: true,
                content: reasoning_text,
            });

            if pending_tool_calls.is_empty() {
                let mut message = Message::assistant(assistant_text.clone());
                message.reasoning = reasoning;
                context.append_message(message);

                for marker in extract_markers(&assistant_text) {
                    apply_goal_marker(context, marker);
                }

                return Ok(TurnOutcome::Completed);
            }

            let mut assistant_message = Message::new(
                Role::Assistant,
                {
                    let mut parts = vec![MessagePart::text(assistant_text)];
                    for call in &pending_tool_calls {
                        parts.push(MessagePart::ToolCall { id: call.id.clone(), name: call.name.clone(), args: call.args.clone() });
                    }
                    parts
                },
            );
            assistant_message.reasoning = reasoning;
            context.append_message(assistant_message);

            for call in pending_tool_calls.drain(..) {
                if abort.is_aborted() {
                    context.emit(DomainEvent::TurnAborted { reason: "abort signal set while tool calls were pending".to_string() });
                    return Ok(TurnOutcome::Aborted);
                }

                self.hooks.before_tool(&call.name, &call.args);
                let outcome = self.execute_tool_call(context, &call.name, call.args.clone(), abort.clone()).await;
                self.hooks.after_tool(&call.name, &outcome);

                let value = match &outcome {
                    ToolOutcome::Ok { value, .. } => value.clone(),
                    ToolOutcome::Err { error, .. } => serde_json::to_value(error).unwrap_or(serde_json::Value::Null),
                };
                let mut result_message = Message::tool_result(call.name.clone(), &value);
                result_message.parts.push(MessagePart::ToolResult { tool_call_id: call.id, value });
                context.append_message(result_message);
            }
        }

        context.append_message(Message::assistant(
            "Reached the maximum number of turns for this request with tool calls still pending.".to_string(),
        ));
        Ok(TurnOutcome::MaxTurnsReached)
    }

    /// Validate via the tool registry, gate via the policy engine, then
    /// execute (spec §4.12 step 3e). A denied approval is a tool failure
    /// with code `EUSERDENIED` (spec §7).
    async fn execute_tool_call(&self, context: &mut ContextManager, name: &str, args: serde_json::Value, abort: AbortSignal) -> ToolOutcome {
        let (outcome, pending) = self.policy.check(name, &args);
        match outcome {
            ApprovalOutcome::Proceed => self.tools.execute(name, args).await,
            ApprovalOutcome::AwaitApproval { receiver } => {
                let pending = pending.expect("AwaitApproval always carries a PendingApproval");
                context.emit(DomainEvent::ToolApprovalRequested { tool: pending.tool.clone(), args: pending.args.clone() });
                self.hooks.on_approval_requested(pending);
                tokio::select! {
                    biased;
                    _ = wait_for_abort(&abort) => {
                        ToolOutcome::failure("EABORTED", "turn aborted while awaiting tool approval", name, args)
                    }
                    decision = receiver => {
                        match decision {
                            Ok(true) => self.tools.execute(name, args).await,
                            Ok(false) | Err(_) => ToolOutcome::failure("EUSERDENIED", "tool call denied by approval policy", name, args),
                        }
                    }
                }
            }
        }
    }
}

async fn wait_for_abort(signal: &AbortSignal) {
    while !signal.is_aborted() {
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    }
}

fn apply_goal_marker(context: &mut ContextManager, marker: crate::goals::GoalMarker<'_>) {
    use crate::goals::GoalMarker;
    let goals = context.goals_mut();
    match marker {
        GoalMarker::Goal(description) => {
            let _ = goals.create_goal(description.to_string(), 0);
        }
        GoalMarker::Checkpoint(description) => {
            let _ = goals.add_checkpoint(description.to_string());
        }
        GoalMarker::Decision(description) => {
            let _ = goals.record_decision(description.to_string(), String::new());
        }
        GoalMarker::Artifact(path) => {
            let _ = goals.record_artifact("file", path.to_string(), crate::goals::ArtifactAction::Modified);
        }
        GoalMarker::Next(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::{Mode, TieredStore};
    use crate::snapshot::InMemorySnapshotStore;
    use crate::summarize::MockSummarizer;
    use crate::tools::{ApprovalMode, OutputKind, ToolDefinition, ToolExecutor};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn context_manager() -> ContextManager {
        let store = TieredStore::in_memory([((Mode::Developer, 3), "dev tier 3".to_string())]);
        ContextManager::new(16384, Mode::Developer, store, Arc::new(MockSummarizer::shrinking()), Arc::new(InMemorySnapshotStore::new()))
    }

    /// A scripted adapter that replays a fixed sequence of events, ignoring
    /// the request it was called with — enough to drive the loop's state
    /// machine without a real local LLM server.
    struct ScriptedAdapter {
        script: Mutex<Vec<Vec<StreamEvent>>>,
    }

    #[async_trait]
    impl ProviderAdapter for ScriptedAdapter {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn stream_chat(&self, _request: AdapterRequest, _abort: AbortSignal) -> crate::provider::EventStream {
            let events = self.script.lock().unwrap().remove(0);
            Box::pin(futures::stream::iter(events))
        }
    }

    struct Echo;
    #[async_trait]
    impl ToolExecutor for Echo {
        async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value, String> {
            Ok(args.get("location").cloned().map(|_| serde_json::json!("72F sunny")).unwrap_or(serde_json::Value::Null))
        }
    }

    fn weather_tool() -> ToolDefinition {
        ToolDefinition {
            name: "get_weather".to_string(),
            description: "gets weather".to_string(),
            parameters_schema: serde_json::json!({
                "type": "object",
                "properties": {"location": {"type": "string"}},
                "required": ["location"]
            }),
            output_kind: OutputKind::Opaque,
            timeout: std::time::Duration::from_secs(1),
            executor: Arc::new(Echo),
        }
    }

    /// S2: text deltas concatenate in order into the final assistant message.
    #[tokio::test]
    async fn s2_chunk_concatenation_produces_the_full_assistant_text() {
        let adapter = Arc::new(ScriptedAdapter {
            script: Mutex::new(vec![vec![
                StreamEvent::Text { value: "Hel".to_string() },
                StreamEvent::Text { value: "lo ".to_string() },
                StreamEvent::Text { value: "world".to_string() },
                StreamEvent::Finish { reason: FinishReason::Stop },
            ]]),
        });
        let tools = Arc::new(ToolRegistry::new());
        let mut agent = AgentLoop::new(adapter, tools, PolicyEngine::new(ApprovalMode::Auto));
        let mut context = context_manager();

        let mut collected = String::new();
        let outcome = agent
            .run_turn(&mut context, "llama3:8b", "hi".to_string(), vec![], Box::new(|chunk: &str| collected.push_str(chunk)), AbortSignal::new())
            .await
            .unwrap();

        assert_eq!(outcome, TurnOutcome::Completed);
        assert_eq!(collected, "Hello world");
        let last = context.messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.text(), "Hello world");
    }

    /// S3: a tool call round trip appends a `tool`-role message and continues.
    #[tokio::test]
    async fn s3_tool_call_roundtrip_appends_a_tool_result_message() {
        let adapter = Arc::new(ScriptedAdapter {
            script: Mutex::new(vec![
                vec![
                    StreamEvent::ToolCall { id: "c1".to_string(), name: "get_weather".to_string(), args: serde_json::json!({"location": "Seattle"}) },
                    StreamEvent::Finish { reason: FinishReason::Tool },
                ],
                vec![StreamEvent::Text { value: "It's 72F and sunny.".to_string() }, StreamEvent::Finish { reason: FinishReason::Stop }],
            ]),
        });
        let mut registry = ToolRegistry::new();
        registry.register(weather_tool(), None);
        let tools = Arc::new(registry);
        let mut agent = AgentLoop::new(adapter, tools, PolicyEngine::new(ApprovalMode::Auto));
        let mut context = context_manager();

        let outcome = agent
            .run_turn(&mut context, "llama3:8b", "weather in Seattle".to_string(), vec![], Box::new(|_: &str| {}), AbortSignal::new())
            .await
            .unwrap();

        assert_eq!(outcome, TurnOutcome::Completed);
        let tool_message = context.messages().iter().find(|m| m.role == Role::Tool).expect("expected a tool-role message");
        assert_eq!(tool_message.tool_name.as_deref(), Some("get_weather"));
        assert_eq!(tool_message.text(), "72F sunny");
    }

    #[tokio::test]
    async fn with_config_sources_max_turns_from_the_config_instead_of_the_default() {
        let adapter = Arc::new(ScriptedAdapter {
            script: Mutex::new(
                (0..2)
                    .map(|_| {
                        vec![
                            StreamEvent::ToolCall { id: Uuid::new_v4().to_string(), name: "get_weather".to_string(), args: serde_json::json!({"location": "x"}) },
                            StreamEvent::Finish { reason: FinishReason::Tool },
                        ]
                    })
                    .collect(),
            ),
        });
        let mut registry = ToolRegistry::new();
        registry.register(weather_tool(), None);
        let tools = Arc::new(registry);
        let config = ConversationCoreConfig { max_turns: 2, ..ConversationCoreConfig::default() };
        let mut agent = AgentLoop::with_config(adapter, tools, PolicyEngine::new(ApprovalMode::Auto), NoopHooks, config);
        let mut context = context_manager();

        let outcome = agent
            .run_turn(&mut context, "llama3:8b", "loop forever".to_string(), vec![], Box::new(|_: &str| {}), AbortSignal::new())
            .await
            .unwrap();

        assert_eq!(outcome, TurnOutcome::MaxTurnsReached);
    }

    #[tokio::test]
    async fn max_turns_reached_with_pending_calls_appends_a_synthetic_notice() {
        let adapter = Arc::new(ScriptedAdapter {
            script: Mutex::new(
                (0..3)
                    .map(|_| {
                        vec![
                            StreamEvent::ToolCall { id: Uuid::new_v4().to_string(), name: "get_weather".to_string(), args: serde_json::json!({"location": "x"}) },
                            StreamEvent::Finish { reason: FinishReason::Tool },
                        ]
                    })
                    .collect(),
            ),
        });
        let mut registry = ToolRegistry::new();
        registry.register(weather_tool(), None);
        let tools = Arc::new(registry);
        let mut agent = AgentLoop::new(adapter, tools, PolicyEngine::new(ApprovalMode::Auto));
        agent.set_max_turns(3);
        let mut context = context_manager();

        let outcome = agent
            .run_turn(&mut context, "llama3:8b", "loop forever".to_string(), vec![], Box::new(|_: &str| {}), AbortSignal::new())
            .await
            .unwrap();

        assert_eq!(outcome, TurnOutcome::MaxTurnsReached);
        let last = context.messages().last().unwrap();
        assert!(last.text().contains("maximum number of turns"));
    }

    #[tokio::test]
    async fn aborted_signal_halts_the_loop_and_leaves_partial_state() {
        let adapter = Arc::new(ScriptedAdapter {
            script: Mutex::new(vec![vec![StreamEvent::Text { value: "partial".to_string() }]]),
        });
        let tools = Arc::new(ToolRegistry::new());
        let mut agent = AgentLoop::new(adapter, tools, PolicyEngine::new(ApprovalMode::Auto));
        let mut context = context_manager();
        let abort = AbortSignal::new();
        abort.abort();

        let outcome = agent
            .run_turn(&mut context, "llama3:8b", "hi".to_string(), vec![], Box::new(|_: &str| {}), abort)
            .await
            .unwrap();

        assert_eq!(outcome, TurnOutcome::Aborted);
        let events = context.drain_events();
        assert!(events.iter().any(|e| matches!(e, DomainEvent::TurnAborted { .. })));
    }

    struct DenyAllHooks;
    impl AgentHooks for DenyAllHooks {
        fn on_approval_requested(&self, pending: PendingApproval) {
            let _ = pending.reply.send(false);
        }
    }

    /// A hook that denies every approval should surface as `EUSERDENIED`,
    /// not silently succeed (spec §4.11, §7).
    #[tokio::test]
    async fn an_approval_hook_that_denies_the_call_fails_the_tool_with_euserdenied() {
        let adapter = Arc::new(ScriptedAdapter {
            script: Mutex::new(vec![
                vec![
                    StreamEvent::ToolCall { id: "c1".to_string(), name: "get_weather".to_string(), args: serde_json::json!({"location": "Seattle"}) },
                    StreamEvent::Finish { reason: FinishReason::Tool },
                ],
                vec![StreamEvent::Text { value: "done".to_string() }, StreamEvent::Finish { reason: FinishReason::Stop }],
            ]),
        });
        let mut registry = ToolRegistry::new();
        registry.register(weather_tool(), None);
        let tools = Arc::new(registry);
        let mut agent = AgentLoop::with_hooks(adapter, tools, PolicyEngine::new(ApprovalMode::Auto), DenyAllHooks);
        let mut context = context_manager();

        agent
            .run_turn(&mut context, "llama3:8b", "weather in Seattle".to_string(), vec![], Box::new(|_: &str| {}), AbortSignal::new())
            .await
            .unwrap();

        let tool_message = context.messages().iter().find(|m| m.role == Role::Tool).expect("expected a tool-role message");
        assert!(tool_message.text().contains("EUSERDENIED"));

        let events = context.drain_events();
        assert!(events.iter().any(|e| matches!(e, DomainEvent::ToolApprovalRequested { tool, .. } if tool == "get_weather")));
    }
}
