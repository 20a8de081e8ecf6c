//! Tool Registry (spec §4.11, component M, first half): registration,
//! argument validation, and executor dispatch with per-kind truncation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::circuit_breaker::CircuitBreaker;
use crate::config::ConversationCoreConfig;

const FILE_TRUNCATE_BYTES: usize = 10 * 1024;
const SHELL_TRUNCATE_BYTES: usize = 10 * 1024;
const DIRECTORY_TRUNCATE_ITEMS: usize = 1000;
const SEARCH_TRUNCATE_MATCHES: usize = 100;
const TRUNCATION_MARKER: &str = "[truncated]";

/// How a successful tool result should be truncated, if at all (spec §4.11,
/// "Execution").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    File,
    Directory,
    Search,
    Shell,
    Opaque,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    NotFound(String),
    #[error("invalid arguments: {message} (field: {field:?})")]
    Einval { message: String, field: Option<String> },
    #[error("tool timed out after {0:?}")]
    TimedOut(Duration),
    #[error("circuit open for tool {0}, cooling down")]
    CircuitOpen(String),
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

/// A registered tool (spec §4.11, "Registry").
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters_schema: Value,
    pub output_kind: OutputKind,
    pub timeout: Duration,
    pub executor: Arc<dyn ToolExecutor>,
}

/// The executor bound to a [`ToolDefinition`]. Separate from the definition
/// so registration and invocation can be tested independently.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, args: Value) -> Result<Value, String>;
}

/// Success/failure result shape fed back to the Agent Loop as a `tool` role
/// message (spec §4.11, "Result shape").
#[derive(Debug, Clone, serde::Serialize)]
#[serde(untagged)]
pub enum ToolOutcome {
    Ok { ok: bool, value: Value },
    Err { ok: bool, error: ToolFailure },
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolFailure {
    pub code: String,
    pub message: String,
    pub tool: String,
    pub args: Value,
}

impl ToolOutcome {
    pub fn success(value: Value) -> Self {
        ToolOutcome::Ok { ok: true, value }
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>, tool: impl Into<String>, args: Value) -> Self {
        ToolOutcome::Err { ok: false, error: ToolFailure { code: code.into(), message: message.into(), tool: tool.into(), args } }
    }
}

/// Tool Registry: unique names, replace-on-reregister, source-tagged
/// de-registration for extension disconnect (spec §4.11).
pub struct ToolRegistry {
    tools: HashMap<String, (ToolDefinition, Option<String>)>,
    circuit_breaker: CircuitBreaker,
    default_timeout: Duration,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_config(&ConversationCoreConfig::default())
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same as [`Self::new`] but with the per-tool fallback timeout sourced
    /// from [`ConversationCoreConfig`] instead of the spec default.
    pub fn with_config(config: &ConversationCoreConfig) -> Self {
        Self {
            tools: HashMap::new(),
            circuit_breaker: CircuitBreaker::default(),
            default_timeout: Duration::from_secs(config.tool_timeout_seconds),
        }
    }

    pub fn register(&mut self, definition: ToolDefinition, source: Option<String>) {
        self.tools.insert(definition.name.clone(), (definition, source));
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.tools.remove(name).is_some()
    }

    /// De-register every tool tagged with `source` (spec §4.11, extension disconnect).
    pub fn unregister_source(&mut self, source: &str) -> usize {
        let before = self.tools.len();
        self.tools.retain(|_, (_, tag)| tag.as_deref() != Some(source));
        before - self.tools.len()
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name).map(|(def, _)| def)
    }

    pub fn list(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values().map(|(def, _)| def)
    }

    fn validate_args(schema: &Value, args: &Value) -> Result<(), ToolError> {
        jsonschema::validate(schema, args).map_err(|err| ToolError::Einval {
            message: err.to_string(),
            field: Some(err.instance_path.to_string()),
        })
    }

    fn truncate(kind: OutputKind, value: Value) -> Value {
        match kind {
            OutputKind::File | OutputKind::Shell => {
                let limit = if kind == OutputKind::File { FILE_TRUNCATE_BYTES } else { SHELL_TRUNCATE_BYTES };
                if let Value::String(text) = &value {
                    if text.len() > limit {
                        let truncated = if kind == OutputKind::Shell {
                            let start = text.len() - limit;
                            format!("{TRUNCATION_MARKER}{}", &text[start..])
                        } else {
                            format!("{}{TRUNCATION_MARKER}", &text[..limit])
                        };
                        return Value::String(truncated);
                    }
                }
                value
            }
            OutputKind::Directory => {
                if let Value::Array(items) = &value {
                    if items.len() > DIRECTORY_TRUNCATE_ITEMS {
                        let mut truncated: Vec<Value> = items[..DIRECTORY_TRUNCATE_ITEMS].to_vec();
                        truncated.push(Value::String(TRUNCATION_MARKER.to_string()));
                        return Value::Array(truncated);
                    }
                }
                value
            }
            OutputKind::Search => {
                if let Value::Array(items) = &value {
                    if items.len() > SEARCH_TRUNCATE_MATCHES {
                        let mut truncated: Vec<Value> = items[..SEARCH_TRUNCATE_MATCHES].to_vec();
                        truncated.push(Value::String(TRUNCATION_MARKER.to_string()));
                        return Value::Array(truncated);
                    }
                }
                value
            }
            OutputKind::Opaque => value,
        }
    }

    /// Validate, run under the circuit breaker and timeout, and truncate
    /// per-kind (spec §4.11, "Execution"). Approval is the caller's
    /// responsibility via [`super::policy::PolicyEngine`] before calling this.
    pub async fn execute(&self, name: &str, args: Value) -> ToolOutcome {
        let Some((definition, _)) = self.tools.get(name) else {
            return ToolOutcome::failure("ENOTFOUND", format!("unknown tool: {name}"), name, args);
        };

        if !self.circuit_breaker.allow(name) {
            return ToolOutcome::failure("ECIRCUITOPEN", "tool is cooling down after repeated failures", name, args);
        }

        if let Err(ToolError::Einval { message, field }) = Self::validate_args(&definition.parameters_schema, &args) {
            return ToolOutcome::Err {
                ok: false,
                error: ToolFailure { code: "EINVAL".to_string(), message, tool: name.to_string(), args: field.map(Value::String).unwrap_or(args) },
            };
        }

        let timeout = if definition.timeout.is_zero() { self.default_timeout } else { definition.timeout };
        let executor = definition.executor.clone();
        let output_kind = definition.output_kind;
        let args_for_exec = args.clone();

        match tokio::time::timeout(timeout, executor.execute(args_for_exec)).await {
            Ok(Ok(value)) => {
                self.circuit_breaker.record_success(name);
                ToolOutcome::success(Self::truncate(output_kind, value))
            }
            Ok(Err(message)) => {
                self.circuit_breaker.record_failure(name);
                ToolOutcome::failure("EEXEC", message, name, args)
            }
            Err(_) => {
                self.circuit_breaker.record_failure(name);
                ToolOutcome::failure("ETIMEOUT", format!("timed out after {timeout:?}"), name, args)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl ToolExecutor for Echo {
        async fn execute(&self, args: Value) -> Result<Value, String> {
            Ok(args)
        }
    }

    struct Never;

    #[async_trait]
    impl ToolExecutor for Never {
        async fn execute(&self, _args: Value) -> Result<Value, String> {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl ToolExecutor for AlwaysFails {
        async fn execute(&self, _args: Value) -> Result<Value, String> {
            Err("boom".to_string())
        }
    }

    fn echo_tool() -> ToolDefinition {
        ToolDefinition {
            name: "read_file".to_string(),
            description: "reads a file".to_string(),
            parameters_schema: serde_json::json!({
                "type": "object",
                "properties": {"path": {"type": "string"}},
                "required": ["path"]
            }),
            output_kind: OutputKind::File,
            timeout: Duration::from_secs(1),
            executor: Arc::new(Echo),
        }
    }

    #[tokio::test]
    async fn invalid_args_return_einval_without_calling_the_executor() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool(), None);
        let outcome = registry.execute("read_file", serde_json::json!({})).await;
        match outcome {
            ToolOutcome::Err { error, .. } => assert_eq!(error.code, "EINVAL"),
            _ => panic!("expected validation failure"),
        }
    }

    #[tokio::test]
    async fn unknown_tool_fails_with_not_found() {
        let registry = ToolRegistry::new();
        let outcome = registry.execute("nonexistent", serde_json::json!({})).await;
        match outcome {
            ToolOutcome::Err { error, .. } => assert_eq!(error.code, "ENOTFOUND"),
            _ => panic!("expected not-found failure"),
        }
    }

    #[tokio::test]
    async fn valid_call_succeeds_and_truncates_large_file_output() {
        let mut registry = ToolRegistry::new();
        let mut tool = echo_tool();
        tool.executor = Arc::new(Echo);
        registry.register(tool, None);
        let big = "a".repeat(FILE_TRUNCATE_BYTES + 500);
        let outcome = registry.execute("read_file", serde_json::json!(big)).await;
        match outcome {
            ToolOutcome::Ok { value, .. } => {
                let text = value.as_str().unwrap();
                assert!(text.ends_with(TRUNCATION_MARKER));
                assert!(text.len() < big.len());
            }
            ToolOutcome::Err { error, .. } => panic!("expected success, got {error:?}"),
        }
    }

    #[tokio::test]
    async fn reregistering_same_name_replaces_the_prior_definition() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool(), None);
        let mut replaced = echo_tool();
        replaced.description = "replacement".to_string();
        registry.register(replaced, None);
        assert_eq!(registry.get("read_file").unwrap().description, "replacement");
        assert_eq!(registry.list().count(), 1);
    }

    #[tokio::test]
    async fn unregister_source_only_removes_matching_extension_tools() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool(), Some("ext-a".to_string()));
        let mut other = echo_tool();
        other.name = "other_tool".to_string();
        registry.register(other, Some("ext-b".to_string()));
        let removed = registry.unregister_source("ext-a");
        assert_eq!(removed, 1);
        assert!(registry.get("read_file").is_none());
        assert!(registry.get("other_tool").is_some());
    }

    #[tokio::test]
    async fn a_zero_second_configured_timeout_times_out_a_tool_with_no_explicit_timeout() {
        let config = ConversationCoreConfig { tool_timeout_seconds: 0, ..ConversationCoreConfig::default() };
        let mut registry = ToolRegistry::with_config(&config);
        let mut tool = echo_tool();
        tool.timeout = Duration::ZERO;
        tool.executor = Arc::new(Never);
        registry.register(tool, None);
        let outcome = registry.execute("read_file", serde_json::json!({"path": "x"})).await;
        match outcome {
            ToolOutcome::Err { error, .. } => assert_eq!(error.code, "ETIMEOUT"),
            _ => panic!("expected a timeout failure"),
        }
    }

    #[tokio::test]
    async fn repeated_failures_trip_the_circuit_breaker() {
        let mut registry = ToolRegistry::new();
        registry.circuit_breaker = CircuitBreaker::new(super::super::circuit_breaker::CircuitBreakerConfig {
            failure_threshold: 2,
            cooldown: Duration::from_secs(60),
        });
        let mut failing = echo_tool();
        failing.executor = Arc::new(AlwaysFails);
        registry.register(failing, None);

        registry.execute("read_file", serde_json::json!({"path": "x"})).await;
        registry.execute("read_file", serde_json::json!({"path": "x"})).await;
        let outcome = registry.execute("read_file", serde_json::json!({"path": "x"})).await;
        match outcome {
            ToolOutcome::Err { error, .. } => assert_eq!(error.code, "ECIRCUITOPEN"),
            _ => panic!("expected circuit-open failure"),
        }
    }
}
