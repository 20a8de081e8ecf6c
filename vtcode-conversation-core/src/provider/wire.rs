//! Local LLM wire protocol (spec §6.1): newline-delimited JSON request/response
//! framing shared by Ollama-compatible local servers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{AdapterRequest, ToolSchema};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub options: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<WireToolSpec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub think: Option<bool>,
    pub stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireToolCallFunction {
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireToolCallFrame {
    #[serde(default)]
    pub id: Option<String>,
    pub function: WireToolCallFunction,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct WireMessageFrame {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub thinking: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<WireToolCallFrame>>,
}

/// One newline-delimited response frame (spec §6.1).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireFrame {
    Message { message: WireMessageFrame },
    Done { done: bool, done_reason: Option<String> },
    Error { error: String },
}

pub(super) fn build_wire_request(request: &AdapterRequest) -> WireRequest {
    let mut options = request.options.clone();
    options.insert("num_ctx".to_string(), json!(request.server_context_size));

    // Option key mirroring (spec §4.2): any client-supplied `maxTokens` MUST
    // also be sent as both `max_new_tokens` and `max_tokens`.
    if let Some(max_tokens) = options.get("maxTokens").cloned() {
        options.insert("max_new_tokens".to_string(), max_tokens.clone());
        options.insert("max_tokens".to_string(), max_tokens);
    }

    let messages = request
        .messages
        .iter()
        .map(|message| WireMessage {
            role: role_str(message.role).to_string(),
            content: message.text(),
            name: message.tool_name.clone(),
        })
        .collect();

    let tools = if request.tools.is_empty() {
        None
    } else {
        Some(request.tools.iter().map(tool_to_wire).collect())
    };

    WireRequest {
        model: request.model.clone(),
        messages,
        options,
        tools,
        think: request.think.then_some(true),
        stream: true,
    }
}

fn tool_to_wire(tool: &ToolSchema) -> WireToolSpec {
    WireToolSpec {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters: tool.parameters.clone(),
    }
}

fn role_str(role: crate::message::Role) -> &'static str {
    match role {
        crate::message::Role::System => "system",
        crate::message::Role::User => "user",
        crate::message::Role::Assistant => "assistant",
        crate::message::Role::Tool => "tool",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    fn sample_request() -> AdapterRequest {
        let mut options = Map::new();
        options.insert("maxTokens".to_string(), json!(256));
        options.insert("temperature".to_string(), json!(0.2));
        AdapterRequest {
            model: "llama3:8b".to_string(),
            messages: vec![Message::user("hi")],
            tools: vec![],
            options,
            server_context_size: 13926,
            think: false,
        }
    }

    #[test]
    fn max_tokens_mirrors_to_all_three_keys() {
        let wire = build_wire_request(&sample_request());
        let max_tokens = wire.options.get("maxTokens").unwrap();
        assert_eq!(wire.options.get("max_new_tokens").unwrap(), max_tokens);
        assert_eq!(wire.options.get("max_tokens").unwrap(), max_tokens);
    }

    #[test]
    fn num_ctx_is_set_to_server_size() {
        let wire = build_wire_request(&sample_request());
        assert_eq!(wire.options.get("num_ctx").unwrap(), &json!(13926));
    }

    #[test]
    fn unknown_option_keys_pass_through_unchanged() {
        let wire = build_wire_request(&sample_request());
        assert_eq!(wire.options.get("temperature").unwrap(), &json!(0.2));
    }
}
