//! Conversation data model: messages, parts, and reasoning blocks (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a [`Message`] within the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A reasoning ("thinking") block attached to an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningBlock {
    pub token_count: usize,
    pub duration_ms: u64,
    pub collapsed: bool,
    pub content: String,
}

/// One ordered piece of a message's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessagePart {
    Text { value: String },
    ToolCall { id: String, name: String, args: serde_json::Value },
    ToolResult { tool_call_id: String, value: serde_json::Value },
    Reasoning(ReasoningBlock),
}

impl MessagePart {
    pub fn text(value: impl Into<String>) -> Self {
        MessagePart::Text { value: value.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessagePart::Text { value } => Some(value),
            _ => None,
        }
    }
}

/// An ordered, append-only conversation record (spec §3, "Message").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub parts: Vec<MessagePart>,
    pub timestamp: DateTime<Utc>,
    /// Set only when `role == Role::Tool`: the name of the tool that produced this message.
    pub tool_name: Option<String>,
    pub reasoning: Option<ReasoningBlock>,
}

impl Message {
    pub fn new(role: Role, parts: Vec<MessagePart>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            parts,
            timestamp: Utc::now(),
            tool_name: None,
            reasoning: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![MessagePart::text(text)])
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![MessagePart::text(text)])
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![MessagePart::text(text)])
    }

    /// Tool-result messages always carry a textual part, serialising structured
    /// values first (spec §4.2, "Message conversion").
    pub fn tool_result(tool_name: impl Into<String>, value: &serde_json::Value) -> Self {
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_default(),
        };
        let mut msg = Self::new(Role::Tool, vec![MessagePart::text(text)]);
        msg.tool_name = Some(tool_name.into());
        msg
    }

    /// Concatenation of every text part, in order.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(MessagePart::as_text)
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn tool_calls(&self) -> impl Iterator<Item = (&str, &str, &serde_json::Value)> {
        self.parts.iter().filter_map(|part| match part {
            MessagePart::ToolCall { id, name, args } => Some((id.as_str(), name.as_str(), args)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_result_serialises_structured_values_as_text() {
        let value = serde_json::json!({"temp_f": 72, "condition": "sunny"});
        let msg = Message::tool_result("get_weather", &value);
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_name.as_deref(), Some("get_weather"));
        assert!(msg.text().contains("temp_f"));
    }

    #[test]
    fn text_concatenates_all_text_parts_in_order() {
        let msg = Message::new(
            Role::Assistant,
            vec![MessagePart::text("Hel"), MessagePart::text("lo"), MessagePart::text(" world")],
        );
        assert_eq!(msg.text(), "Hello world");
    }
}
