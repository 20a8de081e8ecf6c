//! Local LLM server adapter over an Ollama-style NDJSON HTTP endpoint
//! (spec §4.2, §6.1, §6.5). Grounded on the chunked-read pattern in
//! `vtcode-core::gemini::streaming::processor::StreamingProcessor`, generalised
//! to the local wire protocol and to the tagged [`super::StreamEvent`] set.

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use tokio::time::{Duration, timeout};

use crate::config::ConversationCoreConfig;

use super::{AbortSignal, AdapterErrorCode, AdapterRequest, EventStream, FinishReason, ProviderAdapter, StreamEvent, build_wire_request};
use super::wire::WireFrame;

/// Default local LLM server base URL (spec §6.5).
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub struct OllamaAdapter {
    client: reqwest::Client,
    base_url: String,
    frame_timeout: Duration,
    turn_timeout: Duration,
}

impl OllamaAdapter {
    pub fn new(base_url: impl Into<String>) -> Self {
        let config = ConversationCoreConfig::default();
        Self::with_config(base_url, &config)
    }

    /// Same as [`Self::new`] but with the frame/turn timeouts sourced from
    /// [`ConversationCoreConfig`] instead of the spec defaults.
    pub fn with_config(base_url: impl Into<String>, config: &ConversationCoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            frame_timeout: Duration::from_secs(config.frame_timeout_seconds),
            turn_timeout: Duration::from_secs(config.turn_timeout_seconds),
        }
    }
}

impl Default for OllamaAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
impl OllamaAdapter {
    fn frame_timeout(&self) -> Duration {
        self.frame_timeout
    }

    fn turn_timeout(&self) -> Duration {
        self.turn_timeout
    }
}

#[async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn stream_chat(&self, request: AdapterRequest, abort: AbortSignal) -> EventStream {
        let wire_request = build_wire_request(&request);
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let client = self.client.clone();

        let turn_timeout = self.turn_timeout;
        let frame_timeout = self.frame_timeout;

        Box::pin(stream! {
            let send_result = timeout(turn_timeout, client.post(&url).json(&wire_request).send()).await;

            let response = match send_result {
                Err(_) => {
                    yield StreamEvent::Error {
                        message: "turn timed out before receiving a response".to_string(),
                        code: Some(AdapterErrorCode::TimedOut),
                    };
                    return;
                }
                Ok(Err(err)) => {
                    yield StreamEvent::Error { message: err.to_string(), code: Some(classify_reqwest_error(&err)) };
                    return;
                }
                Ok(Ok(response)) => response,
            };

            if let Err(err) = response.error_for_status_ref() {
                yield StreamEvent::Error { message: err.to_string(), code: Some(AdapterErrorCode::Other(err.to_string())) };
                return;
            }

            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();

            loop {
                if abort.is_aborted() {
                    return;
                }

                let next = timeout(frame_timeout, byte_stream.next()).await;
                let chunk = match next {
                    Err(_) => {
                        yield StreamEvent::Error {
                            message: "timed out waiting for the next frame".to_string(),
                            code: Some(AdapterErrorCode::TimedOut),
                        };
                        return;
                    }
                    Ok(None) => break,
                    Ok(Some(Err(err))) => {
                        yield StreamEvent::Error { message: err.to_string(), code: Some(classify_reqwest_error(&err)) };
                        return;
                    }
                    Ok(Some(Ok(bytes))) => bytes,
                };

                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(newline_at) = buffer.find('\n') {
                    let line = buffer[..newline_at].trim().to_string();
                    buffer.drain(..=newline_at);
                    if line.is_empty() {
                        continue;
                    }

                    if abort.is_aborted() {
                        return;
                    }

                    match serde_json::from_str::<WireFrame>(&line) {
                        Ok(frame) => {
                            for event in frame_to_events(frame) {
                                let is_terminal = matches!(event, StreamEvent::Finish { .. } | StreamEvent::Error { .. });
                                yield event;
                                if is_terminal {
                                    return;
                                }
                            }
                        }
                        Err(_) => {
                            yield StreamEvent::Error {
                                message: format!("malformed frame: {line}"),
                                code: Some(AdapterErrorCode::Proto),
                            };
                            return;
                        }
                    }
                }
            }
        })
    }
}

fn frame_to_events(frame: WireFrame) -> Vec<StreamEvent> {
    match frame {
        WireFrame::Error { error } => vec![StreamEvent::Error { message: error, code: None }],
        WireFrame::Done { done_reason, .. } => {
            let reason = match done_reason.as_deref() {
                Some("length") => FinishReason::Length,
                Some("tool") => FinishReason::Tool,
                _ => FinishReason::Stop,
            };
            vec![StreamEvent::Finish { reason }]
        }
        WireFrame::Message { message } => {
            let mut events = Vec::new();
            if let Some(thinking) = message.thinking {
                if !thinking.is_empty() {
                    events.push(StreamEvent::Thinking { value: thinking });
                }
            }
            if let Some(content) = message.content {
                if !content.is_empty() {
                    events.push(StreamEvent::Text { value: content });
                }
            }
            for call in message.tool_calls.unwrap_or_default() {
                events.push(StreamEvent::ToolCall {
                    id: call.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                    name: call.function.name,
                    args: call.function.arguments,
                });
            }
            events
        }
    }
}

fn classify_reqwest_error(err: &reqwest::Error) -> AdapterErrorCode {
    if err.is_timeout() {
        AdapterErrorCode::TimedOut
    } else if err.is_connect() {
        if error_chain_has_dns_failure(err) { AdapterErrorCode::NotFound } else { AdapterErrorCode::ConnRefused }
    } else if err.is_decode() {
        AdapterErrorCode::Proto
    } else {
        AdapterErrorCode::Other(err.to_string())
    }
}

/// `reqwest::Error::is_connect()` is true for both connection-refused and
/// unresolved-host failures, so distinguish them by walking the source chain
/// for the DNS-resolver's message signature (hyper's resolver reports
/// failures this way rather than through a distinct error variant).
fn error_chain_has_dns_failure(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(current) = cause {
        if is_dns_failure_message(&current.to_string()) {
            return true;
        }
        cause = current.source();
    }
    false
}

fn is_dns_failure_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("dns error")
        || message.contains("failed to lookup address")
        || message.contains("no address associated with hostname")
        || message.contains("name or service not known")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_config_overrides_the_default_frame_and_turn_timeouts() {
        let config = ConversationCoreConfig { frame_timeout_seconds: 5, turn_timeout_seconds: 120, ..ConversationCoreConfig::default() };
        let adapter = OllamaAdapter::with_config(DEFAULT_BASE_URL, &config);
        assert_eq!(adapter.frame_timeout(), Duration::from_secs(5));
        assert_eq!(adapter.turn_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn done_frame_with_tool_reason_maps_to_finish_tool() {
        let frame = WireFrame::Done { done: true, done_reason: Some("tool".to_string()) };
        let events = frame_to_events(frame);
        assert!(matches!(events[0], StreamEvent::Finish { reason: FinishReason::Tool }));
    }

    #[test]
    fn dns_failure_messages_are_recognised() {
        assert!(is_dns_failure_message("dns error: failed to lookup address information"));
        assert!(is_dns_failure_message("error trying to connect: dns error: no address associated with hostname"));
        assert!(is_dns_failure_message("Name or service not known"));
    }

    #[test]
    fn connection_refused_is_not_mistaken_for_dns_failure() {
        assert!(!is_dns_failure_message("connection refused (os error 111)"));
    }

    #[test]
    fn error_chain_walks_into_the_source_to_find_a_dns_failure() {
        let source = std::io::Error::other("dns error: failed to lookup address information");
        let wrapped = std::io::Error::new(std::io::ErrorKind::Other, source);
        assert!(error_chain_has_dns_failure(&wrapped));
    }

    #[test]
    fn error_chain_does_not_flag_an_unrelated_source() {
        let wrapped = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        assert!(!error_chain_has_dns_failure(&wrapped));
    }

    #[test]
    fn error_frame_maps_to_error_event() {
        let frame = WireFrame::Error { error: "boom".to_string() };
        let events = frame_to_events(frame);
        assert!(matches!(&events[0], StreamEvent::Error { message, .. } if message == "boom"));
    }
}
