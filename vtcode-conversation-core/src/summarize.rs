//! Summarization Service (spec §4.6, component H): prompts the model to
//! produce Level-1/2/3 summaries of message ranges or checkpoint text.

use async_trait::async_trait;
use thiserror::Error;

use crate::checkpoints::CompressionLevel;
use crate::message::Message;
use crate::provider::{AbortSignal, AdapterRequest, ProviderAdapter, StreamEvent};

#[derive(Debug, Error, Clone)]
pub enum SummarizationError {
    #[error("summarization request failed: {0}")]
    ProviderFailed(String),
    #[error("summarization timed out after {0}ms")]
    TimedOut(u64),
    #[error("model returned an empty summary")]
    Empty,
}

#[derive(Debug, Clone)]
pub struct SummaryResult {
    pub summary: String,
    pub token_count: usize,
    pub level: CompressionLevel,
    pub model: String,
}

fn prompt_for_level(level: CompressionLevel) -> &'static str {
    match level {
        CompressionLevel::L3Standard => {
            "Summarise preserving all decisions, named entities, and artifacts; target ~30% of original."
        }
        CompressionLevel::L2Reduced => {
            "Summarise preserving decisions and outcomes; drop intermediate reasoning; ~15%."
        }
        CompressionLevel::L1Compact => "Produce a topical abstract; ~5%.",
    }
}

/// The Summarization Service contract (spec §4.6). A synchronous (streaming
/// consumed to completion) LLM request per call.
#[async_trait]
pub trait SummarizationService: Send + Sync {
    async fn summarize_messages(&self, level: CompressionLevel, messages: &[Message]) -> Result<SummaryResult, SummarizationError>;

    /// Convenience for re-summarising already-compressed checkpoint text
    /// (aging, merging).
    async fn summarize_text(&self, text: &str, level: CompressionLevel) -> Result<SummaryResult, SummarizationError>;
}

/// Default implementation driving a [`ProviderAdapter`] to completion.
pub struct AdapterSummarizer {
    pub adapter: std::sync::Arc<dyn ProviderAdapter>,
    pub model: String,
    pub server_context_size: u32,
}

#[async_trait]
impl SummarizationService for AdapterSummarizer {
    async fn summarize_messages(&self, level: CompressionLevel, messages: &[Message]) -> Result<SummaryResult, SummarizationError> {
        let transcript: String = messages.iter().map(|m| format!("[{:?}] {}", m.role, m.text())).collect::<Vec<_>>().join("\n");
        self.run_summary(level, &transcript).await
    }

    async fn summarize_text(&self, text: &str, level: CompressionLevel) -> Result<SummaryResult, SummarizationError> {
        self.run_summary(level, text).await
    }
}

impl AdapterSummarizer {
    async fn run_summary(&self, level: CompressionLevel, input: &str) -> Result<SummaryResult, SummarizationError> {
        use futures::StreamExt;

        let instructions = prompt_for_level(level);
        let prompt = format!("{instructions}\n\n---\n{input}");
        let request = AdapterRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            tools: vec![],
            options: serde_json::Map::new(),
            server_context_size: self.server_context_size,
            think: false,
        };

        let mut stream = self.adapter.stream_chat(request, AbortSignal::new()).await;
        let mut summary = String::new();
        while let Some(event) = stream.next().await {
            match event {
                StreamEvent::Text { value } => summary.push_str(&value),
                StreamEvent::Error { message, .. } => return Err(SummarizationError::ProviderFailed(message)),
                StreamEvent::Finish { .. } => break,
                _ => {}
            }
        }

        let summary = summary.trim().to_string();
        if summary.is_empty() {
            return Err(SummarizationError::Empty);
        }

        let token_count = crate::estimator::estimate_tokens(&summary);
        let input_tokens = crate::estimator::estimate_tokens(input);

        // Never return a summary longer than the input (spec §4.6).
        let token_count = token_count.min(input_tokens.max(1));

        Ok(SummaryResult { summary, token_count, level, model: self.model.clone() })
    }
}

/// A deterministic, allocation-free summarizer for tests: shrinks input to
/// roughly the target ratio without calling a model.
pub struct MockSummarizer;

impl MockSummarizer {
    pub fn shrinking() -> Self {
        Self
    }

    fn ratio(level: CompressionLevel) -> f64 {
        match level {
            CompressionLevel::L3Standard => 0.30,
            CompressionLevel::L2Reduced => 0.15,
            CompressionLevel::L1Compact => 0.05,
        }
    }
}

#[async_trait]
impl SummarizationService for MockSummarizer {
    async fn summarize_messages(&self, level: CompressionLevel, messages: &[Message]) -> Result<SummaryResult, SummarizationError> {
        let transcript: String = messages.iter().map(Message::text).collect::<Vec<_>>().join(" ");
        self.summarize_text(&transcript, level).await
    }

    async fn summarize_text(&self, text: &str, level: CompressionLevel) -> Result<SummaryResult, SummarizationError> {
        if text.trim().is_empty() {
            return Err(SummarizationError::Empty);
        }
        let input_tokens = crate::estimator::estimate_tokens(text).max(1);
        let target = ((input_tokens as f64) * Self::ratio(level)).ceil().max(1.0) as usize;
        let words: Vec<&str> = text.split_whitespace().collect();
        let keep = target.min(words.len()).max(1);
        let summary = words[..keep].join(" ");
        let token_count = crate::estimator::estimate_tokens(&summary).min(input_tokens);
        Ok(SummaryResult { summary, token_count, level, model: "mock".to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn summary_is_never_longer_than_input() {
        let summarizer = MockSummarizer::shrinking();
        let long_text = "decision artifact name ".repeat(50);
        let result = summarizer.summarize_text(&long_text, CompressionLevel::L3Standard).await.unwrap();
        let input_tokens = crate::estimator::estimate_tokens(&long_text);
        assert!(result.token_count <= input_tokens);
    }

    #[tokio::test]
    async fn empty_input_fails() {
        let summarizer = MockSummarizer::shrinking();
        assert!(matches!(summarizer.summarize_text("", CompressionLevel::L1Compact).await, Err(SummarizationError::Empty)));
    }

    #[tokio::test]
    async fn lower_levels_compress_harder() {
        let summarizer = MockSummarizer::shrinking();
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa ".repeat(10);
        let l3 = summarizer.summarize_text(&text, CompressionLevel::L3Standard).await.unwrap();
        let l1 = summarizer.summarize_text(&text, CompressionLevel::L1Compact).await.unwrap();
        assert!(l1.token_count <= l3.token_count);
    }
}
