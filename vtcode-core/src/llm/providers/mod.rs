pub mod anthropic;
// pub mod base;  // Temporarily commented out
pub mod deepseek;
pub mod error_handling;
pub mod gemini;
pub mod lmstudio;
pub mod minimax;
pub mod moonshot;
pub mod ollama;
pub mod openai;
pub mod openrouter;
pub mod streaming_progress;
pub mod xai;
pub mod zai;

mod codex_prompt;
pub mod common;
mod reasoning;
mod shared;

pub(crate) use codex_prompt::gpt5_codex_developer_prompt;
pub(crate) use reasoning::{ReasoningBuffer, extract_reasoning_trace, split_reasoning_from_text};

pub use anthropic::AnthropicProvider;
pub use deepseek::DeepSeekProvider;
pub use gemini::GeminiProvider;
pub use lmstudio::LmStudioProvider;
pub use minimax::MinimaxProvider;
pub use moonshot::MoonshotProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use openrouter::OpenRouterProvider;
pub use streaming_progress::{
    StreamingProgressBuilder, StreamingProgressCallback, StreamingProgressTracker,
};
pub use xai::XAIProvider;
pub use zai::ZAIProvider;
