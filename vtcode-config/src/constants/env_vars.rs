pub const GEMINI_BASE_URL: &str = "GEMINI_BASE_URL";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const HUGGINGFACE_BASE_URL: &str = "HUGGINGFACE_BASE_URL";
pub const ANTHROPIC_BASE_URL: &str = "ANTHROPIC_BASE_URL";
pub const OPENROUTER_BASE_URL: &str = "OPENROUTER_BASE_URL";
pub const XAI_BASE_URL: &str = "XAI_BASE_URL";
pub const DEEPSEEK_BASE_URL: &str = "DEEPSEEK_BASE_URL";
pub const Z_AI_BASE_URL: &str = "Z_AI_BASE_URL";
pub const ZAI_BASE_URL: &str = "ZAI_BASE_URL";
pub const MOONSHOT_BASE_URL: &str = "MOONSHOT_BASE_URL";
pub const LMSTUDIO_BASE_URL: &str = "LMSTUDIO_BASE_URL";
pub const OLLAMA_BASE_URL: &str = "OLLAMA_BASE_URL";
pub const MINIMAX_BASE_URL: &str = "MINIMAX_BASE_URL";
pub const OPENRESPONSES_BASE_URL: &str = "OPENRESPONSES_BASE_URL";

/// Environment variable for setting maximum thinking budget tokens
/// Set to 63999 to get 2x the default thinking budget on 64K output models
/// See: https://decodeclaude.com/ultrathink-deprecated/
pub const MAX_THINKING_TOKENS: &str = "MAX_THINKING_TOKENS";
