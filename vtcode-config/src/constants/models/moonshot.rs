// Legacy Moonshot direct API models (kept for compatibility with tests)
pub const DEFAULT_MODEL: &str = "kimi-latest";
pub const SUPPORTED_MODELS: &[&str] = &[MINIMAX_M2_5, QWEN3_CODER_NEXT];
pub const REASONING_MODELS: &[&str] = &[];

pub const MINIMAX_M2_5: &str = "MiniMaxAI/MiniMax-M2.5";
pub const QWEN3_CODER_NEXT: &str = "qwen3-coder-next";
