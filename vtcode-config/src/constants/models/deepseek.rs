pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const SUPPORTED_MODELS: &[&str] = &["deepseek-chat", "deepseek-reasoner"];

pub const DEEPSEEK_CHAT: &str = "deepseek-chat";
pub const DEEPSEEK_REASONER: &str = "deepseek-reasoner";
