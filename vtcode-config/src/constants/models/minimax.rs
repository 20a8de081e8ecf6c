pub const DEFAULT_MODEL: &str = MINIMAX_M2_1;
pub const SUPPORTED_MODELS: &[&str] = &[MINIMAX_M2_1, MINIMAX_M2_1_LIGHTNING, MINIMAX_M2];
pub const MINIMAX_M2_1: &str = "MiniMax-M2.1";
pub const MINIMAX_M2_1_LIGHTNING: &str = "MiniMax-M2.1-lightning";
pub const MINIMAX_M2: &str = "MiniMax-M2";
