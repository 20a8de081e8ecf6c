pub const DEFAULT_MODEL: &str = "grok-4";
pub const SUPPORTED_MODELS: &[&str] = &[
    "grok-4",
    "grok-4-mini",
    "grok-4-code",
    "grok-4-code-latest",
    "grok-4-vision",
    "grok-4-1-fast",
    "grok-code-fast-1",
    "grok-4-fast",
    "grok-3",
    "grok-3-mini",
    "grok-2-1212",
    "grok-2-vision-1212",
    "grok-beta",
];

pub const GROK_4: &str = "grok-4";
pub const GROK_4_MINI: &str = "grok-4-mini";
pub const GROK_4_CODE: &str = "grok-4-code";
pub const GROK_4_CODE_LATEST: &str = "grok-4-code-latest";
pub const GROK_4_VISION: &str = "grok-4-vision";
pub const GROK_4_1_FAST: &str = "grok-4-1-fast";
pub const GROK_CODE_FAST_1: &str = "grok-code-fast-1";
pub const GROK_4_FAST: &str = "grok-4-fast";
pub const GROK_3: &str = "grok-3";
pub const GROK_3_MINI: &str = "grok-3-mini";
pub const GROK_2_1212: &str = "grok-2-1212";
pub const GROK_2_VISION_1212: &str = "grok-2-vision-1212";
pub const GROK_BETA: &str = "grok-beta";
