pub const DEFAULT_MODEL: &str = "glm-4.7";
pub const SUPPORTED_MODELS: &[&str] = &[
    "glm-4-plus",
    "glm-4.7",
    "glm-4.7-flash",
    "glm-4.6",
    "glm-4.6v",
    "glm-4.6v-flash",
    "glm-4.6v-flashx",
    "glm-4.5",
    "glm-4.5-air",
    "glm-4.5-x",
    "glm-4.5-airx",
    "glm-4.5-flash",
    "glm-4.5v",
    "glm-4-32b-0414-128k",
];

pub const REASONING_MODELS: &[&str] = &[
    "glm-4-plus",
    "glm-4.7",
    "glm-4.7-flash",
    "glm-4.6",
    "glm-4.5",
    "glm-4.5-air",
    "glm-4.5-x",
    "glm-4.5-airx",
    "glm-4.5-flash",
];

pub const GLM_4_PLUS: &str = "glm-4-plus";
pub const GLM_4_PLUS_DEEP_THINKING: &str = "glm-4-plus:thinking";
pub const GLM_4_7: &str = "glm-4.7";
pub const GLM_4_7_DEEP_THINKING: &str = "glm-4.7:thinking";
pub const GLM_4_7_FLASH: &str = "glm-4.7-flash";
pub const GLM_4_6: &str = "glm-4.6";
pub const GLM_4_6_DEEP_THINKING: &str = "glm-4.6:thinking";
pub const GLM_4_6V: &str = "glm-4.6v";
pub const GLM_4_6V_FLASH: &str = "glm-4.6v-flash";
pub const GLM_4_6V_FLASHX: &str = "glm-4.6v-flashx";
pub const GLM_4_5: &str = "glm-4.5";
pub const GLM_4_5_DEEP_THINKING: &str = "glm-4.5:thinking";
pub const GLM_4_5_AIR: &str = "glm-4.5-air";
pub const GLM_4_5_X: &str = "glm-4.5-x";
pub const GLM_4_5_AIRX: &str = "glm-4.5-airx";
pub const GLM_4_5_FLASH: &str = "glm-4.5-flash";
pub const GLM_4_5V: &str = "glm-4.5v";
pub const GLM_4_32B_0414_128K: &str = "glm-4-32b-0414-128k";
