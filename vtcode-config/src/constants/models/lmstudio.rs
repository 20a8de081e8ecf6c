pub const DEFAULT_MODEL: &str = META_LLAMA_31_8B_INSTRUCT;
pub const SUPPORTED_MODELS: &[&str] = &[
    META_LLAMA_3_8B_INSTRUCT,
    META_LLAMA_31_8B_INSTRUCT,
    QWEN25_7B_INSTRUCT,
    GEMMA_2_2B_IT,
    GEMMA_2_9B_IT,
    PHI_31_MINI_4K_INSTRUCT,
];
pub const REASONING_MODELS: &[&str] = &[];

pub const META_LLAMA_3_8B_INSTRUCT: &str = "lmstudio-community/meta-llama-3-8b-instruct";
pub const META_LLAMA_31_8B_INSTRUCT: &str = "lmstudio-community/meta-llama-3.1-8b-instruct";
pub const QWEN25_7B_INSTRUCT: &str = "lmstudio-community/qwen2.5-7b-instruct";
pub const GEMMA_2_2B_IT: &str = "lmstudio-community/gemma-2-2b-it";
pub const GEMMA_2_9B_IT: &str = "lmstudio-community/gemma-2-9b-it";
pub const PHI_31_MINI_4K_INSTRUCT: &str = "lmstudio-community/phi-3.1-mini-4k-instruct";
