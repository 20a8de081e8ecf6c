pub mod agent;
pub mod auth;
pub mod automation;
pub mod commands;
pub mod dotfile_protection;
pub mod model;
pub mod permissions;
pub mod plugins;
pub mod prompt_cache;
pub mod provider;
pub mod sandbox;
pub mod security;
pub mod skills;
pub mod tools;

pub use agent::{AgentConfig, AgentOnboardingConfig, OpenResponsesConfig};
pub use auth::{AuthConfig, OpenRouterAuthConfig};
pub use automation::{AutomationConfig, FullAutoConfig};
pub use commands::CommandsConfig;
pub use dotfile_protection::DotfileProtectionConfig;
pub use model::ModelConfig;
pub use permissions::PermissionsConfig;
pub use plugins::{PluginRuntimeConfig, PluginTrustLevel};
pub use prompt_cache::{
    AnthropicPromptCacheSettings, DeepSeekPromptCacheSettings, GeminiPromptCacheMode,
    GeminiPromptCacheSettings, MoonshotPromptCacheSettings, OpenAIPromptCacheKeyMode,
    OpenAIPromptCacheSettings, OpenRouterPromptCacheSettings, PromptCachingConfig,
    ProviderPromptCachingConfig, XAIPromptCacheSettings, ZaiPromptCacheSettings,
};
pub use provider::{AnthropicConfig, ToolSearchConfig};
pub use sandbox::{
    DockerSandboxConfig, ExternalSandboxConfig, ExternalSandboxType, MicroVMSandboxConfig,
    NetworkAllowlistEntryConfig, NetworkConfig, ResourceLimitsConfig, ResourceLimitsPreset,
    SandboxConfig, SandboxMode, SeccompConfig, SeccompProfilePreset, SensitivePathsConfig,
};
pub use security::{GatekeeperConfig, SecurityConfig};
pub use skills::{PromptFormat, SkillsConfig, SkillsRenderMode};
pub use tools::{EditorToolConfig, ToolPolicy, ToolsConfig, WebFetchConfig};
