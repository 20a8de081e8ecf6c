pub const RENDERER_CONTEXT7: &str = "context7";
pub const RENDERER_SEQUENTIAL_THINKING: &str = "sequential-thinking";

/// Default startup timeout for MCP servers in milliseconds (60 seconds)
/// Can be overridden via config: mcp.startup_timeout_seconds
pub const DEFAULT_STARTUP_TIMEOUT_MS: u64 = 60_000;
