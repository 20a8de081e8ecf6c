mod complexity;
mod init;
mod mcp_tools;
mod signal;
mod skill_setup;
mod types;
mod ui;

pub(crate) use init::initialize_session;
pub use mcp_tools::build_mcp_tool_definitions;
pub(crate) use signal::spawn_signal_handler;
#[allow(unused_imports)]
pub(crate) use types::{SessionState, SessionUISetup};
pub(crate) use ui::initialize_session_ui;
