pub mod acp_fixtures;
pub mod common;
pub mod mock_data;

// Re-export commonly used test utilities
pub use acp_fixtures::*;
pub use common::*;
pub use mock_data::*;
