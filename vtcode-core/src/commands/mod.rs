//! Command implementations for different agent workflows

pub mod analyze;
pub mod ask;
pub mod create_project;
pub mod init;
pub mod memory;
pub mod stats;
pub mod validate;

pub use analyze::*;
pub use ask::*;
pub use create_project::*;
pub use init::*;
pub use memory::*;
pub use stats::*;
pub use validate::*;
