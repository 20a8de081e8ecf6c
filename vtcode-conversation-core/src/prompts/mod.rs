//! Prompt Registry, Tiered Store, and System Prompt Builder (spec §4.3–§4.4).

pub mod builder;
pub mod registry;
pub mod tiered_store;

pub use builder::{BuilderInput, ModelClass, build_system_prompt};
pub use registry::{PromptEntry, PromptRegistry, PromptSource};
pub use tiered_store::{Mode, TieredStore};
