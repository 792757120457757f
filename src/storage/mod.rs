//! Storage backends for decree.

pub mod memory;
pub mod traits;

pub use memory::InMemoryDecisionStore;
pub use traits::DecisionStore;
