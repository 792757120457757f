//! Operation payload builders.
//!
//! Fluent, validated builders for the engine's write operations.

mod commit;
mod supersede;

pub use commit::{CommitBuilder, CommitPayload};
pub use supersede::SupersedeFields;
