//! token-graph-util - JSON helpers shared by the token-graph crates.

pub mod json_merge;
pub mod types;

pub use json_merge::{deep_merge, deep_merge_all};
pub use types::OneOrMany;
