//! Layered deep merge of JSON objects.
//!
//! Token documents are often split across several sources where later files
//! override earlier ones. Groups are unioned key by key; anything the caller
//! classifies as a leaf is replaced wholesale.

mod deep_merge;

pub use deep_merge::{deep_merge, deep_merge_all};
