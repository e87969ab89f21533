//! token-graph - design token graph engine.
//!
//! Tokens, groups, sets and modifiers live as flat [`model::Node`]s in a
//! [`store::NodeStore`], ordered among their siblings by fractional keys from
//! [`order`]. [`resolve::ValueResolver`] follows alias chains and type
//! inheritance over a store, and [`codec`] converts between stores and the two
//! interchange formats (the nested single-tree format and the 2025.10
//! resolver format).

// Leaves
pub mod order;
pub mod model;

pub mod store;
pub mod resolve;
pub mod codec;
pub mod cli;

pub use codec::{ParseError, ParseOptions, ParseOutput, SerializeError, SerializeOptions};
pub use model::{AliasRef, Literal, Meta, Node, NodeId, TokenType, TokenValue};
pub use resolve::{ResolveError, ResolvedToken, ValueResolver};
pub use store::{NodeStore, Transaction};
