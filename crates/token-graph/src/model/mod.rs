//! Node model.
//!
//! A [`Node`] is a flat record: id, optional parent id, sibling order key and a
//! [`Meta`] payload. Parent/child structure is derived by the store; nodes
//! never point at each other directly.
//!
//! | Meta variant      | Children                         | Consumes an alias path segment |
//! |-------------------|----------------------------------|--------------------------------|
//! | `Token`           | none (or none expected)          | final segment                  |
//! | `Group`           | groups, tokens                   | yes                            |
//! | `Set`             | groups, tokens                   | no                             |
//! | `Modifier`        | `ModifierContext`                | no                             |
//! | `ModifierContext` | groups, tokens                   | no                             |
//! | `Resolver`        | sets, modifiers                  | no                             |

pub mod token_type;
pub mod value;

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use serde_json::{Map, Value};

pub use token_type::{TokenType, UnknownTokenType};
pub use value::{
    AliasRef, Border, Color, ColorSpace, Dimension, DimensionUnit, Duration, DurationUnit, Field,
    FontFamily, GradientStop, LineCap, Literal, Shadow, StrokeKeyword, StrokeStyle, TokenValue,
    Transition, Typography,
};

/// Name of the token that carries a group's own value.
pub const ROOT_TOKEN_NAME: &str = "$root";

// ── NodeId ────────────────────────────────────────────────────────────────

/// Opaque node identifier, assigned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for NodeId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

// ── Meta ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deprecated {
    Flag(bool),
    Reason(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenMeta {
    pub name: String,
    pub description: Option<String>,
    pub deprecated: Option<Deprecated>,
    pub extensions: Option<Map<String, Value>>,
    pub declared_type: Option<TokenType>,
    pub value: TokenValue,
}

impl TokenMeta {
    pub fn new(name: impl Into<String>, value: impl Into<TokenValue>) -> Self {
        Self {
            name: name.into(),
            description: None,
            deprecated: None,
            extensions: None,
            declared_type: None,
            value: value.into(),
        }
    }

    pub fn with_type(mut self, token_type: TokenType) -> Self {
        self.declared_type = Some(token_type);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupMeta {
    pub name: String,
    pub description: Option<String>,
    pub deprecated: Option<Deprecated>,
    pub extensions: Option<Map<String, Value>>,
    pub declared_type: Option<TokenType>,
}

impl GroupMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn with_type(mut self, token_type: TokenType) -> Self {
        self.declared_type = Some(token_type);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetMeta {
    pub name: String,
    pub description: Option<String>,
    pub extensions: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModifierMeta {
    pub name: String,
    pub description: Option<String>,
    pub extensions: Option<Map<String, Value>>,
    pub default_context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContextMeta {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolverMeta {
    pub name: String,
    pub description: Option<String>,
}

/// Node payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Meta {
    Token(TokenMeta),
    Group(GroupMeta),
    Set(SetMeta),
    Modifier(ModifierMeta),
    ModifierContext(ContextMeta),
    Resolver(ResolverMeta),
}

impl Meta {
    pub fn name(&self) -> &str {
        match self {
            Meta::Token(m) => &m.name,
            Meta::Group(m) => &m.name,
            Meta::Set(m) => &m.name,
            Meta::Modifier(m) => &m.name,
            Meta::ModifierContext(m) => &m.name,
            Meta::Resolver(m) => &m.name,
        }
    }

    /// Type declared directly on a token or group.
    pub fn declared_type(&self) -> Option<TokenType> {
        match self {
            Meta::Token(m) => m.declared_type,
            Meta::Group(m) => m.declared_type,
            _ => None,
        }
    }

    pub fn as_token(&self) -> Option<&TokenMeta> {
        match self {
            Meta::Token(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupMeta> {
        match self {
            Meta::Group(m) => Some(m),
            _ => None,
        }
    }

    /// Containers that hold a token namespace without naming a path segment.
    pub fn is_scope_container(&self) -> bool {
        matches!(self, Meta::Set(_) | Meta::ModifierContext(_) | Meta::Resolver(_))
    }
}

// ── Node ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    /// Fractional sort key among siblings.
    pub order: String,
    pub meta: Meta,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, parent_id: Option<NodeId>, order: impl Into<String>, meta: Meta) -> Self {
        Self { id: id.into(), parent_id, order: order.into(), meta }
    }

    pub fn name(&self) -> &str {
        self.meta.name()
    }

    pub fn as_token(&self) -> Option<&TokenMeta> {
        self.meta.as_token()
    }

    pub fn is_token(&self) -> bool {
        matches!(self.meta, Meta::Token(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self.meta, Meta::Group(_))
    }
}
