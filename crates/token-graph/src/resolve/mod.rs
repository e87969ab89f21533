//! Value resolution engine.
//!
//! Resolves a token's effective type and fully dereferenced literal by
//! following alias chains (whole-value and per composite field) and group
//! type inheritance.
//!
//! Effective type, highest priority first:
//!
//! 1. the token's own `$type`
//! 2. the nearest ancestor Group's `$type`
//! 3. for an alias, the effective type of the aliased token
//!
//! Cycles are detected with an explicit visited set threaded through the
//! recursion. [`ValueResolver::is_alias_circular`] walks the same edges
//! without raising.

mod scope;

use std::collections::HashSet;

use indexmap::IndexSet;
use serde_json::Number;
use thiserror::Error;

use crate::model::{
    AliasRef, Border, Color, Dimension, Duration, Field, FontFamily, GradientStop, Literal, Meta,
    Node, NodeId, Shadow, StrokeStyle, TokenType, TokenValue, Transition, Typography,
    ROOT_TOKEN_NAME,
};
use crate::store::NodeStore;

pub(crate) use scope::root_token;
use scope::Scope;

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolveError {
    /// Carries the reference exactly as written, e.g. `{colors.missing}`.
    #[error("unresolved reference {0}")]
    UnresolvedReference(String),
    /// Token paths along the cycle; the first entry is repeated at the end.
    #[error("circular reference: {}", .0.join(" -> "))]
    CircularReference(Vec<String>),
    #[error("type of token `{0}` cannot be determined")]
    TypeIndeterminate(String),
    #[error("token `{token}` is typed {expected} but resolves to a {found} value")]
    TypeMismatch {
        token: String,
        expected: TokenType,
        found: TokenType,
    },
    #[error("node `{0}` is not a token")]
    NotAToken(String),
    #[error("no node with id `{0}`")]
    UnknownNode(String),
}

// ── Results ───────────────────────────────────────────────────────────────

/// A fully resolved token: no alias remains anywhere in `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedToken {
    pub token_type: TokenType,
    pub value: Literal,
}

/// The stored value of a token, as an editor shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawToken<'s> {
    /// The token's own `$type`, or the kind of its literal; never inherited.
    pub token_type: Option<TokenType>,
    pub value: &'s TokenValue,
}

// ── Resolver ──────────────────────────────────────────────────────────────

/// Read-only resolution over a committed [`NodeStore`].
#[derive(Debug, Clone, Copy)]
pub struct ValueResolver<'s> {
    store: &'s NodeStore,
}

type Visited<'s> = IndexSet<&'s str>;

impl<'s> ValueResolver<'s> {
    pub fn new(store: &'s NodeStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &'s NodeStore {
        self.store
    }

    /// Resolve the effective type and literal of token `id`.
    pub fn resolve_value(&self, id: &str) -> Result<ResolvedToken, ResolveError> {
        let node = self.token_node(id)?;
        self.resolve_node(node, &mut Visited::new())
    }

    /// The stored value without following aliases or ancestor types.
    pub fn resolve_raw(&self, id: &str) -> Result<RawToken<'s>, ResolveError> {
        let node = self.token_node(id)?;
        let token = node.as_token().ok_or_else(|| ResolveError::NotAToken(id.to_string()))?;
        let token_type = token
            .declared_type
            .or_else(|| token.value.as_literal().map(Literal::token_type));
        Ok(RawToken { token_type, value: &token.value })
    }

    /// Effective type of token `id` without resolving its value.
    pub fn effective_type(&self, id: &str) -> Result<TokenType, ResolveError> {
        let node = self.token_node(id)?;
        self.effective_type_of(node, &mut Visited::new())
    }

    /// Resolve every token in the store, in insertion order.
    pub fn resolve_tokens(&self) -> Vec<(&'s NodeId, Result<ResolvedToken, ResolveError>)> {
        self.store
            .tokens()
            .map(|node| (&node.id, self.resolve_node(node, &mut Visited::new())))
            .collect()
    }

    /// Would aliasing `source` to `target` close a cycle?
    ///
    /// Follows every alias edge reachable from `target` (whole-value and
    /// composite fields). Unresolvable edges are ignored.
    pub fn is_alias_circular(&self, source: &str, target: &str) -> bool {
        if source == target {
            return true;
        }
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&'s Node> = self.store.get_node(target).into_iter().collect();
        while let Some(node) = stack.pop() {
            if !seen.insert(node.id.as_str()) {
                continue;
            }
            let Some(token) = node.as_token() else { continue };
            for alias in token.value.aliases() {
                if let Ok(next) = self.find_alias_target(alias, node) {
                    if next.id.as_str() == source {
                        return true;
                    }
                    stack.push(next);
                }
            }
        }
        false
    }

    /// Find the token an alias held by `from` points at.
    pub fn find_alias_target(&self, alias: &AliasRef, from: &Node) -> Result<&'s Node, ResolveError> {
        let unresolved = || ResolveError::UnresolvedReference(alias.to_string());
        match alias {
            AliasRef::Id(id) => {
                let node = self.store.get_node(id).ok_or_else(unresolved)?;
                match &node.meta {
                    Meta::Token(_) => Ok(node),
                    Meta::Group(_) => root_token(self.store, id).ok_or_else(unresolved),
                    _ => Err(unresolved()),
                }
            }
            AliasRef::Path(path) => {
                let segments: Vec<&str> = path.split('.').collect();
                Scope::new(self.store, Some(from.id.as_str()))
                    .lookup(&segments)
                    .ok_or_else(unresolved)
            }
        }
    }

    /// Look up a token by dotted path as seen from node `from`.
    pub fn find_by_path(&self, path: &str, from: Option<&str>) -> Option<&'s Node> {
        let segments: Vec<&str> = path.split('.').collect();
        Scope::new(self.store, from).lookup(&segments)
    }

    /// Dotted name path of `id` inside its namespace: the names of its Group
    /// ancestors up to the nearest container, then its own name. A `$root`
    /// token goes by its group's path.
    pub fn token_path(&self, id: &str) -> Option<String> {
        let node = self.store.get_node(id)?;
        let mut names = vec![node.name()];
        for ancestor in self.store.ancestors(id) {
            match ancestor.meta {
                Meta::Group(_) => names.push(ancestor.name()),
                _ => break,
            }
        }
        if names.len() > 1 && names[0] == ROOT_TOKEN_NAME {
            names.remove(0);
        }
        names.reverse();
        Some(names.join("."))
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn token_node(&self, id: &str) -> Result<&'s Node, ResolveError> {
        let node = self
            .store
            .get_node(id)
            .ok_or_else(|| ResolveError::UnknownNode(id.to_string()))?;
        if !node.is_token() {
            return Err(ResolveError::NotAToken(id.to_string()));
        }
        Ok(node)
    }

    fn display(&self, node: &Node) -> String {
        self.token_path(&node.id).unwrap_or_else(|| node.id.to_string())
    }

    /// Enter `node` on the current chain, or report the cycle it closes.
    fn enter(&self, node: &'s Node, visited: &mut Visited<'s>) -> Result<(), ResolveError> {
        if let Some(start) = visited.get_index_of(node.id.as_str()) {
            let mut chain: Vec<String> = visited
                .iter()
                .skip(start)
                .filter_map(|id| self.store.get_node(id))
                .map(|n| self.display(n))
                .collect();
            chain.push(self.display(node));
            return Err(ResolveError::CircularReference(chain));
        }
        visited.insert(node.id.as_str());
        Ok(())
    }

    /// Own or inherited (ancestor group) type.
    fn declared_or_inherited(&self, node: &Node) -> Option<TokenType> {
        node.meta.declared_type().or_else(|| {
            self.store
                .ancestors(&node.id)
                .filter(|a| a.is_group())
                .find_map(|a| a.meta.declared_type())
        })
    }

    fn effective_type_of(&self, node: &'s Node, visited: &mut Visited<'s>) -> Result<TokenType, ResolveError> {
        if let Some(t) = self.declared_or_inherited(node) {
            return Ok(t);
        }
        let token = node
            .as_token()
            .ok_or_else(|| ResolveError::NotAToken(node.id.to_string()))?;
        match &token.value {
            TokenValue::Alias(alias) => {
                self.enter(node, visited)?;
                let target = self.find_alias_target(alias, node)?;
                let t = self.effective_type_of(target, visited)?;
                visited.pop();
                Ok(t)
            }
            TokenValue::Literal(_) => Err(ResolveError::TypeIndeterminate(self.display(node))),
        }
    }

    fn resolve_node(&self, node: &'s Node, visited: &mut Visited<'s>) -> Result<ResolvedToken, ResolveError> {
        let token = node
            .as_token()
            .ok_or_else(|| ResolveError::NotAToken(node.id.to_string()))?;
        self.enter(node, visited)?;
        let own_type = self.declared_or_inherited(node);
        let resolved = match &token.value {
            TokenValue::Alias(alias) => {
                let target = self.find_alias_target(alias, node)?;
                let inner = self.resolve_node(target, visited)?;
                ResolvedToken {
                    token_type: own_type.unwrap_or(inner.token_type),
                    value: inner.value,
                }
            }
            TokenValue::Literal(lit) => {
                let token_type =
                    own_type.ok_or_else(|| ResolveError::TypeIndeterminate(self.display(node)))?;
                ResolvedToken {
                    token_type,
                    value: self.resolve_fields(lit, node, visited)?,
                }
            }
        };
        visited.pop();
        let found = resolved.value.token_type();
        if found != resolved.token_type {
            return Err(ResolveError::TypeMismatch {
                token: self.display(node),
                expected: resolved.token_type,
                found,
            });
        }
        Ok(resolved)
    }

    /// Resolve one composite field to a literal of `expected` type.
    fn field<T: Clone>(
        &self,
        field: &Field<T>,
        from: &'s Node,
        visited: &mut Visited<'s>,
        expected: TokenType,
        extract: fn(Literal) -> Option<T>,
    ) -> Result<Field<T>, ResolveError> {
        let alias = match field {
            Field::Value(v) => return Ok(Field::Value(v.clone())),
            Field::Alias(alias) => alias,
        };
        let target = self.find_alias_target(alias, from)?;
        let resolved = self.resolve_node(target, visited)?;
        let found = resolved.token_type;
        if found != expected {
            return Err(ResolveError::TypeMismatch {
                token: format!("{}{}", self.display(from), alias_suffix(alias)),
                expected,
                found,
            });
        }
        extract(resolved.value)
            .map(Field::Value)
            .ok_or_else(|| ResolveError::TypeMismatch {
                token: self.display(target),
                expected,
                found,
            })
    }

    fn stroke(&self, style: &Field<StrokeStyle>, from: &'s Node, visited: &mut Visited<'s>) -> Result<Field<StrokeStyle>, ResolveError> {
        match self.field(style, from, visited, TokenType::StrokeStyle, extract::stroke)? {
            Field::Value(style) => Ok(Field::Value(self.stroke_value(&style, from, visited)?)),
            alias => Ok(alias),
        }
    }

    fn stroke_value(&self, style: &StrokeStyle, from: &'s Node, visited: &mut Visited<'s>) -> Result<StrokeStyle, ResolveError> {
        Ok(match style {
            StrokeStyle::Keyword(k) => StrokeStyle::Keyword(*k),
            StrokeStyle::Dashed { dash_array, line_cap } => StrokeStyle::Dashed {
                dash_array: dash_array
                    .iter()
                    .map(|d| self.field(d, from, visited, TokenType::Dimension, extract::dimension))
                    .collect::<Result<Vec<_>, _>>()?,
                line_cap: *line_cap,
            },
        })
    }

    fn resolve_fields(&self, lit: &Literal, from: &'s Node, visited: &mut Visited<'s>) -> Result<Literal, ResolveError> {
        use extract::*;
        Ok(match lit {
            Literal::StrokeStyle(style) => Literal::StrokeStyle(self.stroke_value(style, from, visited)?),
            Literal::Shadow(layers) => Literal::Shadow(layers.try_map(|s| {
                Ok::<_, ResolveError>(Shadow {
                    color: self.field(&s.color, from, visited, TokenType::Color, color)?,
                    offset_x: self.field(&s.offset_x, from, visited, TokenType::Dimension, dimension)?,
                    offset_y: self.field(&s.offset_y, from, visited, TokenType::Dimension, dimension)?,
                    blur: self.field(&s.blur, from, visited, TokenType::Dimension, dimension)?,
                    spread: s
                        .spread
                        .as_ref()
                        .map(|f| self.field(f, from, visited, TokenType::Dimension, dimension))
                        .transpose()?,
                    inset: s.inset,
                })
            })?),
            Literal::Border(b) => Literal::Border(Border {
                color: self.field(&b.color, from, visited, TokenType::Color, color)?,
                width: self.field(&b.width, from, visited, TokenType::Dimension, dimension)?,
                style: self.stroke(&b.style, from, visited)?,
            }),
            Literal::Typography(t) => Literal::Typography(Typography {
                font_family: self.field(&t.font_family, from, visited, TokenType::FontFamily, font_family)?,
                font_size: self.field(&t.font_size, from, visited, TokenType::Dimension, dimension)?,
                font_weight: self.field(&t.font_weight, from, visited, TokenType::FontWeight, font_weight)?,
                line_height: self.field(&t.line_height, from, visited, TokenType::Number, number)?,
                letter_spacing: self.field(&t.letter_spacing, from, visited, TokenType::Dimension, dimension)?,
            }),
            Literal::Transition(t) => Literal::Transition(Transition {
                duration: self.field(&t.duration, from, visited, TokenType::Duration, duration)?,
                delay: self.field(&t.delay, from, visited, TokenType::Duration, duration)?,
                timing_function: self.field(&t.timing_function, from, visited, TokenType::CubicBezier, cubic_bezier)?,
            }),
            Literal::Gradient(stops) => Literal::Gradient(
                stops
                    .iter()
                    .map(|stop| {
                        Ok::<_, ResolveError>(GradientStop {
                            color: self.field(&stop.color, from, visited, TokenType::Color, color)?,
                            position: self.field(&stop.position, from, visited, TokenType::Number, number)?,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            other => other.clone(),
        })
    }
}

fn alias_suffix(alias: &AliasRef) -> String {
    format!(" (field {alias})")
}

/// Unwrap a resolved literal into the inner shape a composite field holds.
mod extract {
    use super::*;

    pub(super) fn color(lit: Literal) -> Option<Color> {
        match lit {
            Literal::Color(c) => Some(c),
            _ => None,
        }
    }

    pub(super) fn dimension(lit: Literal) -> Option<Dimension> {
        match lit {
            Literal::Dimension(d) => Some(d),
            _ => None,
        }
    }

    pub(super) fn duration(lit: Literal) -> Option<Duration> {
        match lit {
            Literal::Duration(d) => Some(d),
            _ => None,
        }
    }

    pub(super) fn number(lit: Literal) -> Option<Number> {
        match lit {
            Literal::Number(n) => Some(n),
            _ => None,
        }
    }

    pub(super) fn font_weight(lit: Literal) -> Option<Number> {
        match lit {
            Literal::FontWeight(n) => Some(n),
            _ => None,
        }
    }

    pub(super) fn font_family(lit: Literal) -> Option<FontFamily> {
        match lit {
            Literal::FontFamily(f) => Some(f),
            _ => None,
        }
    }

    pub(super) fn cubic_bezier(lit: Literal) -> Option<[Number; 4]> {
        match lit {
            Literal::CubicBezier(c) => Some(c),
            _ => None,
        }
    }

    pub(super) fn stroke(lit: Literal) -> Option<StrokeStyle> {
        match lit {
            Literal::StrokeStyle(s) => Some(s),
            _ => None,
        }
    }
}
