//! Token values: literals, aliases and composite fields.
//!
//! Numbers are kept as [`serde_json::Number`] so that `1` and `1.0` are
//! written back exactly as they were read.

use std::fmt;

use serde_json::Number;
use token_graph_util::OneOrMany;

use super::{NodeId, TokenType};

// ── Aliases ───────────────────────────────────────────────────────────────

/// Reference from a token value to another token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AliasRef {
    /// Dotted name path without braces: `colors.primary`.
    Path(String),
    /// Direct node id reference.
    Id(NodeId),
}

impl AliasRef {
    /// Parse the `{a.b.c}` string form.
    ///
    /// ```
    /// use token_graph::AliasRef;
    ///
    /// assert_eq!(AliasRef::parse("{colors.primary}"), Some(AliasRef::Path("colors.primary".into())));
    /// assert_eq!(AliasRef::parse("colors.primary"), None);
    /// assert_eq!(AliasRef::parse("{}"), None);
    /// assert_eq!(AliasRef::parse("{a}{b}"), None);
    /// ```
    pub fn parse(text: &str) -> Option<AliasRef> {
        let inner = text.strip_prefix('{')?.strip_suffix('}')?;
        if inner.is_empty() || inner.contains(['{', '}']) {
            return None;
        }
        Some(AliasRef::Path(inner.to_string()))
    }

    /// Dotted path segments, for the path form.
    pub fn segments(&self) -> Option<Vec<&str>> {
        match self {
            AliasRef::Path(path) => Some(path.split('.').collect()),
            AliasRef::Id(_) => None,
        }
    }
}

impl fmt::Display for AliasRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliasRef::Path(path) => write!(f, "{{{path}}}"),
            AliasRef::Id(id) => write!(f, "{{#{id}}}"),
        }
    }
}

/// A composite field: either a literal of type `T` or an alias.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Alias(AliasRef),
    Value(T),
}

impl<T> Field<T> {
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            Field::Alias(_) => None,
        }
    }

    pub fn as_alias(&self) -> Option<&AliasRef> {
        match self {
            Field::Alias(a) => Some(a),
            Field::Value(_) => None,
        }
    }
}

// ── Keywords ──────────────────────────────────────────────────────────────

macro_rules! keyword_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

keyword_enum!(
    /// Color spaces accepted in `colorSpace`.
    ColorSpace {
        Srgb => "srgb",
        SrgbLinear => "srgb-linear",
        Hsl => "hsl",
        Hwb => "hwb",
        Lab => "lab",
        Lch => "lch",
        Oklab => "oklab",
        Oklch => "oklch",
        DisplayP3 => "display-p3",
        A98Rgb => "a98-rgb",
        ProphotoRgb => "prophoto-rgb",
        Rec2020 => "rec2020",
        XyzD65 => "xyz-d65",
        XyzD50 => "xyz-d50",
    }
);

keyword_enum!(DimensionUnit { Px => "px", Rem => "rem" });

keyword_enum!(DurationUnit { Ms => "ms", S => "s" });

keyword_enum!(
    /// Predefined stroke styles.
    StrokeKeyword {
        Solid => "solid",
        Dashed => "dashed",
        Dotted => "dotted",
        Double => "double",
        Groove => "groove",
        Ridge => "ridge",
        Outset => "outset",
        Inset => "inset",
    }
);

keyword_enum!(LineCap { Round => "round", Butt => "butt", Square => "square" });

// ── Literal shapes ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Color {
    pub color_space: ColorSpace,
    pub components: Vec<Number>,
    pub alpha: Option<Number>,
    pub hex: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub value: Number,
    pub unit: DimensionUnit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Duration {
    pub value: Number,
    pub unit: DurationUnit,
}

/// A single family name or a fallback list.
pub type FontFamily = OneOrMany<String>;

#[derive(Debug, Clone, PartialEq)]
pub enum StrokeStyle {
    Keyword(StrokeKeyword),
    Dashed {
        dash_array: Vec<Field<Dimension>>,
        line_cap: LineCap,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shadow {
    pub color: Field<Color>,
    pub offset_x: Field<Dimension>,
    pub offset_y: Field<Dimension>,
    pub blur: Field<Dimension>,
    pub spread: Option<Field<Dimension>>,
    pub inset: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Border {
    pub color: Field<Color>,
    pub width: Field<Dimension>,
    pub style: Field<StrokeStyle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Typography {
    pub font_family: Field<FontFamily>,
    pub font_size: Field<Dimension>,
    pub font_weight: Field<Number>,
    pub line_height: Field<Number>,
    pub letter_spacing: Field<Dimension>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub duration: Field<Duration>,
    pub delay: Field<Duration>,
    pub timing_function: Field<[Number; 4]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradientStop {
    pub color: Field<Color>,
    pub position: Field<Number>,
}

/// A literal value; one variant per [`TokenType`].
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Color(Color),
    Dimension(Dimension),
    Duration(Duration),
    Number(Number),
    FontFamily(FontFamily),
    FontWeight(Number),
    CubicBezier([Number; 4]),
    Transition(Transition),
    StrokeStyle(StrokeStyle),
    Shadow(OneOrMany<Shadow>),
    Border(Border),
    Typography(Typography),
    Gradient(Vec<GradientStop>),
}

impl Literal {
    pub fn token_type(&self) -> TokenType {
        match self {
            Literal::Color(_) => TokenType::Color,
            Literal::Dimension(_) => TokenType::Dimension,
            Literal::Duration(_) => TokenType::Duration,
            Literal::Number(_) => TokenType::Number,
            Literal::FontFamily(_) => TokenType::FontFamily,
            Literal::FontWeight(_) => TokenType::FontWeight,
            Literal::CubicBezier(_) => TokenType::CubicBezier,
            Literal::Transition(_) => TokenType::Transition,
            Literal::StrokeStyle(_) => TokenType::StrokeStyle,
            Literal::Shadow(_) => TokenType::Shadow,
            Literal::Border(_) => TokenType::Border,
            Literal::Typography(_) => TokenType::Typography,
            Literal::Gradient(_) => TokenType::Gradient,
        }
    }

    /// Every alias held by a composite field, in field order.
    pub fn field_aliases(&self) -> Vec<&AliasRef> {
        let mut out = Vec::new();
        fn push<'a, T>(out: &mut Vec<&'a AliasRef>, field: &'a Field<T>) {
            if let Field::Alias(a) = field {
                out.push(a);
            }
        }
        match self {
            Literal::StrokeStyle(StrokeStyle::Dashed { dash_array, .. }) => {
                dash_array.iter().for_each(|f| push(&mut out, f));
            }
            Literal::Shadow(layers) => {
                for s in layers {
                    push(&mut out, &s.color);
                    push(&mut out, &s.offset_x);
                    push(&mut out, &s.offset_y);
                    push(&mut out, &s.blur);
                    if let Some(spread) = &s.spread {
                        push(&mut out, spread);
                    }
                }
            }
            Literal::Border(b) => {
                push(&mut out, &b.color);
                push(&mut out, &b.width);
                push(&mut out, &b.style);
                if let Field::Value(StrokeStyle::Dashed { dash_array, .. }) = &b.style {
                    dash_array.iter().for_each(|f| push(&mut out, f));
                }
            }
            Literal::Typography(t) => {
                push(&mut out, &t.font_family);
                push(&mut out, &t.font_size);
                push(&mut out, &t.font_weight);
                push(&mut out, &t.line_height);
                push(&mut out, &t.letter_spacing);
            }
            Literal::Transition(t) => {
                push(&mut out, &t.duration);
                push(&mut out, &t.delay);
                push(&mut out, &t.timing_function);
            }
            Literal::Gradient(stops) => {
                for stop in stops {
                    push(&mut out, &stop.color);
                    push(&mut out, &stop.position);
                }
            }
            _ => {}
        }
        out
    }
}

/// The stored value of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Alias(AliasRef),
    Literal(Literal),
}

impl TokenValue {
    /// All outgoing alias edges: the whole-value alias or every field alias.
    pub fn aliases(&self) -> Vec<&AliasRef> {
        match self {
            TokenValue::Alias(a) => vec![a],
            TokenValue::Literal(lit) => lit.field_aliases(),
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            TokenValue::Literal(lit) => Some(lit),
            TokenValue::Alias(_) => None,
        }
    }
}

impl From<Literal> for TokenValue {
    fn from(lit: Literal) -> Self {
        TokenValue::Literal(lit)
    }
}

impl From<AliasRef> for TokenValue {
    fn from(alias: AliasRef) -> Self {
        TokenValue::Alias(alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(n: u64) -> Field<Dimension> {
        Field::Value(Dimension { value: n.into(), unit: DimensionUnit::Px })
    }

    #[test]
    fn alias_display_uses_braces() {
        assert_eq!(AliasRef::Path("a.b".into()).to_string(), "{a.b}");
        assert_eq!(AliasRef::Id(NodeId::from("n1")).to_string(), "{#n1}");
    }

    #[test]
    fn alias_segments_keep_numeric_names() {
        let alias = AliasRef::parse("{space.100}").unwrap();
        assert_eq!(alias.segments(), Some(vec!["space", "100"]));
    }

    #[test]
    fn field_aliases_collects_mixed_composite() {
        let shadow = Shadow {
            color: Field::Alias(AliasRef::Path("colors.black".into())),
            offset_x: px(0),
            offset_y: px(2),
            blur: Field::Alias(AliasRef::Path("blur.md".into())),
            spread: None,
            inset: None,
        };
        let lit = Literal::Shadow(OneOrMany::One(shadow));
        let paths: Vec<String> = lit.field_aliases().iter().map(|a| a.to_string()).collect();
        assert_eq!(paths, vec!["{colors.black}", "{blur.md}"]);
    }

    #[test]
    fn keyword_parse_rejects_unknown() {
        assert_eq!(DimensionUnit::parse("rem"), Some(DimensionUnit::Rem));
        assert_eq!(DimensionUnit::parse("em"), None);
        assert_eq!(ColorSpace::parse("display-p3"), Some(ColorSpace::DisplayP3));
        assert_eq!(StrokeKeyword::ALL.len(), 8);
    }
}
