//! The closed set of token types.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Token type as written in `$type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Color,
    Dimension,
    Duration,
    Number,
    FontFamily,
    FontWeight,
    CubicBezier,
    Transition,
    StrokeStyle,
    Shadow,
    Border,
    Typography,
    Gradient,
}

impl TokenType {
    pub const ALL: [TokenType; 13] = [
        TokenType::Color,
        TokenType::Dimension,
        TokenType::Duration,
        TokenType::Number,
        TokenType::FontFamily,
        TokenType::FontWeight,
        TokenType::CubicBezier,
        TokenType::Transition,
        TokenType::StrokeStyle,
        TokenType::Shadow,
        TokenType::Border,
        TokenType::Typography,
        TokenType::Gradient,
    ];

    /// Wire name, e.g. `"fontFamily"`.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenType::Color => "color",
            TokenType::Dimension => "dimension",
            TokenType::Duration => "duration",
            TokenType::Number => "number",
            TokenType::FontFamily => "fontFamily",
            TokenType::FontWeight => "fontWeight",
            TokenType::CubicBezier => "cubicBezier",
            TokenType::Transition => "transition",
            TokenType::StrokeStyle => "strokeStyle",
            TokenType::Shadow => "shadow",
            TokenType::Border => "border",
            TokenType::Typography => "typography",
            TokenType::Gradient => "gradient",
        }
    }

    /// Composite types are structured objects whose fields may alias other tokens.
    pub fn is_composite(self) -> bool {
        matches!(
            self,
            TokenType::Shadow
                | TokenType::Border
                | TokenType::Gradient
                | TokenType::Transition
                | TokenType::Typography
        )
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown token type \"{0}\"")]
pub struct UnknownTokenType(pub String);

impl FromStr for TokenType {
    type Err = UnknownTokenType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTokenType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for t in TokenType::ALL {
            assert_eq!(t.as_str().parse::<TokenType>(), Ok(t));
        }
    }

    #[test]
    fn names_are_case_sensitive() {
        assert!("fontfamily".parse::<TokenType>().is_err());
        assert!("Color".parse::<TokenType>().is_err());
    }
}
