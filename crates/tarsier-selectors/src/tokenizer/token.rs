//! Selector token types per [§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization).
//!
//! The selector language is CSS-shaped, so its lexer follows the CSS Syntax
//! Module Level 3 token vocabulary. Tokens are immutable once produced and
//! owned by the lexer's output list.

use core::fmt;

/// [§ 4.2 Definitions](https://www.w3.org/TR/css-syntax-3/#token-diagrams)
///
/// "A `<hash-token>` with the type flag set to 'id'... or 'unrestricted'."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashType {
    /// "id" - the hash token's value is a valid identifier
    Id,
    /// "unrestricted" - the hash token's value is not a valid identifier
    Unrestricted,
}

/// Tokens of the selector language, following the CSS Syntax Module Level 3
/// railroad diagrams. Numeric tokens keep both the numeric value and the
/// source representation so selectors can be re-serialized losslessly.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// "`<whitespace-token>` represents one or more whitespace code points"
    Whitespace,

    /// "`<ident-token>` has a value composed of one or more code points"
    Ident(String),

    /// "`<function-token>`" - an identifier followed by `(`
    Function(String),

    /// "`<at-keyword-token>`" - `@` followed by an identifier. Never valid
    /// in a selector; the parser rejects it at top level.
    AtKeyword(String),

    /// "`<hash-token>`" - `#` followed by one or more code points
    Hash {
        /// "a value composed of one or more code points"
        value: String,
        /// "a type flag set to either 'id' or 'unrestricted'"
        hash_type: HashType,
    },

    /// "`<string-token>` has a value composed of zero or more code points"
    String(String),

    /// "`<bad-string-token>` represents a parsing error" - error-tolerant
    /// recovery token, the lexer never fails outright.
    BadString,

    /// "`<url-token>` has a value composed of zero or more code points"
    Url(String),

    /// "`<bad-url-token>` represents a parsing error"
    BadUrl,

    /// "`<delim-token>` has a value composed of a single code point"
    Delim(char),

    /// "`<number-token>` has a numeric value, and a type flag"
    Number {
        /// "a numeric value"
        value: f64,
        /// The integer value when the type flag is 'integer'.
        int_value: Option<i64>,
        /// Source representation, kept for lossless re-serialization.
        repr: String,
    },

    /// "`<percentage-token>` has a numeric value"
    Percentage {
        /// "a numeric value"
        value: f64,
        /// Source representation without the `%`.
        repr: String,
    },

    /// "`<dimension-token>` has a numeric value, a type flag, and a unit"
    Dimension {
        /// "a numeric value"
        value: f64,
        /// Source representation of the numeric part.
        repr: String,
        /// "a unit"
        unit: String,
    },

    /// "`<colon-token>` represents U+003A COLON (:)"
    Colon,

    /// "`<semicolon-token>` represents U+003B SEMICOLON (;)"
    Semicolon,

    /// "`<comma-token>` represents U+002C COMMA (,)"
    Comma,

    /// `<[-token>`
    LeftBracket,

    /// `<]-token>`
    RightBracket,

    /// `<(-token>`
    LeftParen,

    /// `<)-token>`
    RightParen,

    /// `<{-token>` - never valid in a selector
    LeftBrace,

    /// `<}-token>` - never valid in a selector
    RightBrace,

    /// End of input.
    Eof,
}

impl Token {
    /// Returns true if this is the EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    /// Returns true if this is a whitespace token.
    #[must_use]
    pub const fn is_whitespace(&self) -> bool {
        matches!(self, Self::Whitespace)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Whitespace => write!(f, " "),
            Self::Ident(v) => write!(f, "{v}"),
            Self::Function(v) => write!(f, "{v}("),
            Self::AtKeyword(v) => write!(f, "@{v}"),
            Self::Hash { value, .. } => write!(f, "#{value}"),
            Self::String(v) => write!(f, "\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")),
            Self::BadString => write!(f, "\"\""),
            Self::Url(v) => write!(f, "url({v})"),
            Self::BadUrl => write!(f, "url()"),
            Self::Delim(c) => write!(f, "{c}"),
            Self::Number { repr, .. } => write!(f, "{repr}"),
            Self::Percentage { repr, .. } => write!(f, "{repr}%"),
            Self::Dimension { repr, unit, .. } => write!(f, "{repr}{unit}"),
            Self::Colon => write!(f, ":"),
            Self::Semicolon => write!(f, ";"),
            Self::Comma => write!(f, ","),
            Self::LeftBracket => write!(f, "["),
            Self::RightBracket => write!(f, "]"),
            Self::LeftParen => write!(f, "("),
            Self::RightParen => write!(f, ")"),
            Self::LeftBrace => write!(f, "{{"),
            Self::RightBrace => write!(f, "}}"),
            Self::Eof => Ok(()),
        }
    }
}
