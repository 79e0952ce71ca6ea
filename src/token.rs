use std::fmt;

/// Source location for error reporting.
///
/// Line and column are zero-based internally; `Display` renders them
/// one-based, which is how every diagnostic shows them to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line + 1, self.column + 1)
    }
}

/// Reserved words of the fragment-linking language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Effect,
    Fragment,
    Technique,
    Pass,
    Param,
    Profile,
    Require,
    Vertex,
    Pixel,
}

impl Keyword {
    /// Map an identifier lexeme to its keyword, if it is one.
    #[must_use]
    pub fn from_ident(text: &str) -> Option<Self> {
        match text {
            "effect" => Some(Self::Effect),
            "fragment" => Some(Self::Fragment),
            "technique" => Some(Self::Technique),
            "pass" => Some(Self::Pass),
            "param" => Some(Self::Param),
            "profile" => Some(Self::Profile),
            "require" => Some(Self::Require),
            "vertex" => Some(Self::Vertex),
            "pixel" => Some(Self::Pixel),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Effect => "effect",
            Self::Fragment => "fragment",
            Self::Technique => "technique",
            Self::Pass => "pass",
            Self::Param => "param",
            Self::Profile => "profile",
            Self::Require => "require",
            Self::Vertex => "vertex",
            Self::Pixel => "pixel",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Name that is not a reserved word.
    Identifier,
    /// Reserved word.
    Keyword(Keyword),
    /// Numeric literal; the raw lexeme is kept in `Token::text`.
    Number,
    /// Double-quoted string (fragment reference path).
    Str,
    /// Raw shading-language block (`__hlsl__ ... __hlsl__`).
    CodeBlock,
    /// `{`
    OpenBrace,
    /// `}`
    CloseBrace,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `=`
    Equals,
    /// Terminal token; the parser tests for this instead of asking
    /// "are there more tokens".
    EndOfInput,
}

/// A single token with its kind, text, and source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}
