use std::fmt;

use crate::token::{Keyword, Span, Token, TokenKind};

/// Marker delimiting a raw shading-language block.
const CODE_MARKER: &[u8] = b"__hlsl__";

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Unterminated double-quoted string.
    UnterminatedString,
    /// `__hlsl__` block whose closing marker never appears.
    UnterminatedCodeBlock,
    /// String literal broken by a line break.
    StringSpansLines,
    /// Byte that cannot start any token.
    UnexpectedCharacter(char),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString => {
                write!(f, "unterminated string")
            }
            Self::UnterminatedCodeBlock => {
                write!(
                    f,
                    "unterminated code block, \
                     expected closing __hlsl__ marker"
                )
            }
            Self::StringSpansLines => {
                write!(f, "string literal may not span lines")
            }
            Self::UnexpectedCharacter(ch) => {
                write!(f, "unexpected character: {ch}")
            }
        }
    }
}

/// Error produced during lexing. Fail-fast: no tokens are valid past
/// the reported span.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {span}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

/// Tokenize a fragment-linking source string.
///
/// On success the returned sequence always ends with a single
/// `EndOfInput` token.
///
/// # Errors
///
/// Returns `LexError` on the first unterminated string, unterminated
/// code block, or unrecognized character.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(input).tokenize()
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        let bytes = input.as_bytes();
        let start = if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
            3
        } else {
            0
        };
        Self {
            input: bytes,
            pos: start,
            line: 0,
            col: 0,
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while self.pos < self.input.len() {
            let ch = self.input[self.pos];

            match ch {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.advance();
                }
                b'/' if self.peek_at(1) == Some(b'/') => {
                    self.skip_line_comment();
                }
                b'/' if self.peek_at(1) == Some(b'*') => {
                    self.skip_block_comment();
                }
                b'{' => tokens.push(self.punct(TokenKind::OpenBrace, "{")),
                b'}' => tokens.push(self.punct(TokenKind::CloseBrace, "}")),
                b'(' => tokens.push(self.punct(TokenKind::OpenParen, "(")),
                b')' => tokens.push(self.punct(TokenKind::CloseParen, ")")),
                b';' => tokens.push(self.punct(TokenKind::Semicolon, ";")),
                b':' => tokens.push(self.punct(TokenKind::Colon, ":")),
                b',' => tokens.push(self.punct(TokenKind::Comma, ",")),
                b'=' => tokens.push(self.punct(TokenKind::Equals, "=")),
                b'"' => tokens.push(self.read_string()?),
                b'0'..=b'9' => tokens.push(self.read_number()),
                b'-' if matches!(self.peek_at(1), Some(b'0'..=b'9')) => {
                    tokens.push(self.read_number());
                }
                b'A'..=b'Z' | b'a'..=b'z' | b'_' => {
                    tokens.push(self.read_ident_or_code_block()?);
                }
                other => {
                    return Err(LexError {
                        kind: LexErrorKind::UnexpectedCharacter(char::from(other)),
                        span: self.span(),
                    });
                }
            }
        }

        tokens.push(Token {
            kind: TokenKind::EndOfInput,
            text: String::new(),
            span: self.span(),
        });

        Ok(tokens)
    }

    const fn span(&self) -> Span {
        Span {
            line: self.line,
            column: self.col,
        }
    }

    fn punct(&mut self, kind: TokenKind, text: &str) -> Token {
        let token = Token {
            kind,
            text: text.to_string(),
            span: self.span(),
        };
        self.advance();
        token
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            if self.input[self.pos] == b'\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
            self.pos += 1;
        }
    }

    fn skip_line_comment(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos] != b'\n' {
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance(); // /
        self.advance(); // *
        while self.pos < self.input.len() {
            if self.input[self.pos] == b'*' && self.peek_at(1) == Some(b'/') {
                self.advance();
                self.advance();
                return;
            }
            self.advance();
        }
        // An unterminated block comment just consumes to end of input;
        // the parser reports the resulting structure error.
    }

    fn read_string(&mut self) -> Result<Token, LexError> {
        let start = self.span();
        self.advance(); // opening quote
        let begin = self.pos;

        loop {
            match self.peek() {
                None => {
                    return Err(LexError {
                        kind: LexErrorKind::UnterminatedString,
                        span: start,
                    });
                }
                Some(b'\n') => {
                    return Err(LexError {
                        kind: LexErrorKind::StringSpansLines,
                        span: start,
                    });
                }
                Some(b'"') => break,
                Some(_) => self.advance(),
            }
        }

        let value = String::from_utf8_lossy(&self.input[begin..self.pos]).into_owned();
        self.advance(); // closing quote

        Ok(Token {
            kind: TokenKind::Str,
            text: value,
            span: start,
        })
    }

    fn read_number(&mut self) -> Token {
        let start = self.span();
        let begin = self.pos;

        if self.peek() == Some(b'-') {
            self.advance();
        }
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.advance();
        }
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
            self.advance();
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.advance();
            }
        }

        Token {
            kind: TokenKind::Number,
            text: String::from_utf8_lossy(&self.input[begin..self.pos]).into_owned(),
            span: start,
        }
    }

    fn read_ident_or_code_block(&mut self) -> Result<Token, LexError> {
        let start = self.span();
        let begin = self.pos;

        while matches!(
            self.peek(),
            Some(b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_')
        ) {
            self.advance();
        }

        let text = String::from_utf8_lossy(&self.input[begin..self.pos]).into_owned();

        if text.as_bytes() == CODE_MARKER {
            return self.read_code_block(start);
        }

        let kind = Keyword::from_ident(&text).map_or(TokenKind::Identifier, TokenKind::Keyword);

        Ok(Token { kind, text, span: start })
    }

    /// Reads raw text up to the closing `__hlsl__` marker. The opening
    /// marker has already been consumed.
    fn read_code_block(&mut self, start: Span) -> Result<Token, LexError> {
        let begin = self.pos;

        loop {
            if self.pos >= self.input.len() {
                return Err(LexError {
                    kind: LexErrorKind::UnterminatedCodeBlock,
                    span: start,
                });
            }
            if self.input[self.pos..].starts_with(CODE_MARKER) {
                break;
            }
            self.advance();
        }

        let raw = String::from_utf8_lossy(&self.input[begin..self.pos]).into_owned();
        for _ in 0..CODE_MARKER.len() {
            self.advance();
        }

        // One newline straight after the opening marker and one before
        // the closing marker belong to the markers, not the code.
        let content = raw
            .strip_prefix("\r\n")
            .or_else(|| raw.strip_prefix('\n'))
            .unwrap_or(&raw);
        let content = content
            .strip_suffix('\n')
            .map_or(content, |c| c.strip_suffix('\r').unwrap_or(c));

        Ok(Token {
            kind: TokenKind::CodeBlock,
            text: content.to_string(),
            span: start,
        })
    }
}
