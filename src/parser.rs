use std::fmt;

use crate::ast::{
    Binding, EffectFile, FragmentFile, FragmentRef, Param, ParamType, ParamValue, Pass, Stage,
    Technique,
};
use crate::profile::ShaderProfile;
use crate::token::{Keyword, Span, Token, TokenKind};

/// Classifies a parser error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Grammar expected one thing and found another.
    Expected {
        expected: &'static str,
        found: String,
    },
    /// Technique name already declared in this effect.
    DuplicateTechnique { name: String },
    /// Pass name already declared in this technique.
    DuplicatePass { name: String },
    /// Parameter name already declared in this file.
    DuplicateParam { name: String },
    /// Stage code block already declared in this fragment.
    DuplicateStageBlock { stage: Stage },
    /// Pass declares no fragment reference for a stage.
    MissingStage { pass: String, stage: Stage },
    /// Parameter type lexeme is not a recognized semantic type.
    UnknownParamType { found: String },
    /// Profile lexeme is not a recognized shader profile.
    UnknownProfile { found: String },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::DuplicateTechnique { name } => {
                write!(f, "duplicate technique `{name}`")
            }
            Self::DuplicatePass { name } => {
                write!(f, "duplicate pass `{name}`")
            }
            Self::DuplicateParam { name } => {
                write!(f, "duplicate parameter `{name}`")
            }
            Self::DuplicateStageBlock { stage } => {
                write!(f, "duplicate {stage} code block")
            }
            Self::MissingStage { pass, stage } => {
                write!(f, "pass `{pass}` has no {stage} fragment reference")
            }
            Self::UnknownParamType { found } => {
                write!(f, "unknown parameter type: {found}")
            }
            Self::UnknownProfile { found } => {
                write!(f, "unknown shader profile: {found}")
            }
        }
    }
}

/// Error produced during parsing. Fail-fast: parsing aborts at the
/// first token that does not fit the grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {span}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

/// Parse a token stream into an `EffectFile`.
///
/// # Errors
///
/// Returns `ParseError` on the first syntax error, duplicate
/// technique/pass/parameter name, or pass with a missing stage.
pub fn parse_effect(tokens: &[Token]) -> Result<EffectFile, ParseError> {
    ensure_nonempty(tokens, "`effect`")?;
    Parser::new(tokens).effect_file()
}

/// Parse a token stream into a `FragmentFile`.
///
/// # Errors
///
/// Returns `ParseError` on the first syntax error, duplicate parameter
/// name, duplicate stage block, or unknown profile name.
pub fn parse_fragment(tokens: &[Token]) -> Result<FragmentFile, ParseError> {
    ensure_nonempty(tokens, "`fragment`")?;
    Parser::new(tokens).fragment_file()
}

/// The lexer always ends a stream with `EndOfInput`, but these entry
/// points accept any token slice; an empty one is a syntax error, not
/// a panic.
fn ensure_nonempty(tokens: &[Token], expected: &'static str) -> Result<(), ParseError> {
    if tokens.is_empty() {
        return Err(ParseError {
            kind: ParseErrorKind::Expected {
                expected,
                found: "end of input".to_string(),
            },
            span: Span { line: 0, column: 0 },
        });
    }
    Ok(())
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    const fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn effect_file(mut self) -> Result<EffectFile, ParseError> {
        self.expect_keyword(Keyword::Effect, "`effect`")?;
        let name = self.expect_ident("effect name")?;
        self.expect_kind(TokenKind::Semicolon, "`;`")?;

        let params = self.param_decls()?;

        let mut techniques: Vec<Technique> = Vec::new();
        while self.at_keyword(Keyword::Technique) {
            let technique = self.technique_decl()?;
            if techniques.iter().any(|t| t.name == technique.name) {
                return Err(self.error_before(ParseErrorKind::DuplicateTechnique {
                    name: technique.name,
                }));
            }
            techniques.push(technique);
        }

        self.expect_kind(TokenKind::EndOfInput, "`technique` or end of file")?;

        Ok(EffectFile {
            name,
            params,
            techniques,
        })
    }

    fn fragment_file(mut self) -> Result<FragmentFile, ParseError> {
        self.expect_keyword(Keyword::Fragment, "`fragment`")?;
        let name = self.expect_ident("fragment name")?;
        self.expect_kind(TokenKind::Semicolon, "`;`")?;

        let mut profile = ShaderProfile::MINIMUM;
        if self.at_keyword(Keyword::Profile) {
            self.pos += 1;
            let token = self.expect_token(TokenKind::Identifier, "profile name")?;
            profile = token.text.parse().map_err(|_| ParseError {
                kind: ParseErrorKind::UnknownProfile {
                    found: token.text.clone(),
                },
                span: token.span,
            })?;
            self.expect_kind(TokenKind::Semicolon, "`;`")?;
        }

        let mut requires = Vec::new();
        while self.at_keyword(Keyword::Require) {
            self.pos += 1;
            let path = self.expect_token(TokenKind::Str, "fragment path string")?;
            requires.push(path.text.clone());
            self.expect_kind(TokenKind::Semicolon, "`;`")?;
        }

        let params = self.param_decls()?;

        let mut vertex: Option<String> = None;
        let mut pixel: Option<String> = None;
        loop {
            let stage = match self.peek().kind {
                TokenKind::Keyword(Keyword::Vertex) => Stage::Vertex,
                TokenKind::Keyword(Keyword::Pixel) => Stage::Pixel,
                _ => break,
            };
            self.pos += 1;
            let code = self.expect_token(TokenKind::CodeBlock, "code block")?;
            let slot = match stage {
                Stage::Vertex => &mut vertex,
                Stage::Pixel => &mut pixel,
            };
            if slot.is_some() {
                return Err(ParseError {
                    kind: ParseErrorKind::DuplicateStageBlock { stage },
                    span: code.span,
                });
            }
            *slot = Some(code.text.clone());
        }

        self.expect_kind(TokenKind::EndOfInput, "stage block or end of file")?;

        Ok(FragmentFile {
            name,
            profile,
            requires,
            params,
            vertex,
            pixel,
        })
    }

    fn param_decls(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params: Vec<Param> = Vec::new();
        while self.at_keyword(Keyword::Param) {
            let param = self.param_decl()?;
            if params.iter().any(|p| p.name == param.name) {
                return Err(
                    self.error_before(ParseErrorKind::DuplicateParam { name: param.name })
                );
            }
            params.push(param);
        }
        Ok(params)
    }

    fn param_decl(&mut self) -> Result<Param, ParseError> {
        self.pos += 1; // `param`
        let ty_token = self.expect_token(TokenKind::Identifier, "parameter type")?;
        let ty = ParamType::from_ident(&ty_token.text).ok_or_else(|| ParseError {
            kind: ParseErrorKind::UnknownParamType {
                found: ty_token.text.clone(),
            },
            span: ty_token.span,
        })?;

        let name = self.expect_ident("parameter name")?;

        let semantic = if self.peek().kind == TokenKind::Colon {
            self.pos += 1;
            Some(self.expect_ident("semantic name")?)
        } else {
            None
        };

        let default = if self.peek().kind == TokenKind::Equals {
            self.pos += 1;
            Some(self.param_value()?)
        } else {
            None
        };

        self.expect_kind(TokenKind::Semicolon, "`;`")?;

        Ok(Param {
            name,
            ty,
            semantic,
            default,
        })
    }

    fn param_value(&mut self) -> Result<ParamValue, ParseError> {
        if self.peek().kind == TokenKind::OpenParen {
            self.pos += 1;
            let mut components = vec![self.expect_token(TokenKind::Number, "number")?.text.clone()];
            while self.peek().kind == TokenKind::Comma {
                self.pos += 1;
                components.push(self.expect_token(TokenKind::Number, "number")?.text.clone());
            }
            self.expect_kind(TokenKind::CloseParen, "`)`")?;
            Ok(ParamValue::Vector(components))
        } else {
            let number = self.expect_token(TokenKind::Number, "number or `(`")?;
            Ok(ParamValue::Scalar(number.text.clone()))
        }
    }

    fn technique_decl(&mut self) -> Result<Technique, ParseError> {
        self.pos += 1; // `technique`
        let name = self.expect_ident("technique name")?;
        self.expect_kind(TokenKind::OpenBrace, "`{`")?;

        let mut passes: Vec<Pass> = Vec::new();
        while self.at_keyword(Keyword::Pass) {
            let pass = self.pass_decl()?;
            if passes.iter().any(|p| p.name == pass.name) {
                return Err(self.error_before(ParseErrorKind::DuplicatePass { name: pass.name }));
            }
            passes.push(pass);
        }

        if passes.is_empty() {
            return Err(self.error_here("pass declaration"));
        }

        self.expect_kind(TokenKind::CloseBrace, "`}`")?;

        Ok(Technique { name, passes })
    }

    fn pass_decl(&mut self) -> Result<Pass, ParseError> {
        self.pos += 1; // `pass`
        let name = self.expect_ident("pass name")?;
        let name_span = self.tokens[self.pos - 1].span;
        self.expect_kind(TokenKind::OpenBrace, "`{`")?;

        let mut vertex = Vec::new();
        let mut pixel = Vec::new();
        loop {
            let stage = match self.peek().kind {
                TokenKind::Keyword(Keyword::Vertex) => Stage::Vertex,
                TokenKind::Keyword(Keyword::Pixel) => Stage::Pixel,
                _ => break,
            };
            self.pos += 1;
            let reference = self.fragment_ref()?;
            match stage {
                Stage::Vertex => vertex.push(reference),
                Stage::Pixel => pixel.push(reference),
            }
        }

        self.expect_kind(TokenKind::CloseBrace, "`}` or stage reference")?;

        for (stage, refs) in [(Stage::Vertex, &vertex), (Stage::Pixel, &pixel)] {
            if refs.is_empty() {
                return Err(ParseError {
                    kind: ParseErrorKind::MissingStage {
                        pass: name.clone(),
                        stage,
                    },
                    span: name_span,
                });
            }
        }

        Ok(Pass {
            name,
            vertex,
            pixel,
        })
    }

    fn fragment_ref(&mut self) -> Result<FragmentRef, ParseError> {
        let path_token = self.expect_token(TokenKind::Str, "fragment path string")?;
        let path = path_token.text.clone();
        let span = path_token.span;

        let mut bindings = Vec::new();
        if self.peek().kind == TokenKind::OpenParen {
            self.pos += 1;
            loop {
                let fragment_param = self.expect_ident("fragment parameter name")?;
                self.expect_kind(TokenKind::Equals, "`=`")?;
                let effect_param = self.expect_ident("effect parameter name")?;
                bindings.push(Binding {
                    fragment_param,
                    effect_param,
                });
                if self.peek().kind == TokenKind::Comma {
                    self.pos += 1;
                } else {
                    break;
                }
            }
            self.expect_kind(TokenKind::CloseParen, "`)`")?;
        }

        self.expect_kind(TokenKind::Semicolon, "`;`")?;

        Ok(FragmentRef {
            path,
            bindings,
            span,
        })
    }

    // -- token stream helpers --

    fn peek(&self) -> &Token {
        // The lexer guarantees a terminal EndOfInput token, so the
        // stream is never empty and the position never runs past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at_keyword(&self, keyword: Keyword) -> bool {
        self.peek().kind == TokenKind::Keyword(keyword)
    }

    fn expect_kind(&mut self, kind: TokenKind, expected: &'static str) -> Result<(), ParseError> {
        if self.peek().kind == kind {
            if kind != TokenKind::EndOfInput {
                self.pos += 1;
            }
            Ok(())
        } else {
            Err(self.error_here(expected))
        }
    }

    fn expect_token(
        &mut self,
        kind: TokenKind,
        expected: &'static str,
    ) -> Result<&'a Token, ParseError> {
        let tokens: &'a [Token] = self.tokens;
        let token = &tokens[self.pos.min(tokens.len() - 1)];
        if token.kind == kind {
            self.pos += 1;
            Ok(token)
        } else {
            Err(self.error_here(expected))
        }
    }

    fn expect_keyword(
        &mut self,
        keyword: Keyword,
        expected: &'static str,
    ) -> Result<(), ParseError> {
        self.expect_kind(TokenKind::Keyword(keyword), expected)
    }

    fn expect_ident(&mut self, expected: &'static str) -> Result<String, ParseError> {
        Ok(self.expect_token(TokenKind::Identifier, expected)?.text.clone())
    }

    fn error_here(&self, expected: &'static str) -> ParseError {
        let token = self.peek();
        ParseError {
            kind: ParseErrorKind::Expected {
                expected,
                found: describe(token),
            },
            span: token.span,
        }
    }

    /// Error positioned at the most recently consumed declaration,
    /// used for duplicate-name reports after a declaration has been
    /// fully parsed.
    fn error_before(&self, kind: ParseErrorKind) -> ParseError {
        let span = self
            .tokens
            .get(self.pos.saturating_sub(1))
            .map_or(Span { line: 0, column: 0 }, |t| t.span);
        ParseError { kind, span }
    }
}

fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::EndOfInput => "end of input".to_string(),
        TokenKind::CodeBlock => "code block".to_string(),
        TokenKind::Str => format!("\"{}\"", token.text),
        _ => format!("`{}`", token.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn effect(input: &str) -> Result<EffectFile, ParseError> {
        parse_effect(&tokenize(input).expect("tokenize failed"))
    }

    fn fragment(input: &str) -> Result<FragmentFile, ParseError> {
        parse_fragment(&tokenize(input).expect("tokenize failed"))
    }

    const MINIMAL_EFFECT: &str = "effect E;\n\
        technique Main {\n\
        \tpass P0 {\n\
        \t\tvertex \"a.fragment\";\n\
        \t\tpixel \"b.fragment\";\n\
        \t}\n\
        }\n";

    #[test]
    fn minimal_effect() {
        let e = effect(MINIMAL_EFFECT).expect("parse failed");
        assert_eq!(e.name, "E");
        assert_eq!(e.techniques.len(), 1);
        assert_eq!(e.techniques[0].passes.len(), 1);
        let pass = &e.techniques[0].passes[0];
        assert_eq!(pass.vertex[0].path, "a.fragment");
        assert_eq!(pass.pixel[0].path, "b.fragment");
    }

    #[test]
    fn effect_params_with_semantic_and_default() {
        let e = effect(
            "effect E;\n\
             param matrix wvp : WORLDVIEWPROJECTION;\n\
             param float3 tint : COLOR = (1.0, 1.0, 1.0);\n\
             param float gain = 0.5;\n\
             technique T { pass P { vertex \"v\"; pixel \"p\"; } }\n",
        )
        .expect("parse failed");
        assert_eq!(e.params.len(), 3);
        assert_eq!(e.params[0].ty, ParamType::Matrix);
        assert_eq!(e.params[0].semantic.as_deref(), Some("WORLDVIEWPROJECTION"));
        assert_eq!(
            e.params[1].default,
            Some(ParamValue::Vector(vec![
                "1.0".to_string(),
                "1.0".to_string(),
                "1.0".to_string()
            ]))
        );
        assert_eq!(e.params[2].default, Some(ParamValue::Scalar("0.5".to_string())));
    }

    #[test]
    fn bindings() {
        let e = effect(
            "effect E;\n\
             param matrix wvp;\n\
             param float3 tint;\n\
             technique T { pass P {\n\
             \tvertex \"v.fragment\" (world = wvp);\n\
             \tpixel \"p.fragment\" (color = tint, extra = wvp);\n\
             } }\n",
        )
        .expect("parse failed");
        let pass = &e.techniques[0].passes[0];
        assert_eq!(pass.vertex[0].bindings.len(), 1);
        assert_eq!(pass.vertex[0].bindings[0].fragment_param, "world");
        assert_eq!(pass.vertex[0].bindings[0].effect_param, "wvp");
        assert_eq!(pass.pixel[0].bindings.len(), 2);
    }

    #[test]
    fn multiple_fragments_per_stage_keep_order() {
        let e = effect(
            "effect E;\n\
             technique T { pass P {\n\
             \tvertex \"first\";\n\
             \tvertex \"second\";\n\
             \tpixel \"only\";\n\
             } }\n",
        )
        .expect("parse failed");
        let paths: Vec<_> = e.techniques[0].passes[0]
            .vertex
            .iter()
            .map(|r| r.path.as_str())
            .collect();
        assert_eq!(paths, vec!["first", "second"]);
    }

    #[test]
    fn duplicate_technique() {
        let err = effect(
            "effect E;\n\
             technique T { pass P { vertex \"v\"; pixel \"p\"; } }\n\
             technique T { pass P { vertex \"v\"; pixel \"p\"; } }\n",
        )
        .unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::DuplicateTechnique {
                name: "T".to_string()
            }
        );
    }

    #[test]
    fn duplicate_pass() {
        let err = effect(
            "effect E;\n\
             technique T {\n\
             \tpass P { vertex \"v\"; pixel \"p\"; }\n\
             \tpass P { vertex \"v\"; pixel \"p\"; }\n\
             }\n",
        )
        .unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::DuplicatePass {
                name: "P".to_string()
            }
        );
    }

    #[test]
    fn duplicate_param() {
        let err = effect("effect E;\nparam float a;\nparam float a;\n").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::DuplicateParam {
                name: "a".to_string()
            }
        );
    }

    #[test]
    fn missing_pixel_stage() {
        let err = effect("effect E;\ntechnique T { pass P { vertex \"v\"; } }\n").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::MissingStage {
                pass: "P".to_string(),
                stage: Stage::Pixel,
            }
        );
    }

    #[test]
    fn unknown_param_type() {
        let err = effect("effect E;\nparam quaternion q;\n").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::UnknownParamType {
                found: "quaternion".to_string()
            }
        );
        assert_eq!(err.span.line, 1);
        assert_eq!(err.span.column, 6);
    }

    #[test]
    fn unexpected_token_reports_expected_and_found() {
        let err = effect("effect E\ntechnique").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::Expected {
                expected: "`;`",
                found: "`technique`".to_string(),
            }
        );
        assert_eq!(err.to_string(), "expected `;`, found `technique` at line 2, column 1");
    }

    #[test]
    fn empty_token_slice_is_an_error() {
        let err = parse_effect(&[]).unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::Expected {
                expected: "`effect`",
                found: "end of input".to_string(),
            }
        );
        assert!(parse_fragment(&[]).is_err());
    }

    #[test]
    fn error_at_end_of_input() {
        let err = effect("effect E;\ntechnique T {").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::Expected {
                expected: "pass declaration",
                ..
            }
        ));
    }

    #[test]
    fn minimal_fragment() {
        let f = fragment(
            "fragment F;\n\
             vertex __hlsl__\nvoid $main() {}\n__hlsl__\n",
        )
        .expect("parse failed");
        assert_eq!(f.name, "F");
        assert_eq!(f.profile, ShaderProfile::Sm1_1);
        assert_eq!(f.vertex.as_deref(), Some("void $main() {}"));
        assert!(f.pixel.is_none());
    }

    #[test]
    fn fragment_with_profile_requires_and_params() {
        let f = fragment(
            "fragment Lighting;\n\
             profile sm_3_0;\n\
             require \"common.fragment\";\n\
             require \"noise.fragment\";\n\
             param float3 light_dir : DIRECTION;\n\
             pixel __hlsl__\nfloat4 $main() : COLOR { return 0; }\n__hlsl__\n",
        )
        .expect("parse failed");
        assert_eq!(f.profile, ShaderProfile::Sm3_0);
        assert_eq!(f.requires, vec!["common.fragment", "noise.fragment"]);
        assert_eq!(f.params[0].name, "light_dir");
        assert!(f.vertex.is_none());
    }

    #[test]
    fn fragment_unknown_profile() {
        let err = fragment("fragment F;\nprofile sm_7_0;\n").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::UnknownProfile {
                found: "sm_7_0".to_string()
            }
        );
    }

    #[test]
    fn fragment_duplicate_stage_block() {
        let err = fragment(
            "fragment F;\n\
             vertex __hlsl__ a __hlsl__\n\
             vertex __hlsl__ b __hlsl__\n",
        )
        .unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::DuplicateStageBlock {
                stage: Stage::Vertex
            }
        );
    }

    #[test]
    fn trailing_garbage_rejected() {
        let err = effect(&format!("{MINIMAL_EFFECT}stray")).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::Expected { .. }));
    }
}
