//! Shader fragment lexer, parser, linker, and effect code generator.
//!
//! Composes reusable shader *fragments* (small, parameterized pieces of
//! shading code) into a complete, compilable effect for one of several
//! hardware shader profiles. The pipeline runs lexer, parser, linker,
//! and code generator over a small fragment-linking language, and a
//! profile negotiator retries generation/compilation at increasing
//! capability levels when the chosen target turns out to be too low.
//!
//! # Quick start
//!
//! ## Parse an effect file
//!
//! ```
//! use fxlink::{parse_effect, tokenize};
//!
//! let source = "effect Bloom;\n\
//!     technique Main {\n\
//!     \tpass P0 {\n\
//!     \t\tvertex \"transform.fragment\";\n\
//!     \t\tpixel \"tint.fragment\";\n\
//!     \t}\n\
//!     }\n";
//! let tokens = tokenize(source).unwrap();
//! let effect = parse_effect(&tokens).unwrap();
//! assert_eq!(effect.techniques[0].passes[0].name, "P0");
//! ```
//!
//! ## Link and generate
//!
//! ```
//! use fxlink::{
//!     ContentIdentity, FragmentSource, FragmentSourceProvider, generate, link, parse_effect_str,
//! };
//!
//! struct SingleFragment;
//!
//! impl FragmentSourceProvider for SingleFragment {
//!     fn load_fragment_source(
//!         &self,
//!         reference: &str,
//!         _from: &ContentIdentity,
//!     ) -> Option<FragmentSource> {
//!         let text = "fragment Passthrough;\n\
//!             vertex __hlsl__\nvoid $main() {}\n__hlsl__\n\
//!             pixel __hlsl__\nfloat4 $main() : COLOR { return 0; }\n__hlsl__\n";
//!         Some(FragmentSource {
//!             text: text.to_string(),
//!             identity: ContentIdentity::new(reference, "docs"),
//!         })
//!     }
//! }
//!
//! let effect = parse_effect_str(
//!     "effect E;\ntechnique T { pass P { vertex \"f\"; pixel \"f\"; } }\n",
//! )
//! .unwrap();
//! let identity = ContentIdentity::new("e.effect", "docs");
//! let symbol = link(&effect, &identity, &SingleFragment).unwrap();
//! let source = generate(&symbol, symbol.min_profile);
//! assert!(source.contains("technique T"));
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod builder;
pub mod codegen;
pub mod identity;
pub mod lexer;
pub mod linker;
pub mod parser;
pub mod processor;
pub mod profile;
pub mod token;

pub use ast::{
    Binding, EffectFile, FragmentFile, FragmentRef, Param, ParamType, ParamValue, Pass, Stage,
    Technique,
};
pub use codegen::generate;
pub use identity::ContentIdentity;
pub use lexer::{LexError, LexErrorKind, tokenize};
pub use linker::{
    DirectoryProvider, EffectSymbol, FragmentInstance, FragmentSource, FragmentSourceProvider,
    LinkError, LinkErrorKind, PassSymbol, TechniqueSymbol, link,
};
pub use parser::{ParseError, ParseErrorKind, parse_effect, parse_fragment};
pub use processor::{
    CompileDiagnostic, CompiledEffect, DiagnosticSink, EffectCompiler, ImportError, NullSink,
    ProcessError, ProcessOutput, debug_output_path, import_effect, import_fragment, negotiate,
    process,
};
pub use profile::{ShaderProfile, UnknownProfile};
pub use token::{Keyword, Span, Token, TokenKind};

/// Unified error type covering both lexing and parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A lexer error.
    #[error("{0}")]
    Lex(#[from] LexError),
    /// A parser error.
    #[error("{0}")]
    Parse(#[from] ParseError),
}

/// Tokenize and parse an effect source string in one step.
pub fn parse_effect_str(input: &str) -> Result<EffectFile, Error> {
    let tokens = tokenize(input)?;
    Ok(parse_effect(&tokens)?)
}

/// Tokenize and parse a fragment source string in one step.
pub fn parse_fragment_str(input: &str) -> Result<FragmentFile, Error> {
    let tokens = tokenize(input)?;
    Ok(parse_fragment(&tokens)?)
}
