//! Importer/processor entry points and the shader-profile negotiation
//! loop.
//!
//! `import_effect`/`import_fragment` turn a source file into a code
//! model. `process` links the model, then walks the profile order from
//! the symbol's computed minimum upwards, regenerating and recompiling
//! until the external compiler accepts the effect or the profiles run
//! out. The declared minimum is a hint, not a guarantee: a compiler
//! rejection that matches the known insufficient-capability codes is
//! retried one level higher, anything else is fatal and surfaced
//! verbatim.

use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ast::{EffectFile, FragmentFile};
use crate::codegen::generate;
use crate::identity::ContentIdentity;
use crate::lexer::tokenize;
use crate::linker::{EffectSymbol, FragmentSourceProvider, LinkError, link};
use crate::parser::{parse_effect, parse_fragment};
use crate::profile::ShaderProfile;
use crate::token::Span;

/// Tool name recorded in identities produced by the importer.
const IMPORTER_TOOL: &str = "fxlink importer";

/// Compiler diagnostic codes that mean "this profile cannot express
/// the effect" and are worth retrying at a higher capability level.
const PROFILE_ERROR_CODES: [&str; 3] = ["X5608", "X5609", "X4502"];

/// Diagnostic returned by the external shading compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileDiagnostic {
    pub code: Option<String>,
    pub message: String,
}

impl fmt::Display for CompileDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Compiled artifact produced by the external shading compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledEffect {
    pub bytecode: Vec<u8>,
}

/// External collaborator that compiles generated source text.
pub trait EffectCompiler {
    /// # Errors
    ///
    /// Returns the compiler's diagnostic when the source is rejected.
    fn compile(
        &self,
        source: &str,
        identity: &ContentIdentity,
    ) -> Result<CompiledEffect, CompileDiagnostic>;
}

/// Best-effort sink for informational messages. No delivery contract.
pub trait DiagnosticSink {
    fn info(&self, message: &str);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn info(&self, _message: &str) {}
}

/// Error produced by the importer entry points.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Lexical or syntax error in the imported file. The identity
    /// carries a one-based `line,column` sub-location.
    #[error("{identity}: {message}")]
    Content {
        message: String,
        identity: ContentIdentity,
    },
    /// The file could not be read.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Error produced by `process`.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error(transparent)]
    Link(#[from] LinkError),
    /// Fatal compiler diagnostic, surfaced verbatim along with the
    /// location of the generated source so the emitted text can be
    /// inspected.
    #[error("{diagnostic} (generated source: {})", generated_path.display())]
    Compile {
        diagnostic: CompileDiagnostic,
        generated_path: PathBuf,
    },
    /// Every profile from the symbol's minimum upwards was rejected.
    #[error("could not find a shader profile compatible with effect `{effect}`")]
    ProfileExhausted { effect: String },
    #[error("failed to write generated source to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Successful processing result: the artifact, the profile that
/// accepted it, and where the generated source was persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub artifact: CompiledEffect,
    pub profile: ShaderProfile,
    pub generated_path: PathBuf,
}

/// Lex and parse an effect file from disk.
///
/// # Errors
///
/// Fails fast on the first lexical or syntax error, reporting it
/// against the file's identity with a `line,column` sub-location.
pub fn import_effect(path: &Path) -> Result<(EffectFile, ContentIdentity), ImportError> {
    let (text, identity) = read_source(path)?;
    let tokens = tokenize(&text).map_err(|e| content_error(&identity, e.span, &e.kind))?;
    let model =
        parse_effect(&tokens).map_err(|e| content_error(&identity, e.span, &e.kind))?;
    Ok((model, identity))
}

/// Lex and parse a fragment file from disk.
///
/// # Errors
///
/// Same contract as [`import_effect`].
pub fn import_fragment(path: &Path) -> Result<(FragmentFile, ContentIdentity), ImportError> {
    let (text, identity) = read_source(path)?;
    let tokens = tokenize(&text).map_err(|e| content_error(&identity, e.span, &e.kind))?;
    let model =
        parse_fragment(&tokens).map_err(|e| content_error(&identity, e.span, &e.kind))?;
    Ok((model, identity))
}

fn read_source(path: &Path) -> Result<(String, ContentIdentity), ImportError> {
    let identity = ContentIdentity::new(path, IMPORTER_TOOL);
    let text = fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((text, identity))
}

fn content_error(identity: &ContentIdentity, span: Span, message: &dyn fmt::Display) -> ImportError {
    ImportError::Content {
        message: message.to_string(),
        identity: identity.at(format!("{},{}", span.line + 1, span.column + 1)),
    }
}

/// Link an effect and negotiate a shader profile with the external
/// compiler.
///
/// # Errors
///
/// Returns `ProcessError` on a linking failure, a fatal compiler
/// diagnostic, an I/O failure writing the debug file, or profile
/// exhaustion.
pub fn process(
    effect: &EffectFile,
    identity: &ContentIdentity,
    fragments: &dyn FragmentSourceProvider,
    compiler: &dyn EffectCompiler,
    sink: &dyn DiagnosticSink,
) -> Result<ProcessOutput, ProcessError> {
    let symbol = link(effect, identity, fragments)?;
    negotiate(&symbol, compiler, sink)
}

/// Drive the generate/compile retry loop over ascending profiles,
/// starting at the symbol's minimum compatible profile.
///
/// # Errors
///
/// Same contract as [`process`], minus linking.
pub fn negotiate(
    symbol: &EffectSymbol,
    compiler: &dyn EffectCompiler,
    sink: &dyn DiagnosticSink,
) -> Result<ProcessOutput, ProcessError> {
    let generated_path = debug_output_path(&symbol.identity);

    let mut candidate = Some(symbol.min_profile);
    while let Some(profile) = candidate {
        let source = generate(symbol, profile);

        // Persisted before compilation so a rejecting compiler leaves
        // the offending text behind for inspection.
        fs::write(&generated_path, &source).map_err(|e| ProcessError::Io {
            path: generated_path.clone(),
            source: e,
        })?;

        match compiler.compile(&source, &symbol.identity) {
            Ok(artifact) => {
                sink.info(&format!(
                    "{}: stitched effect generated (open this file to view)",
                    generated_path.display()
                ));
                return Ok(ProcessOutput {
                    artifact,
                    profile,
                    generated_path,
                });
            }
            Err(diagnostic) if indicates_insufficient_profile(&diagnostic) => {
                candidate = profile.next();
            }
            Err(diagnostic) => {
                return Err(ProcessError::Compile {
                    diagnostic,
                    generated_path,
                });
            }
        }
    }

    Err(ProcessError::ProfileExhausted {
        effect: symbol.name.clone(),
    })
}

/// Debug-file location for an effect's generated source: the effect's
/// file stem with the target-language extension, under the shared
/// temporary area. Rebuilds of the same effect overwrite; different
/// effects never collide.
#[must_use]
pub fn debug_output_path(identity: &ContentIdentity) -> PathBuf {
    let mut name = identity
        .source_path()
        .file_stem()
        .map_or_else(|| OsStr::new("effect").to_os_string(), OsStr::to_os_string);
    name.push(".fx");
    std::env::temp_dir().join(name)
}

fn indicates_insufficient_profile(diagnostic: &CompileDiagnostic) -> bool {
    PROFILE_ERROR_CODES.iter().any(|code| {
        diagnostic.code.as_deref() == Some(*code) || diagnostic.message.contains(code)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficiency_matches_code_field() {
        let diagnostic = CompileDiagnostic {
            code: Some("X5608".to_string()),
            message: "too many arithmetic instruction slots".to_string(),
        };
        assert!(indicates_insufficient_profile(&diagnostic));
    }

    #[test]
    fn insufficiency_matches_message_text() {
        let diagnostic = CompileDiagnostic {
            code: None,
            message: "error X4502: invalid vs_1_1 output semantics".to_string(),
        };
        assert!(indicates_insufficient_profile(&diagnostic));
    }

    #[test]
    fn other_diagnostics_are_fatal() {
        let diagnostic = CompileDiagnostic {
            code: Some("X3000".to_string()),
            message: "syntax error".to_string(),
        };
        assert!(!indicates_insufficient_profile(&diagnostic));
    }

    #[test]
    fn debug_path_keyed_by_file_stem() {
        let identity = ContentIdentity::new("/assets/fx/bloom.effect", IMPORTER_TOOL);
        let path = debug_output_path(&identity);
        assert_eq!(path.file_name().and_then(OsStr::to_str), Some("bloom.fx"));
        assert_eq!(path.parent(), Some(std::env::temp_dir().as_path()));
    }

    #[test]
    fn debug_paths_differ_per_effect() {
        let a = debug_output_path(&ContentIdentity::new("a.effect", IMPORTER_TOOL));
        let b = debug_output_path(&ContentIdentity::new("b.effect", IMPORTER_TOOL));
        assert_ne!(a, b);
    }
}
