//! Resolves a parsed effect against its referenced fragments and
//! produces the linked `EffectSymbol`.
//!
//! Fragment loading recurses through `require` declarations with an
//! explicit visited stack, so reference cycles are reported instead of
//! overflowing. The first fatal error aborts the whole link; there is
//! no partial symbol.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::ast::{Binding, EffectFile, Param, Stage};
use crate::identity::ContentIdentity;
use crate::lexer::tokenize;
use crate::parser::parse_fragment;
use crate::profile::ShaderProfile;

/// Fragment source text paired with the identity it was loaded under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSource {
    pub text: String,
    pub identity: ContentIdentity,
}

/// External collaborator that resolves a fragment reference to its
/// source text. `None` means the reference cannot be resolved under
/// the host's search rules.
pub trait FragmentSourceProvider {
    fn load_fragment_source(
        &self,
        reference: &str,
        from: &ContentIdentity,
    ) -> Option<FragmentSource>;
}

/// Filesystem provider: resolves references relative to the referencing
/// file's directory, then against any configured search paths.
#[derive(Debug, Clone, Default)]
pub struct DirectoryProvider {
    search_paths: Vec<PathBuf>,
}

impl DirectoryProvider {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            search_paths: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }
}

impl FragmentSourceProvider for DirectoryProvider {
    fn load_fragment_source(
        &self,
        reference: &str,
        from: &ContentIdentity,
    ) -> Option<FragmentSource> {
        let mut candidates = Vec::new();
        if let Some(dir) = from.source_path().parent() {
            candidates.push(dir.join(reference));
        }
        for root in &self.search_paths {
            candidates.push(root.join(reference));
        }

        for candidate in candidates {
            if let Ok(text) = fs::read_to_string(&candidate) {
                return Some(FragmentSource {
                    text,
                    identity: ContentIdentity::new(candidate, "fxlink linker"),
                });
            }
        }
        None
    }
}

/// Classifies a linking error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkErrorKind {
    /// Fragment reference could not be resolved to a source file.
    UnresolvedReference {
        reference: String,
        technique: String,
        pass: String,
    },
    /// `require` chain loops back on itself.
    CyclicRequire { chain: Vec<String> },
    /// Referenced fragment failed to lex or parse.
    InvalidFragment { reference: String, message: String },
    /// Fragment referenced for a stage it declares no code for.
    MissingStageCode { fragment: String, stage: Stage },
    /// Binding names a parameter the fragment does not declare.
    UnknownFragmentParameter { fragment: String, param: String },
    /// Binding targets a parameter the effect does not declare.
    UnknownEffectParameter { param: String },
    /// Bound fragment and effect parameters disagree on type.
    ParameterTypeMismatch {
        fragment: String,
        param: String,
        fragment_ty: &'static str,
        effect_ty: &'static str,
    },
    /// Fragment parameter bound more than once in one reference.
    DuplicateBinding { fragment: String, param: String },
    /// Two merged fragments declare the same parameter with different
    /// types.
    ConflictingParameter { fragment: String, param: String },
}

impl fmt::Display for LinkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedReference {
                reference,
                technique,
                pass,
            } => {
                write!(
                    f,
                    "unresolved fragment reference \"{reference}\" \
                     in technique `{technique}`, pass `{pass}`"
                )
            }
            Self::CyclicRequire { chain } => {
                write!(f, "cyclic fragment reference: {}", chain.join(" -> "))
            }
            Self::InvalidFragment { reference, message } => {
                write!(f, "invalid fragment \"{reference}\": {message}")
            }
            Self::MissingStageCode { fragment, stage } => {
                write!(f, "fragment `{fragment}` has no {stage} code block")
            }
            Self::UnknownFragmentParameter { fragment, param } => {
                write!(
                    f,
                    "fragment `{fragment}` declares no parameter `{param}`"
                )
            }
            Self::UnknownEffectParameter { param } => {
                write!(f, "effect declares no parameter `{param}`")
            }
            Self::ParameterTypeMismatch {
                fragment,
                param,
                fragment_ty,
                effect_ty,
            } => {
                write!(
                    f,
                    "parameter `{param}` of fragment `{fragment}` \
                     is {fragment_ty}, bound to {effect_ty}"
                )
            }
            Self::DuplicateBinding { fragment, param } => {
                write!(
                    f,
                    "parameter `{param}` of fragment `{fragment}` \
                     bound more than once"
                )
            }
            Self::ConflictingParameter { fragment, param } => {
                write!(
                    f,
                    "required fragment `{fragment}` redeclares \
                     parameter `{param}` with a different type"
                )
            }
        }
    }
}

/// Error produced during linking, carrying the identity of the
/// enclosing declaration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} in {identity}")]
pub struct LinkError {
    pub kind: LinkErrorKind,
    pub identity: ContentIdentity,
}

/// The linked, resolved form of an effect: every fragment reference
/// replaced by its resolved body, every binding validated, and the
/// minimum compatible profile computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectSymbol {
    pub name: String,
    pub identity: ContentIdentity,
    pub params: Vec<Param>,
    pub techniques: Vec<TechniqueSymbol>,
    pub min_profile: ShaderProfile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechniqueSymbol {
    pub name: String,
    pub passes: Vec<PassSymbol>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSymbol {
    pub name: String,
    pub vertex: Vec<FragmentInstance>,
    pub pixel: Vec<FragmentInstance>,
}

impl PassSymbol {
    #[must_use]
    pub fn stage_instances(&self, stage: Stage) -> &[FragmentInstance] {
        match stage {
            Stage::Vertex => &self.vertex,
            Stage::Pixel => &self.pixel,
        }
    }
}

/// One resolved fragment reference: the fragment body (with required
/// helpers merged in), its merged parameters, validated bindings, and
/// the unique naming scope the generator prefixes its symbols with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentInstance {
    pub scope: String,
    pub fragment_name: String,
    pub reference: String,
    pub stage: Stage,
    pub params: Vec<Param>,
    pub bindings: Vec<Binding>,
    pub code: String,
    pub profile: ShaderProfile,
}

impl FragmentInstance {
    /// The effect parameter a fragment parameter is bound to, if any.
    #[must_use]
    pub fn binding_for(&self, fragment_param: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.fragment_param == fragment_param)
            .map(|b| b.effect_param.as_str())
    }
}

/// Link an effect against its fragments.
///
/// # Errors
///
/// Returns `LinkError` on the first unresolved reference, invalid
/// fragment, require cycle, or binding mismatch.
pub fn link(
    effect: &EffectFile,
    identity: &ContentIdentity,
    provider: &dyn FragmentSourceProvider,
) -> Result<EffectSymbol, LinkError> {
    let mut min_profile = ShaderProfile::MINIMUM;
    let mut instance_index = 0usize;
    let mut techniques = Vec::new();

    for technique in &effect.techniques {
        let mut passes = Vec::new();
        for pass in &technique.passes {
            let mut vertex = Vec::new();
            let mut pixel = Vec::new();
            for stage in Stage::ALL {
                for reference in pass.stage_refs(stage) {
                    let instance = resolve_reference(
                        effect,
                        identity,
                        provider,
                        &technique.name,
                        &pass.name,
                        stage,
                        &reference.path,
                        &reference.bindings,
                        instance_index,
                    )?;
                    min_profile = min_profile.max(instance.profile);
                    instance_index += 1;
                    match stage {
                        Stage::Vertex => vertex.push(instance),
                        Stage::Pixel => pixel.push(instance),
                    }
                }
            }
            passes.push(PassSymbol {
                name: pass.name.clone(),
                vertex,
                pixel,
            });
        }
        techniques.push(TechniqueSymbol {
            name: technique.name.clone(),
            passes,
        });
    }

    Ok(EffectSymbol {
        name: effect.name.clone(),
        identity: identity.clone(),
        params: effect.params.clone(),
        techniques,
        min_profile,
    })
}

#[allow(clippy::too_many_arguments)]
fn resolve_reference(
    effect: &EffectFile,
    identity: &ContentIdentity,
    provider: &dyn FragmentSourceProvider,
    technique: &str,
    pass: &str,
    stage: Stage,
    reference: &str,
    bindings: &[Binding],
    instance_index: usize,
) -> Result<FragmentInstance, LinkError> {
    let mut resolver = Resolver {
        provider,
        technique,
        pass,
        stack: Vec::new(),
        merged: Vec::new(),
    };
    let Some(resolved) = resolver.resolve(reference, identity)? else {
        // The merged set starts empty, so the root fragment is new.
        unreachable!()
    };

    let has_stage = match stage {
        Stage::Vertex => resolved.declares_vertex,
        Stage::Pixel => resolved.declares_pixel,
    };
    if !has_stage {
        return Err(LinkError {
            kind: LinkErrorKind::MissingStageCode {
                fragment: resolved.name,
                stage,
            },
            identity: identity.clone(),
        });
    }

    validate_bindings(effect, &resolved, bindings, identity)?;

    let code = match stage {
        Stage::Vertex => resolved.vertex.join("\n\n"),
        Stage::Pixel => resolved.pixel.join("\n\n"),
    };

    Ok(FragmentInstance {
        scope: format!("{}_{instance_index}", resolved.name.to_lowercase()),
        fragment_name: resolved.name,
        reference: reference.to_string(),
        stage,
        params: resolved.params,
        bindings: bindings.to_vec(),
        code,
        profile: resolved.profile,
    })
}

fn validate_bindings(
    effect: &EffectFile,
    resolved: &Resolved,
    bindings: &[Binding],
    identity: &ContentIdentity,
) -> Result<(), LinkError> {
    let err = |kind| LinkError {
        kind,
        identity: identity.clone(),
    };

    for (i, binding) in bindings.iter().enumerate() {
        if bindings[..i]
            .iter()
            .any(|b| b.fragment_param == binding.fragment_param)
        {
            return Err(err(LinkErrorKind::DuplicateBinding {
                fragment: resolved.name.clone(),
                param: binding.fragment_param.clone(),
            }));
        }

        let Some(fragment_param) = resolved
            .params
            .iter()
            .find(|p| p.name == binding.fragment_param)
        else {
            return Err(err(LinkErrorKind::UnknownFragmentParameter {
                fragment: resolved.name.clone(),
                param: binding.fragment_param.clone(),
            }));
        };

        let Some(effect_param) = effect
            .params
            .iter()
            .find(|p| p.name == binding.effect_param)
        else {
            return Err(err(LinkErrorKind::UnknownEffectParameter {
                param: binding.effect_param.clone(),
            }));
        };

        if fragment_param.ty != effect_param.ty {
            return Err(err(LinkErrorKind::ParameterTypeMismatch {
                fragment: resolved.name.clone(),
                param: binding.fragment_param.clone(),
                fragment_ty: fragment_param.ty.as_str(),
                effect_ty: effect_param.ty.as_str(),
            }));
        }
    }

    Ok(())
}

/// A fragment with its `require` closure flattened in: dependencies'
/// code blocks precede the fragment's own, parameters are merged, and
/// the profile is the maximum over every contributor.
struct Resolved {
    name: String,
    profile: ShaderProfile,
    params: Vec<Param>,
    vertex: Vec<String>,
    pixel: Vec<String>,
    declares_vertex: bool,
    declares_pixel: bool,
}

struct Resolver<'a> {
    provider: &'a dyn FragmentSourceProvider,
    technique: &'a str,
    pass: &'a str,
    /// Identity paths of fragments currently being resolved.
    stack: Vec<String>,
    /// Identity paths already merged into this instance; a fragment
    /// required along two edges contributes once.
    merged: Vec<String>,
}

impl Resolver<'_> {
    /// Returns `None` when the fragment was already merged into this
    /// instance along another `require` edge.
    fn resolve(
        &mut self,
        reference: &str,
        from: &ContentIdentity,
    ) -> Result<Option<Resolved>, LinkError> {
        let Some(source) = self.provider.load_fragment_source(reference, from) else {
            return Err(LinkError {
                kind: LinkErrorKind::UnresolvedReference {
                    reference: reference.to_string(),
                    technique: self.technique.to_string(),
                    pass: self.pass.to_string(),
                },
                identity: from.clone(),
            });
        };

        let path = source.identity.source_path.display().to_string();
        if let Some(start) = self.stack.iter().position(|p| *p == path) {
            let mut chain: Vec<String> = self.stack[start..].to_vec();
            chain.push(path);
            return Err(LinkError {
                kind: LinkErrorKind::CyclicRequire { chain },
                identity: from.clone(),
            });
        }
        if self.merged.contains(&path) {
            return Ok(None);
        }

        let invalid = |message: String| LinkError {
            kind: LinkErrorKind::InvalidFragment {
                reference: reference.to_string(),
                message,
            },
            identity: source.identity.clone(),
        };
        let tokens = tokenize(&source.text).map_err(|e| invalid(e.to_string()))?;
        let file = parse_fragment(&tokens).map_err(|e| invalid(e.to_string()))?;

        self.stack.push(path.clone());

        let mut resolved = Resolved {
            name: file.name.clone(),
            profile: file.profile,
            params: Vec::new(),
            vertex: Vec::new(),
            pixel: Vec::new(),
            declares_vertex: file.vertex.is_some(),
            declares_pixel: file.pixel.is_some(),
        };

        for require in &file.requires {
            let Some(dep) = self.resolve(require, &source.identity)? else {
                continue;
            };
            merge_params(&mut resolved.params, &dep.params, &dep.name, from)?;
            resolved.vertex.extend(dep.vertex);
            resolved.pixel.extend(dep.pixel);
            resolved.profile = resolved.profile.max(dep.profile);
        }

        merge_params(&mut resolved.params, &file.params, &file.name, from)?;
        if let Some(code) = file.vertex {
            resolved.vertex.push(code);
        }
        if let Some(code) = file.pixel {
            resolved.pixel.push(code);
        }

        self.stack.pop();
        self.merged.push(path);

        Ok(Some(resolved))
    }
}

fn merge_params(
    into: &mut Vec<Param>,
    params: &[Param],
    fragment: &str,
    identity: &ContentIdentity,
) -> Result<(), LinkError> {
    for param in params {
        match into.iter().find(|p| p.name == param.name) {
            Some(existing) if existing.ty == param.ty => {}
            Some(_) => {
                return Err(LinkError {
                    kind: LinkErrorKind::ConflictingParameter {
                        fragment: fragment.to_string(),
                        param: param.name.clone(),
                    },
                    identity: identity.clone(),
                });
            }
            None => into.push(param.clone()),
        }
    }
    Ok(())
}
