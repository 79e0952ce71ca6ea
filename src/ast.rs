//! The code model: syntax trees for effect and fragment files.
//!
//! Trees are built by the parser, read-only afterwards. Fragment
//! references are symbolic here; the linker resolves them.

use std::fmt;

use crate::profile::ShaderProfile;
use crate::token::Span;

/// Parsed effect file: declared parameters plus techniques.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectFile {
    pub name: String,
    pub params: Vec<Param>,
    pub techniques: Vec<Technique>,
}

/// Named group of passes; one rendering strategy for the effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Technique {
    pub name: String,
    pub passes: Vec<Pass>,
}

/// One rendering step: ordered fragment references per shader stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pass {
    pub name: String,
    pub vertex: Vec<FragmentRef>,
    pub pixel: Vec<FragmentRef>,
}

impl Pass {
    /// The references for one stage, in declaration order.
    #[must_use]
    pub fn stage_refs(&self, stage: Stage) -> &[FragmentRef] {
        match stage {
            Stage::Vertex => &self.vertex,
            Stage::Pixel => &self.pixel,
        }
    }
}

/// Symbolic reference to a fragment asset with parameter bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentRef {
    pub path: String,
    pub bindings: Vec<Binding>,
    pub span: Span,
}

/// Binds a fragment parameter to an effect parameter by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub fragment_param: String,
    pub effect_param: String,
}

/// Parameter declaration in an effect or fragment file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: ParamType,
    pub semantic: Option<String>,
    pub default: Option<ParamValue>,
}

/// Semantic type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Float,
    Float2,
    Float3,
    Float4,
    Matrix,
    Texture,
    Sampler,
}

impl ParamType {
    /// Map a type lexeme to its variant, if recognized.
    #[must_use]
    pub fn from_ident(text: &str) -> Option<Self> {
        match text {
            "float" => Some(Self::Float),
            "float2" => Some(Self::Float2),
            "float3" => Some(Self::Float3),
            "float4" => Some(Self::Float4),
            "matrix" => Some(Self::Matrix),
            "texture" => Some(Self::Texture),
            "sampler" => Some(Self::Sampler),
            _ => None,
        }
    }

    /// Type name as written in generated shading code.
    #[must_use]
    pub const fn hlsl_name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Float2 => "float2",
            Self::Float3 => "float3",
            Self::Float4 => "float4",
            Self::Matrix => "float4x4",
            Self::Texture => "texture",
            Self::Sampler => "sampler",
        }
    }

    /// Type name as written in source files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Matrix => "matrix",
            other => other.hlsl_name(),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default value of a parameter. Raw number lexemes are preserved so
/// generated code reproduces the source spelling byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Scalar(String),
    Vector(Vec<String>),
}

/// Shader stage a fragment contributes code to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Vertex,
    Pixel,
}

impl Stage {
    /// Fixed emission order: vertex before pixel.
    pub const ALL: [Self; 2] = [Self::Vertex, Self::Pixel];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Pixel => "pixel",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed fragment file: a reusable, parameterized piece of shading
/// code with a declared minimum profile and optional helper requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentFile {
    pub name: String,
    pub profile: ShaderProfile,
    pub requires: Vec<String>,
    pub params: Vec<Param>,
    pub vertex: Option<String>,
    pub pixel: Option<String>,
}

impl FragmentFile {
    /// The raw code block for one stage, if the fragment declares it.
    #[must_use]
    pub fn code(&self, stage: Stage) -> Option<&str> {
        match stage {
            Stage::Vertex => self.vertex.as_deref(),
            Stage::Pixel => self.pixel.as_deref(),
        }
    }
}
