//! Fluent construction of effect and fragment models, for building
//! effects programmatically instead of parsing source text.

use crate::ast::{
    Binding, EffectFile, FragmentFile, FragmentRef, Param, ParamType, ParamValue, Pass, Technique,
};
use crate::profile::ShaderProfile;
use crate::token::Span;

impl EffectFile {
    /// Create a new effect with no parameters or techniques.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            techniques: Vec::new(),
        }
    }

    /// Add a parameter declaration.
    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Add a technique.
    #[must_use]
    pub fn technique(mut self, technique: Technique) -> Self {
        self.techniques.push(technique);
        self
    }
}

impl Technique {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passes: Vec::new(),
        }
    }

    /// Add a pass.
    #[must_use]
    pub fn pass(mut self, pass: Pass) -> Self {
        self.passes.push(pass);
        self
    }
}

impl Pass {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertex: Vec::new(),
            pixel: Vec::new(),
        }
    }

    /// Add a vertex-stage fragment reference.
    #[must_use]
    pub fn vertex(mut self, reference: FragmentRef) -> Self {
        self.vertex.push(reference);
        self
    }

    /// Add a pixel-stage fragment reference.
    #[must_use]
    pub fn pixel(mut self, reference: FragmentRef) -> Self {
        self.pixel.push(reference);
        self
    }
}

impl FragmentRef {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            bindings: Vec::new(),
            span: Span { line: 0, column: 0 },
        }
    }

    /// Bind a fragment parameter to an effect parameter.
    #[must_use]
    pub fn bind(mut self, fragment_param: impl Into<String>, effect_param: impl Into<String>) -> Self {
        self.bindings.push(Binding {
            fragment_param: fragment_param.into(),
            effect_param: effect_param.into(),
        });
        self
    }
}

impl Param {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            semantic: None,
            default: None,
        }
    }

    /// Set the semantic annotation.
    #[must_use]
    pub fn semantic(mut self, semantic: impl Into<String>) -> Self {
        self.semantic = Some(semantic.into());
        self
    }

    /// Set a scalar default value (raw lexeme, e.g. `"0.5"`).
    #[must_use]
    pub fn default_scalar(mut self, value: impl Into<String>) -> Self {
        self.default = Some(ParamValue::Scalar(value.into()));
        self
    }

    /// Set a vector default value from raw component lexemes.
    #[must_use]
    pub fn default_vector<I, S>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default = Some(ParamValue::Vector(
            components.into_iter().map(Into::into).collect(),
        ));
        self
    }
}

impl FragmentFile {
    /// Create a new fragment with the lowest profile and no code.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile: ShaderProfile::MINIMUM,
            requires: Vec::new(),
            params: Vec::new(),
            vertex: None,
            pixel: None,
        }
    }

    /// Set the minimum shader profile.
    #[must_use]
    pub const fn profile(mut self, profile: ShaderProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Add a required helper fragment.
    #[must_use]
    pub fn require(mut self, path: impl Into<String>) -> Self {
        self.requires.push(path.into());
        self
    }

    /// Add a parameter declaration.
    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Set the vertex-stage code block.
    #[must_use]
    pub fn vertex_code(mut self, code: impl Into<String>) -> Self {
        self.vertex = Some(code.into());
        self
    }

    /// Set the pixel-stage code block.
    #[must_use]
    pub fn pixel_code(mut self, code: impl Into<String>) -> Self {
        self.pixel = Some(code.into());
        self
    }
}
