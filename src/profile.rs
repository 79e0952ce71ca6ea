use std::fmt;
use std::str::FromStr;

/// Hardware capability level an effect can be compiled for.
///
/// The variants form a closed, totally ordered set; profile negotiation
/// walks them in ascending order, so `Ord` here is load-bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShaderProfile {
    Sm1_1,
    Sm2_0,
    Sm3_0,
    Sm4_0,
    Sm5_0,
}

impl ShaderProfile {
    /// Every profile, lowest capability first.
    pub const ALL: [Self; 5] = [
        Self::Sm1_1,
        Self::Sm2_0,
        Self::Sm3_0,
        Self::Sm4_0,
        Self::Sm5_0,
    ];

    /// Lowest capability level.
    pub const MINIMUM: Self = Self::Sm1_1;

    /// The next higher profile, or `None` at the top of the range.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        let idx = Self::ALL.iter().position(|p| *p == self)?;
        Self::ALL.get(idx + 1).copied()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sm1_1 => "sm_1_1",
            Self::Sm2_0 => "sm_2_0",
            Self::Sm3_0 => "sm_3_0",
            Self::Sm4_0 => "sm_4_0",
            Self::Sm5_0 => "sm_5_0",
        }
    }

    /// Compilation target name for the vertex stage, e.g. `vs_2_0`.
    #[must_use]
    pub const fn vertex_target(self) -> &'static str {
        match self {
            Self::Sm1_1 => "vs_1_1",
            Self::Sm2_0 => "vs_2_0",
            Self::Sm3_0 => "vs_3_0",
            Self::Sm4_0 => "vs_4_0",
            Self::Sm5_0 => "vs_5_0",
        }
    }

    /// Compilation target name for the pixel stage, e.g. `ps_2_0`.
    #[must_use]
    pub const fn pixel_target(self) -> &'static str {
        match self {
            Self::Sm1_1 => "ps_1_1",
            Self::Sm2_0 => "ps_2_0",
            Self::Sm3_0 => "ps_3_0",
            Self::Sm4_0 => "ps_4_0",
            Self::Sm5_0 => "ps_5_0",
        }
    }

    /// Keyword used to open a technique block in generated code.
    ///
    /// The effect framework syntax changed between shader model
    /// generations: `technique` up to SM3, `technique10`/`technique11`
    /// from SM4 on.
    #[must_use]
    pub const fn technique_keyword(self) -> &'static str {
        match self {
            Self::Sm1_1 | Self::Sm2_0 | Self::Sm3_0 => "technique",
            Self::Sm4_0 => "technique10",
            Self::Sm5_0 => "technique11",
        }
    }

    /// Whether pass bodies use the SM4-style `SetVertexShader(
    /// CompileShader(...))` assignments instead of `compile` statements.
    #[must_use]
    pub const fn uses_compile_shader_syntax(self) -> bool {
        matches!(self, Self::Sm4_0 | Self::Sm5_0)
    }
}

impl fmt::Display for ShaderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized profile name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shader profile: {0}")]
pub struct UnknownProfile(pub String);

impl FromStr for ShaderProfile {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sm_1_1" => Ok(Self::Sm1_1),
            "sm_2_0" => Ok(Self::Sm2_0),
            "sm_3_0" => Ok(Self::Sm3_0),
            "sm_4_0" => Ok(Self::Sm4_0),
            "sm_5_0" => Ok(Self::Sm5_0),
            _ => Err(UnknownProfile(s.to_string())),
        }
    }
}
