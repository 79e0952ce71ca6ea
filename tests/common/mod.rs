#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use fxlink::{
    CompileDiagnostic, CompiledEffect, ContentIdentity, DiagnosticSink, EffectCompiler, EffectFile,
    FragmentSource, FragmentSourceProvider, ShaderProfile, parse_effect_str,
};

/// In-memory fragment store keyed by reference path.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    fragments: HashMap<String, String>,
}

impl MemoryProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, reference: &str, text: &str) -> Self {
        self.fragments.insert(reference.to_string(), text.to_string());
        self
    }
}

impl FragmentSourceProvider for MemoryProvider {
    fn load_fragment_source(
        &self,
        reference: &str,
        _from: &ContentIdentity,
    ) -> Option<FragmentSource> {
        self.fragments.get(reference).map(|text| FragmentSource {
            text: text.clone(),
            identity: ContentIdentity::new(reference, "test provider"),
        })
    }
}

/// Fake external compiler scripted per test: records every attempted
/// profile, succeeds at or above `succeed_at`, and reports an
/// insufficient-capability diagnostic below it.
#[derive(Debug, Default)]
pub struct ScriptedCompiler {
    pub succeed_at: Option<ShaderProfile>,
    pub fatal: Option<CompileDiagnostic>,
    pub attempts: RefCell<Vec<ShaderProfile>>,
}

impl ScriptedCompiler {
    #[must_use]
    pub fn succeeding_at(profile: ShaderProfile) -> Self {
        Self {
            succeed_at: Some(profile),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn always_insufficient() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn fatal_with(diagnostic: CompileDiagnostic) -> Self {
        Self {
            fatal: Some(diagnostic),
            ..Self::default()
        }
    }
}

impl EffectCompiler for ScriptedCompiler {
    fn compile(
        &self,
        source: &str,
        _identity: &ContentIdentity,
    ) -> Result<CompiledEffect, CompileDiagnostic> {
        let profile = profile_of(source);
        self.attempts.borrow_mut().push(profile);

        if let Some(diagnostic) = &self.fatal {
            return Err(diagnostic.clone());
        }

        match self.succeed_at {
            Some(target) if profile >= target => Ok(CompiledEffect {
                bytecode: vec![0xFB, 0x00],
            }),
            _ => Err(CompileDiagnostic {
                code: Some("X5608".to_string()),
                message: format!("error X5608: too many instruction slots for {profile}"),
            }),
        }
    }
}

/// Reads the target profile back out of a generated source header.
pub fn profile_of(source: &str) -> ShaderProfile {
    let line = source
        .lines()
        .find(|l| l.starts_with("// target profile: "))
        .expect("generated source carries a profile header");
    line.trim_start_matches("// target profile: ")
        .parse()
        .expect("header names a known profile")
}

/// Sink that records every informational message.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub messages: RefCell<Vec<String>>,
}

impl DiagnosticSink for RecordingSink {
    fn info(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

pub const TRANSFORM_FRAGMENT: &str = "fragment Transform;\n\
    param matrix wvp : WORLDVIEWPROJECTION;\n\
    vertex __hlsl__\n\
    void $main(float3 position : POSITION) { mul(float4(position, 1.0), $wvp); }\n\
    __hlsl__\n";

pub const TINT_FRAGMENT: &str = "fragment Tint;\n\
    param float3 color : COLOR;\n\
    pixel __hlsl__\n\
    float4 $main() : COLOR { return float4($color, 1.0); }\n\
    __hlsl__\n";

pub const SIMPLE_EFFECT: &str = "effect Simple;\n\
    technique Main {\n\
    \tpass P0 {\n\
    \t\tvertex \"transform.fragment\";\n\
    \t\tpixel \"tint.fragment\";\n\
    \t}\n\
    }\n";

#[must_use]
pub fn simple_effect() -> (EffectFile, ContentIdentity) {
    let effect = parse_effect_str(SIMPLE_EFFECT).expect("canned effect parses");
    let identity = ContentIdentity::new("simple.effect", "test importer");
    (effect, identity)
}

#[must_use]
pub fn simple_provider() -> MemoryProvider {
    MemoryProvider::new()
        .with("transform.fragment", TRANSFORM_FRAGMENT)
        .with("tint.fragment", TINT_FRAGMENT)
}

/// Fragment source with the given name, profile, and a trivial body
/// for both stages.
#[must_use]
pub fn fragment_with_profile(name: &str, profile: ShaderProfile) -> String {
    format!(
        "fragment {name};\n\
         profile {profile};\n\
         vertex __hlsl__\nvoid $main() {{}}\n__hlsl__\n\
         pixel __hlsl__\nfloat4 $main() : COLOR {{ return 0; }}\n__hlsl__\n"
    )
}
