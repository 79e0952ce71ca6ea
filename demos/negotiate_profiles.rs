//! Demonstrate shader-profile negotiation: a compiler that rejects
//! everything below sm_3_0 drives the retry loop upwards until the
//! effect is accepted.

use fxlink::{
    CompileDiagnostic, CompiledEffect, ContentIdentity, DiagnosticSink, EffectCompiler,
    FragmentSource, FragmentSourceProvider, ShaderProfile, link, negotiate, parse_effect_str,
};

struct Passthrough;

impl FragmentSourceProvider for Passthrough {
    fn load_fragment_source(
        &self,
        reference: &str,
        _from: &ContentIdentity,
    ) -> Option<FragmentSource> {
        let text = "fragment Passthrough;\n\
            vertex __hlsl__\n\
            float4 $main(float3 position : POSITION) : POSITION\n\
            {\n\
            \treturn float4(position, 1.0);\n\
            }\n\
            __hlsl__\n\
            pixel __hlsl__\n\
            float4 $main() : COLOR { return float4(1.0, 1.0, 1.0, 1.0); }\n\
            __hlsl__\n";
        Some(FragmentSource {
            text: text.to_string(),
            identity: ContentIdentity::new(reference, "demo"),
        })
    }
}

/// Pretend hardware compiler that needs at least sm_3_0.
struct PickyCompiler;

impl EffectCompiler for PickyCompiler {
    fn compile(
        &self,
        source: &str,
        _identity: &ContentIdentity,
    ) -> Result<CompiledEffect, CompileDiagnostic> {
        let profile: ShaderProfile = source
            .lines()
            .find_map(|l| l.strip_prefix("// target profile: "))
            .and_then(|name| name.parse().ok())
            .expect("generated source carries a profile header");
        println!("compiler: offered {profile}");

        if profile >= ShaderProfile::Sm3_0 {
            Ok(CompiledEffect {
                bytecode: source.as_bytes().to_vec(),
            })
        } else {
            Err(CompileDiagnostic {
                code: Some("X5608".to_string()),
                message: format!("too many arithmetic instruction slots for {profile}"),
            })
        }
    }
}

struct StdoutSink;

impl DiagnosticSink for StdoutSink {
    fn info(&self, message: &str) {
        println!("info: {message}");
    }
}

fn main() {
    let effect = parse_effect_str(
        "effect Demo;\n\
         technique Main {\n\
         \tpass P0 {\n\
         \t\tvertex \"passthrough.fragment\";\n\
         \t\tpixel \"passthrough.fragment\";\n\
         \t}\n\
         }\n",
    )
    .expect("parse failed");

    let identity = ContentIdentity::new("demo.effect", "demo");
    let symbol = link(&effect, &identity, &Passthrough).expect("link failed");
    println!("linked minimum profile: {}", symbol.min_profile);

    match negotiate(&symbol, &PickyCompiler, &StdoutSink) {
        Ok(output) => {
            println!(
                "accepted at {} ({} bytes of bytecode)",
                output.profile,
                output.artifact.bytecode.len()
            );
            println!("generated source: {}", output.generated_path.display());
        }
        Err(e) => eprintln!("negotiation failed: {e}"),
    }
}
