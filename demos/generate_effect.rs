//! Link an effect against in-memory fragments and print the generated
//! source for two different shader profiles.

use fxlink::{
    ContentIdentity, FragmentSource, FragmentSourceProvider, ShaderProfile, generate, link,
    parse_effect_str,
};

struct Library;

impl FragmentSourceProvider for Library {
    fn load_fragment_source(
        &self,
        reference: &str,
        _from: &ContentIdentity,
    ) -> Option<FragmentSource> {
        let text = match reference {
            "transform.fragment" => {
                "fragment Transform;\n\
                 param matrix wvp : WORLDVIEWPROJECTION;\n\
                 vertex __hlsl__\n\
                 float4 $main(float3 position : POSITION) : POSITION\n\
                 {\n\
                 \treturn mul(float4(position, 1.0), $wvp);\n\
                 }\n\
                 __hlsl__\n"
            }
            "tint.fragment" => {
                "fragment Tint;\n\
                 param float3 color = (1.0, 0.8, 0.6);\n\
                 pixel __hlsl__\n\
                 float4 $main() : COLOR\n\
                 {\n\
                 \treturn float4($color, 1.0);\n\
                 }\n\
                 __hlsl__\n"
            }
            _ => return None,
        };
        Some(FragmentSource {
            text: text.to_string(),
            identity: ContentIdentity::new(reference, "demo"),
        })
    }
}

fn main() {
    let effect = parse_effect_str(
        "effect Tinted;\n\
         param matrix world_view_proj : WORLDVIEWPROJECTION;\n\
         technique Main {\n\
         \tpass P0 {\n\
         \t\tvertex \"transform.fragment\" (wvp = world_view_proj);\n\
         \t\tpixel \"tint.fragment\";\n\
         \t}\n\
         }\n",
    )
    .expect("parse failed");

    let identity = ContentIdentity::new("tinted.effect", "demo");
    let symbol = link(&effect, &identity, &Library).expect("link failed");

    println!("Minimum profile: {}", symbol.min_profile);
    println!();
    println!("--- {} ---", ShaderProfile::Sm2_0);
    print!("{}", generate(&symbol, ShaderProfile::Sm2_0));
    println!();
    println!("--- {} ---", ShaderProfile::Sm4_0);
    print!("{}", generate(&symbol, ShaderProfile::Sm4_0));
}
