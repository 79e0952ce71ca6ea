//! Renders a linked `EffectSymbol` into target shading-language source
//! for one shader profile.
//!
//! Generation is a pure function of its inputs: the same symbol and
//! profile always produce byte-identical text, because the output is
//! persisted for inspection and has to be reproducible.

use std::fmt::Write as _;

use crate::ast::{Param, ParamValue, Stage};
use crate::linker::{EffectSymbol, FragmentInstance, PassSymbol};
use crate::profile::ShaderProfile;

/// Generate shading-language source for `symbol` targeting `profile`.
///
/// Precondition: `profile >= symbol.min_profile`. The negotiator never
/// selects a lower candidate, so this is not re-checked here.
#[must_use]
pub fn generate(symbol: &EffectSymbol, profile: ShaderProfile) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "// Generated by fxlink from effect `{}`. Do not edit.", symbol.name);
    let _ = writeln!(out, "// target profile: {profile}");
    out.push('\n');

    for param in &symbol.params {
        write_param(&mut out, &param.name, param);
    }
    if !symbol.params.is_empty() {
        out.push('\n');
    }

    for instance in instances(symbol) {
        write_instance(&mut out, instance);
    }

    for technique in &symbol.techniques {
        let _ = writeln!(out, "{} {}", profile.technique_keyword(), technique.name);
        out.push_str("{\n");
        for pass in &technique.passes {
            write_pass(&mut out, pass, profile);
        }
        out.push_str("}\n");
    }

    out
}

/// Every fragment instance in effect declaration order: techniques
/// first-declared first, passes in file order, vertex before pixel.
fn instances(symbol: &EffectSymbol) -> impl Iterator<Item = &FragmentInstance> {
    symbol.techniques.iter().flat_map(|technique| {
        technique.passes.iter().flat_map(|pass| {
            Stage::ALL
                .into_iter()
                .flat_map(|stage| pass.stage_instances(stage).iter())
        })
    })
}

fn write_param(out: &mut String, name: &str, param: &Param) {
    let _ = write!(out, "{} {name}", param.ty.hlsl_name());
    if let Some(semantic) = &param.semantic {
        let _ = write!(out, " : {semantic}");
    }
    if let Some(default) = &param.default {
        match default {
            ParamValue::Scalar(value) => {
                let _ = write!(out, " = {value}");
            }
            ParamValue::Vector(components) => {
                let _ = write!(
                    out,
                    " = {}({})",
                    param.ty.hlsl_name(),
                    components.join(", ")
                );
            }
        }
    }
    out.push_str(";\n");
}

fn write_instance(out: &mut String, instance: &FragmentInstance) {
    let _ = writeln!(
        out,
        "// fragment {} (\"{}\")",
        instance.fragment_name, instance.reference
    );

    // Unbound parameters become globals in the instance's scope; bound
    // ones resolve to the effect's own globals during substitution.
    for param in &instance.params {
        if instance.binding_for(&param.name).is_none() {
            let scoped = format!("{}_{}", instance.scope, param.name);
            write_param(out, &scoped, param);
        }
    }

    out.push_str(&substitute(&instance.code, instance));
    out.push_str("\n\n");
}

/// Replace each `$name` placeholder: bound parameters substitute to
/// the bound effect parameter, everything else gets the instance's
/// scope prefix. A `$` not followed by an identifier is kept as-is.
fn substitute(code: &str, instance: &FragmentInstance) -> String {
    let bytes = code.as_bytes();
    let mut out = String::with_capacity(code.len());
    // Regions between placeholders are copied as str slices, so
    // multi-byte characters in the code pass through untouched.
    let mut copied = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] == b'$'
            && pos + 1 < bytes.len()
            && (bytes[pos + 1].is_ascii_alphabetic() || bytes[pos + 1] == b'_')
        {
            out.push_str(&code[copied..pos]);
            let start = pos + 1;
            let mut end = start;
            while end < bytes.len()
                && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
            {
                end += 1;
            }
            let name = &code[start..end];
            match instance.binding_for(name) {
                Some(target) => out.push_str(target),
                None => {
                    out.push_str(&instance.scope);
                    out.push('_');
                    out.push_str(name);
                }
            }
            pos = end;
            copied = end;
        } else {
            pos += 1;
        }
    }
    out.push_str(&code[copied..]);

    out
}

fn write_pass(out: &mut String, pass: &PassSymbol, profile: ShaderProfile) {
    let _ = writeln!(out, "\tpass {}", pass.name);
    out.push_str("\t{\n");

    // The last fragment referenced for a stage provides the entry
    // point via its scoped `$main`.
    let vertex_entry = pass.vertex.last().map(|i| format!("{}_main", i.scope));
    let pixel_entry = pass.pixel.last().map(|i| format!("{}_main", i.scope));

    if profile.uses_compile_shader_syntax() {
        if let Some(entry) = vertex_entry {
            let _ = writeln!(
                out,
                "\t\tSetVertexShader(CompileShader({}, {entry}()));",
                profile.vertex_target()
            );
        }
        out.push_str("\t\tSetGeometryShader(NULL);\n");
        if let Some(entry) = pixel_entry {
            let _ = writeln!(
                out,
                "\t\tSetPixelShader(CompileShader({}, {entry}()));",
                profile.pixel_target()
            );
        }
    } else {
        if let Some(entry) = vertex_entry {
            let _ = writeln!(
                out,
                "\t\tVertexShader = compile {} {entry}();",
                profile.vertex_target()
            );
        }
        if let Some(entry) = pixel_entry {
            let _ = writeln!(
                out,
                "\t\tPixelShader = compile {} {entry}();",
                profile.pixel_target()
            );
        }
    }

    out.push_str("\t}\n");
}
