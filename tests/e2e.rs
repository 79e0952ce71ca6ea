//! End-to-end tests over real files: import from disk, resolve through
//! `DirectoryProvider`, and negotiate with a scripted compiler.

use std::fs;
use std::path::PathBuf;

use fxlink::{NullSink, ShaderProfile, import_effect, process};

mod common;

use common::ScriptedCompiler;

/// Fresh scratch directory for one test, removed on drop.
struct Scratch {
    root: PathBuf,
}

impl Scratch {
    fn new(name: &str) -> Self {
        let root = std::env::temp_dir().join(format!("fxlink-e2e-{name}-{}", std::process::id()));
        fs::create_dir_all(&root).expect("create scratch dir");
        Self { root }
    }

    fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.root.join(name);
        fs::write(&path, contents).expect("write scratch file");
        path
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

#[test]
fn trivial_effect_compiles_at_the_lowest_profile_without_retries() {
    let scratch = Scratch::new("trivial");
    scratch.file("transform.fragment", common::TRANSFORM_FRAGMENT);
    scratch.file("tint.fragment", common::TINT_FRAGMENT);
    let effect_path = scratch.file("trivial.effect", common::SIMPLE_EFFECT);

    let (effect, identity) = import_effect(&effect_path).expect("import failed");
    let compiler = ScriptedCompiler::succeeding_at(ShaderProfile::Sm1_1);
    let provider = fxlink::DirectoryProvider::new();

    let output =
        process(&effect, &identity, &provider, &compiler, &NullSink).expect("processing failed");

    assert_eq!(output.profile, ShaderProfile::Sm1_1);
    assert_eq!(*compiler.attempts.borrow(), vec![ShaderProfile::Sm1_1]);
    assert!(output.generated_path.exists());
}

#[test]
fn fragments_resolve_relative_to_the_effect_file() {
    let scratch = Scratch::new("relative");
    fs::create_dir_all(scratch.root.join("shared")).expect("create subdir");
    scratch.file("shared/transform.fragment", common::TRANSFORM_FRAGMENT);
    scratch.file("shared/tint.fragment", common::TINT_FRAGMENT);
    let effect_path = scratch.file(
        "relative.effect",
        "effect Relative;\ntechnique T { pass P {\n\
         \tvertex \"shared/transform.fragment\";\n\
         \tpixel \"shared/tint.fragment\";\n} }\n",
    );

    let (effect, identity) = import_effect(&effect_path).expect("import failed");
    let compiler = ScriptedCompiler::succeeding_at(ShaderProfile::Sm1_1);

    let output = process(
        &effect,
        &identity,
        &fxlink::DirectoryProvider::new(),
        &compiler,
        &NullSink,
    )
    .expect("processing failed");
    assert_eq!(output.profile, ShaderProfile::Sm1_1);
}

#[test]
fn search_paths_cover_out_of_tree_fragments() {
    let scratch = Scratch::new("searchpath");
    fs::create_dir_all(scratch.root.join("library")).expect("create subdir");
    scratch.file("library/transform.fragment", common::TRANSFORM_FRAGMENT);
    scratch.file("library/tint.fragment", common::TINT_FRAGMENT);
    let effect_path = scratch.file("searched.effect", common::SIMPLE_EFFECT);

    let (effect, identity) = import_effect(&effect_path).expect("import failed");
    let provider = fxlink::DirectoryProvider::new().with_search_path(scratch.root.join("library"));
    let compiler = ScriptedCompiler::succeeding_at(ShaderProfile::Sm1_1);

    let output =
        process(&effect, &identity, &provider, &compiler, &NullSink).expect("processing failed");
    assert_eq!(output.profile, ShaderProfile::Sm1_1);
}

#[test]
fn demanding_fragment_raises_the_negotiated_profile() {
    let scratch = Scratch::new("demanding");
    scratch.file(
        "transform.fragment",
        &common::fragment_with_profile("Transform", ShaderProfile::Sm3_0),
    );
    scratch.file("tint.fragment", common::TINT_FRAGMENT);
    let effect_path = scratch.file("demanding.effect", common::SIMPLE_EFFECT);

    let (effect, identity) = import_effect(&effect_path).expect("import failed");
    let compiler = ScriptedCompiler::succeeding_at(ShaderProfile::Sm1_1);

    let output = process(
        &effect,
        &identity,
        &fxlink::DirectoryProvider::new(),
        &compiler,
        &NullSink,
    )
    .expect("processing failed");
    // Linking starts negotiation at the fragment's declared profile.
    assert_eq!(output.profile, ShaderProfile::Sm3_0);
    assert_eq!(*compiler.attempts.borrow(), vec![ShaderProfile::Sm3_0]);
}

#[test]
fn import_error_carries_one_based_location() {
    let scratch = Scratch::new("importerr");
    let effect_path = scratch.file("broken.effect", "effect Broken\ntechnique T { }\n");

    let err = import_effect(&effect_path).unwrap_err();
    let message = err.to_string();
    // `technique` on line 2 is where the missing `;` is discovered.
    assert!(message.contains("(2,1)"), "unexpected message: {message}");
    assert!(message.contains("expected `;`"), "unexpected message: {message}");
}

#[test]
fn missing_file_reports_io_error() {
    let err = import_effect(std::path::Path::new("/nonexistent/nowhere.effect")).unwrap_err();
    assert!(matches!(err, fxlink::ImportError::Io { .. }));
}
