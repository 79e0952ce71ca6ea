//! CLI tool to validate fragment-linking sources and inspect the
//! generated effect code.

use std::path::Path;
use std::process::ExitCode;

use fxlink::{DirectoryProvider, ShaderProfile, generate, import_effect, import_fragment, link};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        eprintln!("Usage: fxlink <command> [args...]");
        eprintln!();
        eprintln!("Commands:");
        eprintln!("  validate <files...>           Check effect/fragment files for errors");
        eprintln!("  generate <effect> [profile]   Link an effect and print generated code");
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  fxlink validate bloom.effect transform.fragment");
        eprintln!("  fxlink generate bloom.effect sm_3_0");
        return ExitCode::from(2);
    }

    match args[1].as_str() {
        "validate" => validate(&args[2..]),
        "generate" => generate_cmd(&args[2..]),
        other => {
            eprintln!("Unknown command: {other}");
            ExitCode::from(2)
        }
    }
}

fn validate(files: &[String]) -> ExitCode {
    if files.is_empty() {
        eprintln!("Error: no files specified");
        return ExitCode::from(2);
    }

    let mut had_error = false;

    for path in files {
        if Path::new(path).extension().is_some_and(|e| e == "fragment") {
            match import_fragment(Path::new(path)) {
                Ok((fragment, _)) => {
                    eprintln!(
                        "{path}: valid fragment `{}` (profile {}, {} parameter(s))",
                        fragment.name,
                        fragment.profile,
                        fragment.params.len()
                    );
                }
                Err(e) => {
                    eprintln!("{e}");
                    had_error = true;
                }
            }
        } else {
            match import_effect(Path::new(path)) {
                Ok((effect, _)) => {
                    eprintln!(
                        "{path}: valid effect `{}` ({} technique(s), {} parameter(s))",
                        effect.name,
                        effect.techniques.len(),
                        effect.params.len()
                    );
                }
                Err(e) => {
                    eprintln!("{e}");
                    had_error = true;
                }
            }
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn generate_cmd(args: &[String]) -> ExitCode {
    let Some(path) = args.first() else {
        eprintln!("Error: no effect file specified");
        return ExitCode::from(2);
    };

    let requested: Option<ShaderProfile> = match args.get(1) {
        None => None,
        Some(name) => match name.parse() {
            Ok(profile) => Some(profile),
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::from(2);
            }
        },
    };

    let (effect, identity) = match import_effect(Path::new(path)) {
        Ok(imported) => imported,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let provider = DirectoryProvider::new();
    let symbol = match link(&effect, &identity, &provider) {
        Ok(symbol) => symbol,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let profile = match requested {
        None => symbol.min_profile,
        Some(profile) if profile >= symbol.min_profile => profile,
        Some(profile) => {
            eprintln!(
                "{path}: requested profile {profile} is below the effect's minimum {}",
                symbol.min_profile
            );
            return ExitCode::FAILURE;
        }
    };

    print!("{}", generate(&symbol, profile));
    ExitCode::SUCCESS
}
