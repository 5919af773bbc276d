//! Command-line style driver for the generators.
//!
//! The host hands over a flat argument list (flags and schema paths, no
//! program name). Options are parsed with a clap command built from the
//! generator registry, every input file is parsed once and every selected
//! generator writes one output file next to the others in the output
//! directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{error::ErrorKind, Arg, ArgAction, ArgMatches, Command};
use tracing::{debug, info};

use crate::{
    diagnostics::Diagnostics,
    error::KiwiError,
    generators::{GenerateOptions, GeneratorContext, GeneratorRegistry},
    loader::read_schema_text,
    parser::{parse_schema_with, ParserOptions, WarningKind},
    tokenizer::tokenize_schema,
    verifier::verify_schema,
};

/// Placeholder for argv[0], which hosts never pass.
pub const PROGRAM_NAME: &str = "kiwi-bridge";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Long flags of the selected generators, in registry order.
    pub generators:         Vec<&'static str>,
    pub out_dir:            PathBuf,
    pub service_stubs:      bool,
    pub no_warnings:        bool,
    pub warnings_as_errors: bool,
    /// Report field naming warnings instead of filtering them.
    pub strict_naming:      bool,
    pub files:              Vec<PathBuf>,
}

#[derive(Debug)]
enum Parsed {
    Run(DispatchOptions),
    /// Help or version was printed.
    Exit(i32),
}

/// The clap command for a registry: one switch per generator plus the
/// dispatcher's own options.
pub fn command(registry: &GeneratorRegistry) -> Command {
    let mut command = Command::new(PROGRAM_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate code from Kiwi schema files")
        .arg(
            Arg::new("out")
                .short('o')
                .long("out")
                .value_name("DIR")
                .default_value(".")
                .help("Directory the generated files are written to"),
        )
        .arg(
            Arg::new("service")
                .long("service")
                .action(ArgAction::SetTrue)
                .help("Also emit service stubs where the target supports them"),
        )
        .arg(
            Arg::new("no-warnings")
                .long("no-warnings")
                .action(ArgAction::SetTrue)
                .help("Do not print warnings"),
        )
        .arg(
            Arg::new("warnings-as-errors")
                .long("warnings-as-errors")
                .action(ArgAction::SetTrue)
                .help("Fail on the first warning"),
        )
        .arg(
            Arg::new("strict-naming")
                .long("strict-naming")
                .action(ArgAction::SetTrue)
                .help("Report field naming convention warnings"),
        );

    for registration in registry.iter() {
        let mut arg = Arg::new(registration.long)
            .long(registration.long)
            .action(ArgAction::SetTrue)
            .help(format!("Generate {}", registration.name));
        if let Some(short) = registration.short {
            arg = arg.short(short);
        }
        command = command.arg(arg);
    }

    command.arg(
        Arg::new("files")
            .value_name("FILES")
            .num_args(0..)
            .action(ArgAction::Append)
            .help("Schema files to process"),
    )
}

fn parse_options<S: AsRef<str>>(registry: &GeneratorRegistry, args: &[S]) -> Result<Parsed, KiwiError> {
    let argv = std::iter::once(PROGRAM_NAME).chain(args.iter().map(|a| a.as_ref()));

    let matches: ArgMatches = match command(registry).try_get_matches_from(argv) {
        Ok(matches) => matches,
        Err(e) => {
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    e.print()?;
                    Ok(Parsed::Exit(0))
                }
                _ => Err(KiwiError::GeneratorOption(e.to_string())),
            };
        }
    };

    let files: Vec<PathBuf> = matches
        .get_many::<String>("files")
        .map(|values| values.map(PathBuf::from).collect())
        .unwrap_or_default();
    if files.is_empty() {
        return Err(KiwiError::GeneratorOption("missing input files".to_string()));
    }

    let generators = registry
        .iter()
        .filter(|r| matches.get_flag(r.long))
        .map(|r| r.long)
        .collect();

    let out_dir = matches
        .get_one::<String>("out")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(Parsed::Run(DispatchOptions {
        generators,
        out_dir,
        service_stubs: matches.get_flag("service"),
        no_warnings: matches.get_flag("no-warnings"),
        warnings_as_errors: matches.get_flag("warnings-as-errors"),
        strict_naming: matches.get_flag("strict-naming"),
        files,
    }))
}

/// Parses `args` and runs the selected generators. Returns the process exit
/// code; every failure is an error value.
pub fn run<S: AsRef<str>>(args: &[S]) -> Result<i32, KiwiError> {
    let registry = GeneratorRegistry::builtin()?;
    match parse_options(&registry, args)? {
        Parsed::Exit(code) => Ok(code),
        Parsed::Run(options) => {
            compile(&registry, &options)?;
            Ok(0)
        }
    }
}

/// Processes every input file with the selected generators.
pub fn compile(registry: &GeneratorRegistry, options: &DispatchOptions) -> Result<(), KiwiError> {
    let mut diagnostics = Diagnostics::new(options.no_warnings, options.warnings_as_errors);
    let generate_options = GenerateOptions { service_stubs: options.service_stubs };

    let selected: Vec<_> = registry
        .iter()
        .filter(|r| options.generators.contains(&r.long))
        .collect();
    let needs_verification = selected.is_empty() || selected.iter().any(|r| r.requires_valid_schema);

    if !selected.is_empty() {
        // Output names derive from the file stem alone.
        let mut stems: HashMap<String, &Path> = HashMap::new();
        for path in &options.files {
            if let Some(previous) = stems.insert(file_stem(path), path) {
                return Err(KiwiError::GeneratorOption(format!(
                    "input files {} and {} would write the same output files",
                    previous.display(),
                    path.display()
                )));
            }
        }
        fs::create_dir_all(&options.out_dir)?;
    }

    for path in &options.files {
        let in_schema = |e: KiwiError| e.in_schema(path);
        let text = read_schema_text(path)?;

        let tokens = tokenize_schema(&text).map_err(in_schema)?;
        let parsed = parse_schema_with(&tokens, &ParserOptions { retain_doc_comments: true }).map_err(in_schema)?;
        for warning in &parsed.warnings {
            if warning.kind == WarningKind::NamingConvention && !options.strict_naming {
                continue;
            }
            diagnostics.warn(format!(
                "{}:{}:{}: {}",
                path.display(),
                warning.line,
                warning.column,
                warning.message
            ))?;
        }

        if needs_verification {
            verify_schema(&parsed.schema).map_err(in_schema)?;
        }
        debug!(path = %path.display(), definitions = parsed.schema.definitions.len(), "schema parsed");

        let file_stem = file_stem(path);
        let ctx = GeneratorContext {
            schema:    &parsed.schema,
            file_stem: &file_stem,
            options:   &generate_options,
        };

        for registration in &selected {
            let output = registration.emitter.generate(&ctx, &mut diagnostics)?;
            let target = options.out_dir.join(registration.output_file_name(&file_stem));
            fs::write(&target, &output)?;
            info!(
                generator = registration.name,
                format = ?registration.format,
                path = %target.display(),
                size = output.len(),
                "wrote generated file"
            );
        }
    }

    Ok(())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "schema".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SCHEMA: &str = "message Req { int a = 1; }\nmessage Resp { int b = 1; }\nservice Greeter { SayHello(Req): Resp; }\n";

    fn schema_file(dir: &TempDir, name: &str, text: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        path.display().to_string()
    }

    #[test]
    fn options_from_arguments() {
        let registry = GeneratorRegistry::builtin().unwrap();
        let parsed = parse_options(&registry, &["--ts", "-r", "-o", "out", "--service", "a.kiwi", "b.kiwi"]).unwrap();
        let Parsed::Run(options) = parsed else { panic!("expected options") };

        // Registry order, not argument order.
        assert_eq!(options.generators, vec!["rust", "ts"]);
        assert_eq!(options.out_dir, PathBuf::from("out"));
        assert!(options.service_stubs);
        assert!(!options.strict_naming);
        assert_eq!(options.files, vec![PathBuf::from("a.kiwi"), PathBuf::from("b.kiwi")]);
    }

    #[test]
    fn missing_input_files() {
        let err = run::<&str>(&[]).unwrap_err();
        assert!(matches!(err, KiwiError::GeneratorOption(_)));
        assert_eq!(err.to_string(), "missing input files");

        assert!(run(&["--rust"]).is_err());
    }

    #[test]
    fn unknown_flags_are_option_errors() {
        match run(&["--cobol", "a.kiwi"]) {
            Err(KiwiError::GeneratorOption(msg)) => assert!(msg.contains("--cobol")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn version_exits_with_zero() {
        assert_eq!(run(&["--version"]).unwrap(), 0);
    }

    #[test]
    fn writes_one_file_per_generator() {
        let dir = TempDir::new().unwrap();
        let input = schema_file(&dir, "greeter.kiwi", SCHEMA);
        let out = dir.path().join("gen");

        let code = run(&["--rust", "--ts", "--service", "-o", out.to_str().unwrap(), &input]).unwrap();
        assert_eq!(code, 0);

        let rust = fs::read_to_string(out.join("greeter_generated.rs")).unwrap();
        assert!(rust.contains("pub trait Greeter {"));
        let ts = fs::read_to_string(out.join("greeter_generated.ts")).unwrap();
        assert!(ts.contains("sayHello(request: Req): Promise<Resp>;"));
    }

    #[test]
    fn no_generator_still_verifies() {
        let dir = TempDir::new().unwrap();
        let good = schema_file(&dir, "good.kiwi", SCHEMA);
        assert_eq!(run(&[good.as_str()]).unwrap(), 0);

        let bad = schema_file(&dir, "bad.kiwi", "struct P { Missing m; }");
        let err = run(&[bad.as_str()]).unwrap_err();
        assert!(matches!(err.innermost(), KiwiError::VerifierError(_)));
        assert!(err.to_string().starts_with(&format!("{}: ", bad)));
    }

    #[test]
    fn kiwi_output_does_not_need_a_valid_schema() {
        let dir = TempDir::new().unwrap();
        let input = schema_file(&dir, "broken.kiwi", "struct P { Missing m; }");
        let out = dir.path().to_str().unwrap().to_string();

        assert_eq!(run(&["--kiwi", "-o", &out, &input]).unwrap(), 0);
        let text = fs::read_to_string(dir.path().join("broken_normalized.kiwi")).unwrap();
        assert!(text.contains("Missing m;"));

        assert!(run(&["--kiwi", "--rust", "-o", &out, &input]).is_err());
    }

    #[test]
    fn naming_warnings_need_strict_naming_to_fail() {
        let dir = TempDir::new().unwrap();
        let input = schema_file(&dir, "names.kiwi", "message M { int clientID = 1; }");
        let out = dir.path().to_str().unwrap().to_string();

        assert_eq!(run(&["--binary", "--warnings-as-errors", "-o", &out, &input]).unwrap(), 0);
        match run(&["--binary", "--warnings-as-errors", "--strict-naming", "-o", &out, &input]) {
            Err(KiwiError::GeneratorRuntime(msg)) => {
                assert!(msg.contains("names.kiwi:1:17: field names should be lowercase snake_case, got: clientID"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn generator_warnings_as_errors() {
        let dir = TempDir::new().unwrap();
        let input = schema_file(&dir, "kw.kiwi", "message M { int type = 1; }");
        let out = dir.path().to_str().unwrap().to_string();

        assert_eq!(run(&["--rust", "--no-warnings", "-o", &out, &input]).unwrap(), 0);
        assert!(matches!(
            run(&["--rust", "--warnings-as-errors", "-o", &out, &input]),
            Err(KiwiError::GeneratorRuntime(_))
        ));
    }

    #[test]
    fn inputs_sharing_a_file_stem_are_rejected() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        let first = schema_file(&dir, "a/greeter.kiwi", SCHEMA);
        let second = schema_file(&dir, "b/greeter.kiwi", SCHEMA);
        let out = dir.path().join("gen");

        match run(&["--rust", "-o", out.to_str().unwrap(), &first, &second]) {
            Err(KiwiError::GeneratorOption(msg)) => {
                assert!(msg.contains(&first) && msg.contains(&second), "{}", msg)
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(!out.join("greeter_generated.rs").exists());

        // Nothing is written without a generator, so the check does not apply.
        assert_eq!(run(&[first.as_str(), second.as_str()]).unwrap(), 0);
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = TempDir::new().unwrap();
        let input = schema_file(&dir, "broken.kiwi", "struct P { int x }");
        let err = run(&["--rust", "-o", dir.path().to_str().unwrap(), &input]).unwrap_err();
        assert!(matches!(err.innermost(), KiwiError::ParseError { line: 1, .. }));
        assert!(err.to_string().starts_with(&format!("{}: Parse error at line 1", input)));
    }

    #[test]
    fn unreadable_input_is_a_load_error() {
        let err = run(&["--rust", "/no/such/schema.kiwi"]).unwrap_err();
        assert_eq!(err.to_string(), "unable to load file: /no/such/schema.kiwi");
    }
}
