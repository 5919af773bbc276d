//! Output generators and the registry the dispatcher selects them from.
//!
//! Every generator turns one parsed [`Schema`] into the bytes of one output
//! file. The registry is an ordinary value: the dispatcher builds a fresh one
//! for every call, so nothing here is shared between concurrent runs.

pub mod binary;
pub mod json_schema;
pub mod kiwi;
pub mod rust;
pub mod typescript;

use crate::{diagnostics::Diagnostics, error::KiwiError, types::Schema};

/// Long flags owned by the dispatcher itself.
pub const RESERVED_LONG_FLAGS: [&str; 7] = [
    "out", "service", "no-warnings", "warnings-as-errors", "strict-naming", "help", "version",
];
/// Short flags owned by the dispatcher itself.
pub const RESERVED_SHORT_FLAGS: [char; 3] = ['o', 'h', 'V'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Binary,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Also emit service stubs for targets that support them.
    pub service_stubs: bool,
}

pub struct GeneratorContext<'a> {
    pub schema:    &'a Schema,
    /// File name of the input schema without its extension.
    pub file_stem: &'a str,
    pub options:   &'a GenerateOptions,
}

pub trait CodeGenerator {
    fn generate(&self, ctx: &GeneratorContext<'_>, diagnostics: &mut Diagnostics) -> Result<Vec<u8>, KiwiError>;
}

pub struct GeneratorRegistration {
    pub short:                 Option<char>,
    pub long:                  &'static str,
    pub name:                  &'static str,
    pub requires_valid_schema: bool,
    pub format:                OutputFormat,
    /// Appended to the input file stem to name the output file.
    pub suffix:                &'static str,
    pub emitter:               Box<dyn CodeGenerator>,
}

impl GeneratorRegistration {
    pub fn output_file_name(&self, file_stem: &str) -> String {
        format!("{}{}", file_stem, self.suffix)
    }
}

#[derive(Default)]
pub struct GeneratorRegistry {
    registrations: Vec<GeneratorRegistration>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        GeneratorRegistry::default()
    }

    /// The generators shipped with this crate, in the order they run.
    pub fn builtin() -> Result<Self, KiwiError> {
        let mut registry = GeneratorRegistry::new();
        registry.register(GeneratorRegistration {
            short:                 Some('b'),
            long:                  "binary",
            name:                  "binary schema",
            requires_valid_schema: true,
            format:                OutputFormat::Binary,
            suffix:                ".bkfs",
            emitter:               Box::new(binary::BinaryGenerator),
        })?;
        registry.register(GeneratorRegistration {
            short:                 Some('r'),
            long:                  "rust",
            name:                  "Rust types",
            requires_valid_schema: true,
            format:                OutputFormat::Text,
            suffix:                "_generated.rs",
            emitter:               Box::new(rust::RustGenerator),
        })?;
        registry.register(GeneratorRegistration {
            short:                 Some('T'),
            long:                  "ts",
            name:                  "TypeScript declarations",
            requires_valid_schema: true,
            format:                OutputFormat::Text,
            suffix:                "_generated.ts",
            emitter:               Box::new(typescript::TypeScriptGenerator),
        })?;
        registry.register(GeneratorRegistration {
            short:                 None,
            long:                  "jsonschema",
            name:                  "JSON Schema",
            requires_valid_schema: true,
            format:                OutputFormat::Text,
            suffix:                ".schema.json",
            emitter:               Box::new(json_schema::JsonSchemaGenerator),
        })?;
        registry.register(GeneratorRegistration {
            short:                 None,
            long:                  "kiwi",
            name:                  "normalized Kiwi schema text",
            requires_valid_schema: false,
            format:                OutputFormat::Text,
            suffix:                "_normalized.kiwi",
            emitter:               Box::new(kiwi::KiwiGenerator),
        })?;
        Ok(registry)
    }

    /// Adds a generator. Flags must be unique across the registry and must not
    /// shadow the dispatcher's own options.
    pub fn register(&mut self, registration: GeneratorRegistration) -> Result<(), KiwiError> {
        if RESERVED_LONG_FLAGS.contains(&registration.long) {
            return Err(KiwiError::State(format!(
                "generator flag --{} is reserved",
                registration.long
            )));
        }
        if let Some(short) = registration.short {
            if RESERVED_SHORT_FLAGS.contains(&short) {
                return Err(KiwiError::State(format!("generator flag -{} is reserved", short)));
            }
        }
        for existing in &self.registrations {
            let same_short = registration.short.is_some() && existing.short == registration.short;
            if existing.long == registration.long || same_short {
                return Err(KiwiError::State(format!(
                    "generator flags of {} collide with {}",
                    registration.name, existing.name
                )));
            }
        }
        self.registrations.push(registration);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneratorRegistration> {
        self.registrations.iter()
    }

    pub fn get(&self, long: &str) -> Option<&GeneratorRegistration> {
        self.registrations.iter().find(|r| r.long == long)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

/// Writes documentation lines with the given comment prefix.
pub(crate) fn push_doc(out: &mut Vec<String>, doc: &[String], indent: &str, prefix: &str) {
    for line in doc {
        out.push(format!("{}{}{}", indent, prefix, line));
    }
}
