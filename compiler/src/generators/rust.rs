use crate::{
    diagnostics::Diagnostics,
    error::KiwiError,
    types::{Definition, DefinitionKind, Service},
    utils::{quote, to_pascal_case, to_snake_case},
};

use super::{push_doc, CodeGenerator, GeneratorContext};

/// Emits serde-ready Rust types, plus one trait per service in stub mode.
pub struct RustGenerator;

impl CodeGenerator for RustGenerator {
    fn generate(&self, ctx: &GeneratorContext<'_>, diagnostics: &mut Diagnostics) -> Result<Vec<u8>, KiwiError> {
        let code = compile_schema_to_rust(ctx, diagnostics)?;
        Ok(code.into_bytes())
    }
}

/// Strict and reserved keywords, including `gen` (reserved since 2024).
const RUST_KEYWORDS: [&str; 52] = [
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else",
    "enum", "extern", "false", "fn", "for", "if", "impl",
    "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "self", "Self", "static",
    "struct", "super", "trait", "true", "type", "unsafe",
    "use", "where", "while",
    "abstract", "become", "box", "do", "final", "gen", "macro", "override",
    "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Maps schema types to Rust types.
/// Message fields are optional, so they are wrapped in `Option<T>`.
fn map_type(type_name: &str, is_message: bool, is_array: bool) -> String {
    let rust_type = match type_name {
        "bool" => "bool".to_string(),
        "byte" => "u8".to_string(),
        "int" => "i32".to_string(),
        "uint" => "u32".to_string(),
        "float" => "f32".to_string(),
        "string" => "String".to_string(),
        "int64" => "i64".to_string(),
        "uint64" => "u64".to_string(),
        other => to_pascal_case(other),
    };

    let rust_type = if is_array { format!("Vec<{}>", rust_type) } else { rust_type };
    if is_message {
        format!("Option<{}>", rust_type)
    } else {
        rust_type
    }
}

/// Appends `_` to Rust keywords and reports the rename.
fn escape_rust_keyword(
    s: String,
    original: &str,
    owner: &str,
    diagnostics: &mut Diagnostics,
) -> Result<String, KiwiError> {
    if RUST_KEYWORDS.contains(&s.as_str()) {
        let escaped = format!("{}_", s);
        diagnostics.warn(format!(
            "{} in {} is a Rust keyword, emitted as {}",
            quote(original),
            quote(owner),
            quote(&escaped)
        ))?;
        Ok(escaped)
    } else {
        Ok(s)
    }
}

fn compile_schema_to_rust(ctx: &GeneratorContext<'_>, diagnostics: &mut Diagnostics) -> Result<String, KiwiError> {
    let schema = ctx.schema;
    let mut rust_code: Vec<String> = Vec::new();

    rust_code.push(format!("// Generated from {}.kiwi by kiwi-bridge. Do not edit.", ctx.file_stem));
    rust_code.push("".to_string());

    let indent = if let Some(name) = &schema.package {
        let module = escape_rust_keyword(to_snake_case(name), name, "package", diagnostics)?;
        rust_code.push(format!("pub mod {} {{", module));
        "    "
    } else {
        ""
    };

    rust_code.push(format!("{}use serde::{{Deserialize, Serialize}};", indent));
    rust_code.push("".to_string());

    for definition in &schema.definitions {
        let block = match definition.kind {
            DefinitionKind::Enum => generate_enum(definition, diagnostics)?,
            DefinitionKind::Struct => generate_struct(definition, false, diagnostics)?,
            DefinitionKind::Message => generate_struct(definition, true, diagnostics)?,
        };
        rust_code.extend(block.into_iter().map(|line| indent_line(indent, line)));
        rust_code.push("".to_string());
    }

    if ctx.options.service_stubs {
        for service in &schema.services {
            let block = generate_service(service, diagnostics)?;
            rust_code.extend(block.into_iter().map(|line| indent_line(indent, line)));
            rust_code.push("".to_string());
        }
    }

    if schema.package.is_some() {
        rust_code.push("}".to_string());
    }

    let mut code = rust_code.join("\n");
    code.push('\n');
    Ok(code)
}

fn indent_line(indent: &str, line: String) -> String {
    if line.is_empty() {
        line
    } else {
        format!("{}{}", indent, line)
    }
}

fn generate_enum(definition: &Definition, diagnostics: &mut Diagnostics) -> Result<Vec<String>, KiwiError> {
    let enum_name = to_pascal_case(&definition.name);
    let mut lines = Vec::new();

    push_doc(&mut lines, &definition.doc, "", "///");
    lines.push("#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]".to_string());
    lines.push("#[repr(i32)]".to_string());
    lines.push(format!("pub enum {} {{", enum_name));

    for field in &definition.fields {
        let variant_name = escape_rust_keyword(to_pascal_case(&field.name), &field.name, &definition.name, diagnostics)?;
        push_doc(&mut lines, &field.doc, "    ", "///");
        if variant_name != field.name {
            lines.push(format!("    #[serde(rename = {})]", quote(&field.name)));
        }
        lines.push(format!("    {} = {},", variant_name, field.reserved_index));
    }

    lines.push("}".to_string());
    Ok(lines)
}

/// Structs have every field; messages wrap each field in `Option<T>`.
fn generate_struct(definition: &Definition, is_message: bool, diagnostics: &mut Diagnostics) -> Result<Vec<String>, KiwiError> {
    let struct_name = to_pascal_case(&definition.name);
    let mut lines = Vec::new();

    push_doc(&mut lines, &definition.doc, "", "///");
    lines.push("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]".to_string());
    lines.push(format!("pub struct {} {{", struct_name));

    for field in &definition.fields {
        // Rust names are snake_case; serde keeps the schema name on the wire.
        let rust_field_name = escape_rust_keyword(to_snake_case(&field.name), &field.name, &definition.name, diagnostics)?;
        let field_type = map_type(field.type_.as_deref().unwrap_or("string"), is_message, field.is_array);

        push_doc(&mut lines, &field.doc, "    ", "///");
        if field.is_deprecated {
            lines.push("    #[deprecated]".to_string());
        }
        if rust_field_name != field.name {
            lines.push(format!("    #[serde(rename = {})]", quote(&field.name)));
        }
        if is_message {
            lines.push("    #[serde(default, skip_serializing_if = \"Option::is_none\")]".to_string());
        }
        lines.push(format!("    pub {}: {},", rust_field_name, field_type));
    }

    lines.push("}".to_string());
    Ok(lines)
}

fn generate_service(service: &Service, diagnostics: &mut Diagnostics) -> Result<Vec<String>, KiwiError> {
    let mut lines = Vec::new();

    push_doc(&mut lines, &service.doc, "", "///");
    lines.push(format!("pub trait {} {{", to_pascal_case(&service.name)));
    lines.push("    type Error;".to_string());

    for method in &service.methods {
        let method_name = escape_rust_keyword(to_snake_case(&method.name), &method.name, &service.name, diagnostics)?;
        lines.push("".to_string());
        push_doc(&mut lines, &method.doc, "    ", "///");
        lines.push(format!(
            "    fn {}(&self, request: {}) -> Result<{}, Self::Error>;",
            method_name,
            to_pascal_case(&method.request),
            to_pascal_case(&method.response)
        ));
    }

    lines.push("}".to_string());
    Ok(lines)
}
