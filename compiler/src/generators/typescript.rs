use crate::{
    diagnostics::Diagnostics,
    error::KiwiError,
    types::{Definition, DefinitionKind},
    utils::{quote, to_camel_case},
};

use super::{CodeGenerator, GeneratorContext};

/// Emits TypeScript type declarations mirroring the schema.
pub struct TypeScriptGenerator;

fn map_type(type_name: &str) -> &str {
    match type_name {
        "bool" => "boolean",
        "byte" | "int" | "uint" | "float" => "number",
        "int64" | "uint64" => "bigint",
        "string" => "string",
        other => other,
    }
}

fn push_jsdoc(out: &mut Vec<String>, doc: &[String], indent: &str) {
    if doc.is_empty() {
        return;
    }
    out.push(format!("{}/**", indent));
    for line in doc {
        // A literal `*/` would close the comment early.
        out.push(format!("{} *{}", indent, line.replace("*/", "*\\/")));
    }
    out.push(format!("{} */", indent));
}

impl CodeGenerator for TypeScriptGenerator {
    fn generate(&self, ctx: &GeneratorContext<'_>, diagnostics: &mut Diagnostics) -> Result<Vec<u8>, KiwiError> {
        let schema = ctx.schema;
        let mut out = vec![format!("// Generated from {}.kiwi by kiwi-bridge. Do not edit.", ctx.file_stem), String::new()];

        let indent = match &schema.package {
            Some(package) => {
                out.push(format!("export namespace {} {{", package));
                "  "
            }
            None => "",
        };

        for definition in &schema.definitions {
            match definition.kind {
                DefinitionKind::Enum => generate_enum(&mut out, definition, indent),
                DefinitionKind::Struct | DefinitionKind::Message => {
                    generate_interface(&mut out, definition, indent, diagnostics)?
                }
            }
            out.push(String::new());
        }

        if ctx.options.service_stubs {
            for service in &schema.services {
                push_jsdoc(&mut out, &service.doc, indent);
                out.push(format!("{}export interface {} {{", indent, service.name));
                for method in &service.methods {
                    push_jsdoc(&mut out, &method.doc, &format!("{}  ", indent));
                    out.push(format!(
                        "{}  {}(request: {}): Promise<{}>;",
                        indent,
                        to_camel_case(&method.name),
                        method.request,
                        method.response
                    ));
                }
                out.push(format!("{}}}", indent));
                out.push(String::new());
            }
        }

        if schema.package.is_some() {
            out.push("}".to_string());
        }

        let mut code = out.join("\n");
        code.push('\n');
        Ok(code.into_bytes())
    }
}

/// Kiwi enums travel as their value names, so they become string unions.
fn generate_enum(out: &mut Vec<String>, definition: &Definition, indent: &str) {
    push_jsdoc(out, &definition.doc, indent);
    let values: Vec<String> = definition.fields.iter().map(|f| quote(&f.name)).collect();
    let union = if values.is_empty() { "never".to_string() } else { values.join(" | ") };
    out.push(format!("{}export type {} = {};", indent, definition.name, union));
}

fn generate_interface(
    out: &mut Vec<String>,
    definition: &Definition,
    indent: &str,
    diagnostics: &mut Diagnostics,
) -> Result<(), KiwiError> {
    let optional = if definition.kind == DefinitionKind::Message { "?" } else { "" };

    push_jsdoc(out, &definition.doc, indent);
    out.push(format!("{}export interface {} {{", indent, definition.name));
    for field in &definition.fields {
        let type_name = field.type_.as_deref().unwrap_or("string");
        if matches!(type_name, "int64" | "uint64") {
            diagnostics.warn(format!(
                "field {} in {} is emitted as bigint for TypeScript",
                quote(&field.name),
                quote(&definition.name)
            ))?;
        }
        let mut ts_type = map_type(type_name).to_string();
        if field.is_array {
            ts_type.push_str("[]");
        }

        push_jsdoc(out, &field.doc, &format!("{}  ", indent));
        if field.is_deprecated {
            out.push(format!("{}  /** @deprecated */", indent));
        }
        out.push(format!("{}  {}{}: {};", indent, field.name, optional, ts_type));
    }
    out.push(format!("{}}}", indent));
    Ok(())
}
