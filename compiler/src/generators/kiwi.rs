use crate::{
    diagnostics::Diagnostics,
    error::KiwiError,
    types::{Definition, DefinitionKind, Service},
};

use super::{push_doc, CodeGenerator, GeneratorContext};

/// Re-emits the parsed schema as canonical Kiwi text.
///
/// Only `///` documentation survives; every other comment is gone by the time
/// the parser is done. The output parses back to the same schema.
pub struct KiwiGenerator;

impl CodeGenerator for KiwiGenerator {
    fn generate(&self, ctx: &GeneratorContext<'_>, _: &mut Diagnostics) -> Result<Vec<u8>, KiwiError> {
        let schema = ctx.schema;
        let mut blocks: Vec<Vec<String>> = Vec::new();

        if let Some(package) = &schema.package {
            blocks.push(vec![format!("package {};", package)]);
        }
        for definition in &schema.definitions {
            blocks.push(definition_block(definition));
        }
        for service in &schema.services {
            blocks.push(service_block(service));
        }

        let mut text = blocks
            .into_iter()
            .map(|block| block.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n");
        text.push('\n');
        Ok(text.into_bytes())
    }
}

fn keyword(kind: DefinitionKind) -> &'static str {
    match kind {
        DefinitionKind::Enum => "enum",
        DefinitionKind::Struct => "struct",
        DefinitionKind::Message => "message",
    }
}

fn definition_block(definition: &Definition) -> Vec<String> {
    let mut lines = Vec::new();
    push_doc(&mut lines, &definition.doc, "", "///");
    lines.push(format!("{} {} {{", keyword(definition.kind), definition.name));

    for field in &definition.fields {
        push_doc(&mut lines, &field.doc, "  ", "///");
        let line = match definition.kind {
            DefinitionKind::Enum => format!("  {} = {};", field.name, field.reserved_index),
            DefinitionKind::Struct | DefinitionKind::Message => {
                let mut type_name = field.type_.clone().unwrap_or_default();
                if field.is_array {
                    type_name.push_str("[]");
                }
                if definition.kind == DefinitionKind::Struct {
                    format!("  {} {};", type_name, field.name)
                } else if field.is_deprecated {
                    format!("  {} {} = {} [deprecated];", type_name, field.name, field.reserved_index)
                } else {
                    format!("  {} {} = {};", type_name, field.name, field.reserved_index)
                }
            }
        };
        lines.push(line);
    }

    lines.push("}".to_string());
    lines
}

fn service_block(service: &Service) -> Vec<String> {
    let mut lines = Vec::new();
    push_doc(&mut lines, &service.doc, "", "///");
    lines.push(format!("service {} {{", service.name));
    for method in &service.methods {
        push_doc(&mut lines, &method.doc, "  ", "///");
        lines.push(format!("  {}({}): {};", method.name, method.request, method.response));
    }
    lines.push("}".to_string());
    lines
}
