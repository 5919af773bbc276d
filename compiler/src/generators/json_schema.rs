use serde_json::{json, Map, Value};

use crate::{
    diagnostics::Diagnostics,
    error::KiwiError,
    types::{Definition, DefinitionKind, Field},
};

use super::{CodeGenerator, GeneratorContext};

const DRAFT: &str = "http://json-schema.org/draft-07/schema#";

/// Emits a draft-07 JSON Schema document with one entry per definition.
pub struct JsonSchemaGenerator;

impl CodeGenerator for JsonSchemaGenerator {
    fn generate(&self, ctx: &GeneratorContext<'_>, _: &mut Diagnostics) -> Result<Vec<u8>, KiwiError> {
        let schema = ctx.schema;

        let mut definitions = Map::new();
        for definition in &schema.definitions {
            definitions.insert(definition.name.clone(), definition_schema(definition));
        }

        let mut document = Map::new();
        document.insert("$schema".to_string(), json!(DRAFT));
        let title = schema.package.as_deref().unwrap_or(ctx.file_stem);
        document.insert("title".to_string(), json!(title));
        document.insert("definitions".to_string(), Value::Object(definitions));

        let mut text = serde_json::to_string_pretty(&Value::Object(document))
            .map_err(|e| KiwiError::GeneratorRuntime(format!("unable to render JSON Schema: {}", e)))?;
        text.push('\n');
        Ok(text.into_bytes())
    }
}

fn description(doc: &[String]) -> Option<Value> {
    if doc.is_empty() {
        return None;
    }
    let lines: Vec<&str> = doc.iter().map(|line| line.trim()).collect();
    Some(json!(lines.join("\n")))
}

fn definition_schema(definition: &Definition) -> Value {
    let mut object = match definition.kind {
        DefinitionKind::Enum => {
            let values: Vec<&str> = definition.fields.iter().map(|f| f.name.as_str()).collect();
            let mut object = Map::new();
            object.insert("type".to_string(), json!("string"));
            object.insert("enum".to_string(), json!(values));
            object
        }
        DefinitionKind::Struct | DefinitionKind::Message => {
            let mut properties = Map::new();
            for field in &definition.fields {
                properties.insert(field.name.clone(), field_schema(field));
            }

            let mut object = Map::new();
            object.insert("type".to_string(), json!("object"));
            object.insert("properties".to_string(), Value::Object(properties));
            // Every struct field is always present on the wire.
            if definition.kind == DefinitionKind::Struct {
                let required: Vec<&str> = definition.fields.iter().map(|f| f.name.as_str()).collect();
                object.insert("required".to_string(), json!(required));
            }
            object.insert("additionalProperties".to_string(), json!(false));
            object
        }
    };

    if let Some(text) = description(&definition.doc) {
        object.insert("description".to_string(), text);
    }
    Value::Object(object)
}

fn field_schema(field: &Field) -> Value {
    let item = match field.type_.as_deref().unwrap_or("string") {
        "bool" => json!({ "type": "boolean" }),
        "byte" => json!({ "type": "integer", "minimum": 0, "maximum": 255 }),
        "uint" | "uint64" => json!({ "type": "integer", "minimum": 0 }),
        "int" | "int64" => json!({ "type": "integer" }),
        "float" => json!({ "type": "number" }),
        "string" => json!({ "type": "string" }),
        other => json!({ "$ref": format!("#/definitions/{}", other) }),
    };

    let mut value = if field.is_array { json!({ "type": "array", "items": item }) } else { item };

    if let Value::Object(object) = &mut value {
        if let Some(text) = description(&field.doc) {
            object.insert("description".to_string(), text);
        }
        if field.is_deprecated {
            object.insert("deprecated".to_string(), json!(true));
        }
    }
    value
}
