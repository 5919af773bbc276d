use std::collections::HashMap;

use kiwi_bridge_wire::{WireReader, WireWriter};
use crate::{
    types::{Definition, DefinitionKind, Field, Method, Schema, Service},
    verifier::{verify_schema, NATIVE_TYPES},
    tokenizer::tokenize_schema,
    parser::{parse_schema_with, ParseWarning, ParserOptions},
    error::KiwiError,
};

/// Leading bytes of every binary schema.
pub const BINARY_SCHEMA_IDENTIFIER: &[u8; 4] = b"BKWS";
pub const BINARY_SCHEMA_VERSION: u8 = 1;

const FLAG_ARRAY: u8 = 1;
const FLAG_DEPRECATED: u8 = 2;

/// A verified schema, its binary encoding and the warnings seen on the way.
#[derive(Debug)]
pub struct CompiledSchema {
    pub schema:   Schema,
    pub binary:   Vec<u8>,
    pub warnings: Vec<ParseWarning>,
}

/// Compile a textual schema into `(Schema, Vec<u8>)`.
/// Returns `Err(KiwiError)` if tokenization/parsing/verification fails.
pub fn compile_schema(text: &str) -> Result<(Schema, Vec<u8>), KiwiError> {
    let compiled = compile_schema_with(text, &ParserOptions::default())?;
    Ok((compiled.schema, compiled.binary))
}

pub fn compile_schema_with(text: &str, options: &ParserOptions) -> Result<CompiledSchema, KiwiError> {
    let tokens = tokenize_schema(text)?;
    let parsed = parse_schema_with(&tokens, options)?;
    verify_schema(&parsed.schema)?;
    let binary = encode_binary_schema(&parsed.schema)?;
    Ok(CompiledSchema {
        schema:   parsed.schema,
        binary,
        warnings: parsed.warnings,
    })
}

fn decode_err(what: &str) -> impl Fn(kiwi_bridge_wire::WireError) -> KiwiError + '_ {
    move |e| KiwiError::DecodeError(format!("Failed to read {}: {}", what, e))
}

fn write_doc(writer: &mut WireWriter, doc: &[String]) {
    writer.write_var_uint(doc.len() as u32);
    for line in doc {
        writer.write_string(&line.replace('\0', ""));
    }
}

fn read_doc(bb: &mut WireReader<'_>) -> Result<Vec<String>, KiwiError> {
    let count = bb.read_var_uint().map_err(decode_err("doc line count"))?;
    let mut doc = Vec::with_capacity((count as usize).min(1024));
    for _ in 0..count {
        doc.push(bb.read_string().map_err(decode_err("doc line"))?.into_owned());
    }
    Ok(doc)
}

/// Encode a `Schema` into bytes. Returns `Err(KiwiError::EncodeError)` if any
/// field or method refers to a type that is neither native nor defined.
pub fn encode_binary_schema(schema: &Schema) -> Result<Vec<u8>, KiwiError> {
    let mut writer = WireWriter::new();
    writer.write_bytes(BINARY_SCHEMA_IDENTIFIER);
    writer.write_byte(BINARY_SCHEMA_VERSION);
    writer.write_string(schema.package.as_deref().unwrap_or(""));

    let definition_index_map: HashMap<&str, usize> = schema
        .definitions
        .iter()
        .enumerate()
        .map(|(i, def)| (def.name.as_str(), i))
        .collect();

    writer.write_var_uint(schema.definitions.len() as u32);
    for def in &schema.definitions {
        writer.write_string(&def.name);
        writer.write_byte(def.kind as u8);
        write_doc(&mut writer, &def.doc);

        writer.write_var_uint(def.fields.len() as u32);
        for field in &def.fields {
            writer.write_string(&field.name);

            // Negative for native types, the definition index otherwise.
            let type_num: i32 = if def.kind == DefinitionKind::Enum {
                0
            } else if let Some(ref type_str) = field.type_ {
                if let Some(native_idx) = NATIVE_TYPES.iter().position(|&t| t == type_str.as_str()) {
                    !(native_idx as i32)
                } else if let Some(&def_idx) = definition_index_map.get(type_str.as_str()) {
                    def_idx as i32
                } else {
                    return Err(KiwiError::EncodeError(format!(
                        "Type '{}' not found in native types or definitions",
                        type_str
                    )));
                }
            } else {
                0
            };
            writer.write_var_int(type_num);

            let mut flags = 0;
            if field.is_array {
                flags |= FLAG_ARRAY;
            }
            if field.is_deprecated {
                flags |= FLAG_DEPRECATED;
            }
            writer.write_byte(flags);
            writer.write_var_uint(field.reserved_index as u32);
            write_doc(&mut writer, &field.doc);
        }
    }

    writer.write_var_uint(schema.services.len() as u32);
    for service in &schema.services {
        writer.write_string(&service.name);
        write_doc(&mut writer, &service.doc);
        writer.write_var_uint(service.methods.len() as u32);
        for method in &service.methods {
            writer.write_string(&method.name);
            for ty in [&method.request, &method.response] {
                let index = definition_index_map.get(ty.as_str()).ok_or_else(|| {
                    KiwiError::EncodeError(format!(
                        "Type '{}' used by method '{}' is not a definition",
                        ty, method.name
                    ))
                })?;
                writer.write_var_uint(*index as u32);
            }
            write_doc(&mut writer, &method.doc);
        }
    }

    Ok(writer.into_bytes())
}

/// Decode a binary schema buffer back into a `Schema`.
/// Returns `Err(KiwiError)` on any read failure or invalid data.
pub fn decode_binary_schema(buffer: &[u8]) -> Result<Schema, KiwiError> {
    struct FieldTemp {
        field:    Field,
        type_num: i32,
    }

    let mut bb = WireReader::new(buffer);

    let magic = bb.read_bytes(BINARY_SCHEMA_IDENTIFIER.len()).map_err(decode_err("identifier"))?;
    if magic != BINARY_SCHEMA_IDENTIFIER {
        return Err(KiwiError::DecodeError("Not a binary Kiwi schema (bad identifier)".to_string()));
    }
    let version = bb.read_byte().map_err(decode_err("format version"))?;
    if version != BINARY_SCHEMA_VERSION {
        return Err(KiwiError::DecodeError(format!("Unsupported binary schema version {}", version)));
    }

    let package = bb.read_string().map_err(decode_err("package"))?.into_owned();

    let definition_count = bb.read_var_uint().map_err(decode_err("definition count"))?;
    let mut definitions_temp: Vec<(Definition, Vec<FieldTemp>)> = Vec::new();

    for _ in 0..definition_count {
        let name = bb.read_string().map_err(decode_err("definition name"))?.into_owned();
        let kind_byte = bb.read_byte().map_err(decode_err("kind byte"))?;
        let kind = match kind_byte {
            0 => DefinitionKind::Enum,
            1 => DefinitionKind::Struct,
            2 => DefinitionKind::Message,
            _ => {
                return Err(KiwiError::DecodeError(format!(
                    "Invalid DefinitionKind value: {}",
                    kind_byte
                )))
            }
        };
        let doc = read_doc(&mut bb)?;

        let field_count = bb.read_var_uint().map_err(decode_err("field count"))?;
        let mut fields_temp = Vec::new();
        for _ in 0..field_count {
            let field_name = bb.read_string().map_err(decode_err("field name"))?.into_owned();
            let type_num = bb.read_var_int().map_err(decode_err("type_num"))?;
            let flags = bb.read_byte().map_err(decode_err("field flags"))?;
            let reserved_index = bb.read_var_uint().map_err(decode_err("reserved_index"))?;
            let field_doc = read_doc(&mut bb)?;

            fields_temp.push(FieldTemp {
                field: Field {
                    name:           field_name,
                    line:           0,
                    column:         0,
                    type_:          None,
                    is_array:       flags & FLAG_ARRAY != 0,
                    is_deprecated:  flags & FLAG_DEPRECATED != 0,
                    reserved_index: reserved_index as i32,
                    doc:            field_doc,
                },
                type_num,
            });
        }

        let definition = Definition { name, line: 0, column: 0, kind, fields: Vec::new(), doc };
        definitions_temp.push((definition, fields_temp));
    }

    let names: Vec<String> = definitions_temp.iter().map(|(def, _)| def.name.clone()).collect();
    let resolve = |index: usize, context: &str| -> Result<String, KiwiError> {
        names.get(index).cloned().ok_or_else(|| {
            KiwiError::DecodeError(format!("Invalid definition index {} for {}", index, context))
        })
    };

    let mut definitions = Vec::with_capacity(definitions_temp.len());
    for (mut def, fields_temp) in definitions_temp {
        for FieldTemp { mut field, type_num } in fields_temp {
            if def.kind != DefinitionKind::Enum {
                field.type_ = Some(if type_num < 0 {
                    let index = (!type_num) as usize;
                    NATIVE_TYPES.get(index).map(|t| t.to_string()).ok_or_else(|| {
                        KiwiError::DecodeError(format!(
                            "Invalid native type index {} for field {}",
                            type_num, field.name
                        ))
                    })?
                } else {
                    resolve(type_num as usize, &format!("field {}", field.name))?
                });
            }
            def.fields.push(field);
        }
        definitions.push(def);
    }

    let service_count = bb.read_var_uint().map_err(decode_err("service count"))?;
    let mut services = Vec::new();
    for _ in 0..service_count {
        let name = bb.read_string().map_err(decode_err("service name"))?.into_owned();
        let doc = read_doc(&mut bb)?;
        let method_count = bb.read_var_uint().map_err(decode_err("method count"))?;
        let mut methods = Vec::new();
        for _ in 0..method_count {
            let method_name = bb.read_string().map_err(decode_err("method name"))?.into_owned();
            let request = bb.read_var_uint().map_err(decode_err("request type"))?;
            let response = bb.read_var_uint().map_err(decode_err("response type"))?;
            let method_doc = read_doc(&mut bb)?;
            let context = format!("method {}", method_name);
            methods.push(Method {
                request:  resolve(request as usize, &context)?,
                response: resolve(response as usize, &context)?,
                name:     method_name,
                line:     0,
                column:   0,
                doc:      method_doc,
            });
        }
        services.push(Service { name, line: 0, column: 0, methods, doc });
    }

    if !bb.is_at_end() {
        return Err(KiwiError::DecodeError(format!(
            "{} trailing bytes after the schema",
            buffer.len() - bb.index()
        )));
    }

    Ok(Schema {
        package: if package.is_empty() { None } else { Some(package) },
        definitions,
        services,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
    package demo;

    /// Shape of a thing
    enum Type {
      FLAT = 0;
      ROUND = 1;
    }

    struct Color {
      byte red;
      byte green;
    }

    message Example {
      /// Who sent it
      uint client_id = 1;
      Type type = 2;
      Color[] colors = 3;
      string old = 4 [deprecated];
    }

    service Echo {
      /// Returns the input
      Echo(Example): Example;
    }
    "#;

    #[test]
    fn binary_schema_starts_with_identifier() {
        let (_, bin) = compile_schema(EXAMPLE).unwrap();
        assert_eq!(&bin[..4], BINARY_SCHEMA_IDENTIFIER);
        assert_eq!(bin[4], BINARY_SCHEMA_VERSION);
    }

    #[test]
    fn decode_restores_the_schema() {
        let (schema, bin) = compile_schema(EXAMPLE).unwrap();
        let decoded = decode_binary_schema(&bin).unwrap();

        assert_eq!(decoded.package.as_deref(), Some("demo"));
        assert_eq!(decoded.definitions.len(), schema.definitions.len());
        assert_eq!(decoded.definitions[0].doc, vec![" Shape of a thing"]);

        let example = &decoded.definitions[2];
        assert_eq!(example.kind, DefinitionKind::Message);
        assert_eq!(example.fields[0].doc, vec![" Who sent it"]);
        assert_eq!(example.fields[1].type_.as_deref(), Some("Type"));
        assert!(example.fields[2].is_array);
        assert_eq!(example.fields[2].type_.as_deref(), Some("Color"));
        assert!(example.fields[3].is_deprecated);

        let echo = &decoded.services[0];
        assert_eq!(echo.methods[0].request, "Example");
        assert_eq!(echo.methods[0].doc, vec![" Returns the input"]);
    }

    #[test]
    fn encoding_is_deterministic() {
        let (_, first) = compile_schema(EXAMPLE).unwrap();
        let (_, second) = compile_schema(EXAMPLE).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode_binary_schema(b"nope"), Err(KiwiError::DecodeError(_))));
        assert!(matches!(decode_binary_schema(b""), Err(KiwiError::DecodeError(_))));

        let (_, mut bin) = compile_schema(EXAMPLE).unwrap();
        bin.truncate(bin.len() - 3);
        assert!(decode_binary_schema(&bin).is_err());
    }

    #[test]
    fn encode_rejects_unknown_types() {
        let schema = Schema {
            package: None,
            definitions: vec![Definition {
                name: "A".into(),
                line: 1,
                column: 1,
                kind: DefinitionKind::Message,
                fields: vec![Field {
                    name: "b".into(),
                    line: 1,
                    column: 1,
                    type_: Some("Missing".into()),
                    is_array: false,
                    is_deprecated: false,
                    reserved_index: 1,
                    doc: Vec::new(),
                }],
                doc: Vec::new(),
            }],
            services: Vec::new(),
        };
        assert!(matches!(encode_binary_schema(&schema), Err(KiwiError::EncodeError(_))));
    }
}
