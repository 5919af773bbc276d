use std::collections::{HashMap, HashSet};
use crate::{
    types::{Schema, Definition, DefinitionKind},
    utils::quote,
    error::KiwiError,
};

pub const RESERVED_NAMES: [&str; 3] = ["ByteBuffer", "package", "service"];
pub const NATIVE_TYPES: [&str; 8] = [
    "bool", "byte", "int", "uint", "float", "string", "int64", "uint64",
];

/// Returns `Ok(())` if verification passed, or `Err(KiwiError::VerifierError(_))` otherwise.
pub fn verify_schema(schema: &Schema) -> Result<(), KiwiError> {
    let mut defined_types: Vec<String> = NATIVE_TYPES.iter().map(|s| s.to_string()).collect();
    let mut definitions_map: HashMap<String, &Definition> = HashMap::new();

    // 1) Duplicate / reserved type names
    let service_names = schema.services.iter().map(|s| s.name.as_str());
    let definition_names = schema.definitions.iter().map(|d| d.name.as_str());
    for name in definition_names.chain(service_names) {
        if defined_types.iter().any(|t| t == name) {
            return Err(KiwiError::VerifierError(format!(
                "The type {} is defined twice",
                quote(name)
            )));
        }
        if RESERVED_NAMES.contains(&name) {
            return Err(KiwiError::VerifierError(format!(
                "The type name {} is reserved",
                quote(name)
            )));
        }
        defined_types.push(name.to_string());
    }
    for def in &schema.definitions {
        definitions_map.insert(def.name.clone(), def);
    }

    // 2) Fields inside each definition
    for def in &schema.definitions {
        if let DefinitionKind::Enum = def.kind {
            let mut names = HashSet::new();
            for field in &def.fields {
                if !names.insert(field.name.as_str()) {
                    return Err(KiwiError::VerifierError(format!(
                        "The enum value {} is defined twice in {}",
                        quote(&field.name),
                        quote(&def.name)
                    )));
                }
            }
            continue;
        }

        for field in &def.fields {
            if let Some(ref ty) = field.type_ {
                let is_service = schema.services.iter().any(|s| &s.name == ty);
                if !defined_types.contains(ty) || is_service {
                    return Err(KiwiError::VerifierError(format!(
                        "The type {} is not defined for field {}",
                        quote(ty),
                        quote(&field.name)
                    )));
                }
            }
        }

        let mut names = HashSet::new();
        let mut values = Vec::new();
        for field in &def.fields {
            if !names.insert(field.name.as_str()) {
                return Err(KiwiError::VerifierError(format!(
                    "The field {} is defined twice in {}",
                    quote(&field.name),
                    quote(&def.name)
                )));
            }
            if values.contains(&field.reserved_index) {
                return Err(KiwiError::VerifierError(format!(
                    "The id for field {} is used twice",
                    quote(&field.name)
                )));
            }
            if field.reserved_index <= 0 {
                return Err(KiwiError::VerifierError(format!(
                    "The id for field {} must be positive",
                    quote(&field.name)
                )));
            }
            if field.reserved_index > def.fields.len() as i32 {
                return Err(KiwiError::VerifierError(format!(
                    "The id for field {} cannot be larger than {}",
                    quote(&field.name),
                    def.fields.len()
                )));
            }
            values.push(field.reserved_index);
        }
    }

    // 3) Structs must not contain themselves
    let mut state: HashMap<String, u8> = HashMap::new();
    fn check_recursion(
        name: &str,
        definitions_map: &HashMap<String, &Definition>,
        state: &mut HashMap<String, u8>,
    ) -> Result<(), KiwiError> {
        let definition = match definitions_map.get(name) {
            Some(def) => def,
            None => return Ok(()),
        };
        if let DefinitionKind::Struct = definition.kind {
            match state.get(name).copied() {
                Some(1) => {
                    return Err(KiwiError::VerifierError(format!(
                        "Recursive nesting of {} is not allowed",
                        quote(name)
                    )))
                }
                Some(2) => return Ok(()),
                _ => {}
            }
            state.insert(name.to_string(), 1);
            for field in &definition.fields {
                if !field.is_array {
                    if let Some(ref ty) = field.type_ {
                        check_recursion(ty, definitions_map, state)?;
                    }
                }
            }
            state.insert(name.to_string(), 2);
        }
        Ok(())
    }

    for def in &schema.definitions {
        check_recursion(&def.name, &definitions_map, &mut state)?;
    }

    // 4) Service methods take and return messages
    for service in &schema.services {
        let mut names = HashSet::new();
        for method in &service.methods {
            if !names.insert(method.name.as_str()) {
                return Err(KiwiError::VerifierError(format!(
                    "The method {} is defined twice in {}",
                    quote(&method.name),
                    quote(&service.name)
                )));
            }
            for ty in [&method.request, &method.response] {
                match definitions_map.get(ty.as_str()) {
                    Some(def) if def.kind == DefinitionKind::Message => {}
                    _ => {
                        return Err(KiwiError::VerifierError(format!(
                            "The type {} used by method {} must be a message",
                            quote(ty),
                            quote(&method.name)
                        )))
                    }
                }
            }
        }
    }

    Ok(())
}
