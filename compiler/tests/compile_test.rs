#![cfg(test)]

use std::fs;
use std::path::PathBuf;

use kiwi_bridge_compiler::{
    compile_schema,
    decode_binary_schema,
    load_binary_schema,
    parser::parse_schema,
    tokenizer::tokenize_schema,
    types::DefinitionKind,
    KiwiError,
    LoaderOptions,
    WarningPolicy,
};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

#[test]
fn test_parse_schema() {
    let input = r#"
    enum Type {
      FLAT = 0;
      ROUND = 1;
      POINTED = 2;
    }

    struct Color {
      byte red;
      byte green;
      byte blue;
      byte alpha;
    }

    message Example {
      uint clientID = 1;
      Type type = 2;
      Color[] colors = 3;
    }
    "#;

    let tokens = tokenize_schema(input).expect("tokenize_schema failed");
    let schema = parse_schema(&tokens).expect("parse_schema failed");

    assert!(schema.package.is_none());
    assert_eq!(schema.definitions.len(), 3);

    let type_def = &schema.definitions[0];
    assert_eq!(type_def.kind, DefinitionKind::Enum);
    assert_eq!(type_def.name, "Type");
    let values: Vec<(&str, i32)> = type_def.fields.iter().map(|f| (f.name.as_str(), f.reserved_index)).collect();
    assert_eq!(values, vec![("FLAT", 0), ("ROUND", 1), ("POINTED", 2)]);

    // Struct fields are numbered in declaration order.
    let color_def = &schema.definitions[1];
    assert_eq!(color_def.kind, DefinitionKind::Struct);
    for (i, name) in ["red", "green", "blue", "alpha"].iter().enumerate() {
        assert_eq!(color_def.fields[i].name, *name);
        assert_eq!(color_def.fields[i].type_.as_deref(), Some("byte"));
        assert!(!color_def.fields[i].is_array);
        assert_eq!(color_def.fields[i].reserved_index, i as i32 + 1);
    }

    let message_def = &schema.definitions[2];
    assert_eq!(message_def.kind, DefinitionKind::Message);
    assert_eq!(message_def.fields[1].type_.as_deref(), Some("Type"));
    assert_eq!(message_def.fields[2].type_.as_deref(), Some("Color"));
    assert!(message_def.fields[2].is_array);
    assert_eq!(message_def.fields[2].reserved_index, 3);
}

#[test]
fn fixture_keeps_only_documentation_comments() {
    let text = fs::read_to_string(fixture("monster.kiwi")).unwrap();
    let (schema, _) = compile_schema(&text).unwrap();

    assert_eq!(schema.package.as_deref(), Some("game"));

    let color = schema.definition("Color").unwrap();
    assert!(color.doc.is_empty());
    let item = schema.definition("Item").unwrap();
    assert!(item.doc.is_empty());

    let monster = schema.definition("Monster").unwrap();
    assert_eq!(monster.doc, vec![" A real or imaginary living creature or entity"]);
    let doc = |name: &str| monster.fields.iter().find(|f| f.name == name).unwrap().doc.clone();
    assert!(doc("hp").is_empty());
    assert_eq!(doc("name"), vec![" Note: name may be nil"]);
    assert_eq!(doc("inventory"), vec![" All worldly belongings of this being"]);
    assert!(doc("boss").is_empty());

    let bestiary = &schema.services[0];
    assert_eq!(bestiary.doc, vec![" Looks monsters up by name"]);
    assert_eq!(bestiary.methods[0].request, "Monster");
}

#[test]
fn binary_schema_survives_decoding() {
    let text = fs::read_to_string(fixture("monster.kiwi")).unwrap();
    let (schema, binary) = compile_schema(&text).unwrap();
    let decoded = decode_binary_schema(&binary).unwrap();

    assert_eq!(decoded.package, schema.package);
    assert_eq!(decoded.definitions.len(), schema.definitions.len());
    for (a, b) in decoded.definitions.iter().zip(&schema.definitions) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.doc, b.doc);
        let fields = |d: &kiwi_bridge_compiler::types::Definition| -> Vec<_> {
            d.fields
                .iter()
                .map(|f| (f.name.clone(), f.type_.clone(), f.is_array, f.is_deprecated, f.reserved_index, f.doc.clone()))
                .collect()
        };
        assert_eq!(fields(a), fields(b));
    }
    assert_eq!(decoded.services[0].methods[0].doc, schema.services[0].methods[0].doc);
}

#[test]
fn loader_applies_the_warning_policy() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("names.kiwi");
    fs::write(&path, "message Example { uint clientID = 1; }").unwrap();

    let binary = load_binary_schema(&path, &LoaderOptions::default()).unwrap();
    assert!(!binary.is_empty());

    let strict = LoaderOptions { warning_policy: WarningPolicy::Strict, ..LoaderOptions::default() };
    let err = load_binary_schema(&path, &strict).unwrap_err();
    match err.innermost() {
        KiwiError::Warning(text) => {
            assert_eq!(text, "1:24: warning: field names should be lowercase snake_case, got: clientID")
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(
        err.to_string(),
        format!("{}: 1:24: warning: field names should be lowercase snake_case, got: clientID", path.display())
    );

    fs::write(&path, "struct P { int x; }\n/// nothing follows").unwrap();
    let err = load_binary_schema(&path, &LoaderOptions::default()).unwrap_err();
    match err.innermost() {
        KiwiError::Warning(text) => assert!(text.contains("documentation comment is not attached")),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn loader_reports_parse_failures() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.kiwi");
    fs::write(&path, "struct P { int x }").unwrap();

    let err = load_binary_schema(&path, &LoaderOptions::default()).unwrap_err();
    assert!(matches!(err.innermost(), KiwiError::ParseError { line: 1, .. }));
    assert!(err.to_string().starts_with(&format!("{}: Parse error at line 1", path.display())));
}
