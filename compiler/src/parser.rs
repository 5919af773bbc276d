use std::fmt;

use crate::{
    tokenizer::Token,
    types::{Definition, DefinitionKind, Field, Method, Schema, Service},
    utils::{error, quote},
    error::KiwiError,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref IDENTIFIER:       Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref EQUALS:           Regex = Regex::new(r"^=$").unwrap();
    static ref SEMICOLON:        Regex = Regex::new(r"^;$").unwrap();
    static ref COLON:            Regex = Regex::new(r"^:$").unwrap();
    static ref INTEGER:          Regex = Regex::new(r"^-?\d+$").unwrap();
    static ref LEFT_BRACE:       Regex = Regex::new(r"^\{$").unwrap();
    static ref RIGHT_BRACE:      Regex = Regex::new(r"^\}$").unwrap();
    static ref LEFT_PAREN:       Regex = Regex::new(r"^\($").unwrap();
    static ref RIGHT_PAREN:      Regex = Regex::new(r"^\)$").unwrap();
    static ref ARRAY_TOKEN:      Regex = Regex::new(r"^\[\]$").unwrap();
    static ref ENUM_KEYWORD:     Regex = Regex::new(r"^enum$").unwrap();
    static ref STRUCT_KEYWORD:   Regex = Regex::new(r"^struct$").unwrap();
    static ref MESSAGE_KEYWORD:  Regex = Regex::new(r"^message$").unwrap();
    static ref SERVICE_KEYWORD:  Regex = Regex::new(r"^service$").unwrap();
    static ref PACKAGE_KEYWORD:  Regex = Regex::new(r"^package$").unwrap();
    static ref DEPRECATED_TOKEN: Regex = Regex::new(r"^\[deprecated\]$").unwrap();
    static ref EOF:              Regex = Regex::new(r"^$").unwrap();
    static ref SNAKE_CASE:       Regex = Regex::new(r"^[a-z][a-z0-9_]*$").unwrap();
}

pub const NAMING_WARNING: &str = "field names should be lowercase snake_case, got:";
pub const DANGLING_DOC_WARNING: &str = "documentation comment is not attached to a definition, field or method";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Keep `///` comments on definitions, fields and methods so they end up
    /// in the binary schema and generated code.
    pub retain_doc_comments: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions { retain_doc_comments: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningKind {
    NamingConvention,
    DanglingDocComment,
}

/// A non-fatal diagnostic. Its text is what callers filter on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseWarning {
    pub kind:    WarningKind,
    pub message: String,
    pub line:    usize,
    pub column:  usize,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: warning: {}", self.line, self.column, self.message)
    }
}

#[derive(Debug)]
pub struct ParseOutput {
    pub schema:   Schema,
    pub warnings: Vec<ParseWarning>,
}

/// Parses with default options and drops the warnings.
pub fn parse_schema(tokens: &[Token]) -> Result<Schema, KiwiError> {
    parse_schema_with(tokens, &ParserOptions::default()).map(|out| out.schema)
}

pub fn parse_schema_with(tokens: &[Token], options: &ParserOptions) -> Result<ParseOutput, KiwiError> {
    let mut parser = Parser {
        tokens,
        index: 0,
        options: *options,
        warnings: Vec::new(),
        eof: Token { text: String::new(), line: 0, column: 0 },
    };
    let schema = parser.parse()?;
    Ok(ParseOutput { schema, warnings: parser.warnings })
}

struct Parser<'a> {
    tokens:   &'a [Token],
    index:    usize,
    options:  ParserOptions,
    warnings: Vec<ParseWarning>,
    eof:      Token,
}

impl<'a> Parser<'a> {
    fn current(&self) -> &Token {
        self.tokens
            .get(self.index)
            .or_else(|| self.tokens.last())
            .unwrap_or(&self.eof)
    }

    fn at_end(&self) -> bool {
        self.index >= self.tokens.len() || EOF.is_match(&self.current().text)
    }

    fn eat(&mut self, test: &Regex) -> bool {
        if self.index < self.tokens.len() && test.is_match(&self.current().text) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, test: &Regex, expected: &str) -> Result<(), KiwiError> {
        if !self.eat(test) {
            let tok = self.current();
            return Err(error(
                &format!("Expected {} but found {}", expected, quote(&tok.text)),
                tok.line,
                tok.column,
            ));
        }
        Ok(())
    }

    /// Consumes the current token if it is an identifier and returns it.
    fn identifier(&mut self) -> Result<(String, usize, usize), KiwiError> {
        let (text, line, column) = {
            let tok = self.current();
            (tok.text.clone(), tok.line, tok.column)
        };
        self.expect(&IDENTIFIER, "identifier")?;
        Ok((text, line, column))
    }

    fn unexpected_token(&self) -> KiwiError {
        let tok = self.current();
        error(&format!("Unexpected token {}", quote(&tok.text)), tok.line, tok.column)
    }

    fn warn(&mut self, kind: WarningKind, message: String, line: usize, column: usize) {
        self.warnings.push(ParseWarning { kind, message, line, column });
    }

    /// Collects the `///` lines in front of the next declaration.
    fn doc_comments(&mut self) -> Vec<String> {
        let mut doc = Vec::new();
        while let Some(text) = self.tokens.get(self.index).and_then(Token::doc_text) {
            doc.push(text.to_string());
            self.index += 1;
        }
        if self.options.retain_doc_comments {
            doc
        } else {
            Vec::new()
        }
    }

    /// Doc comments directly in front of `}` or the end of the file.
    fn dangling_doc_comments(&mut self) {
        let start = self.index;
        let (line, column) = {
            let tok = self.current();
            (tok.line, tok.column)
        };
        let _ = self.doc_comments();
        if self.index > start {
            self.warn(WarningKind::DanglingDocComment, DANGLING_DOC_WARNING.to_string(), line, column);
        }
    }

    fn parse(&mut self) -> Result<Schema, KiwiError> {
        let mut schema = Schema::default();

        // Documentation never attaches to the package declaration.
        let start = self.index;
        let _ = self.doc_comments();
        let before_package = self.index > start && !self.at_end() && PACKAGE_KEYWORD.is_match(&self.current().text);
        self.index = start;
        if before_package {
            self.dangling_doc_comments();
        }

        if self.eat(&PACKAGE_KEYWORD) {
            let (name, _, _) = self.identifier()?;
            self.expect(&SEMICOLON, "\";\"")?;
            schema.package = Some(name);
        }

        loop {
            let doc = self.doc_comments();
            if self.at_end() {
                if !doc.is_empty() || self.tokens[..self.index].last().is_some_and(Token::is_doc_comment) {
                    let tok = self.current();
                    let (line, column) = (tok.line, tok.column);
                    self.warn(WarningKind::DanglingDocComment, DANGLING_DOC_WARNING.to_string(), line, column);
                }
                break;
            }

            if self.eat(&SERVICE_KEYWORD) {
                let service = self.parse_service(doc)?;
                schema.services.push(service);
                continue;
            }

            let kind = if self.eat(&ENUM_KEYWORD) {
                DefinitionKind::Enum
            } else if self.eat(&STRUCT_KEYWORD) {
                DefinitionKind::Struct
            } else if self.eat(&MESSAGE_KEYWORD) {
                DefinitionKind::Message
            } else {
                return Err(self.unexpected_token());
            };
            let definition = self.parse_definition(kind, doc)?;
            schema.definitions.push(definition);
        }

        Ok(schema)
    }

    fn parse_definition(&mut self, kind: DefinitionKind, doc: Vec<String>) -> Result<Definition, KiwiError> {
        let (name, line, column) = self.identifier()?;
        self.expect(&LEFT_BRACE, "\"{\"")?;

        let mut fields = Vec::new();
        loop {
            let start = self.index;
            let field_doc = self.doc_comments();
            if self.current().text == "}" && self.index > start {
                self.index = start;
                self.dangling_doc_comments();
            }
            if self.eat(&RIGHT_BRACE) {
                break;
            }

            let mut type_opt = None;
            let mut is_array = false;
            let mut is_deprecated = false;

            if kind != DefinitionKind::Enum {
                let (type_name, _, _) = self.identifier()?;
                if self.eat(&ARRAY_TOKEN) {
                    is_array = true;
                }
                type_opt = Some(type_name);
            }

            let (field_name, field_line, field_column) = self.identifier()?;

            // Enums and messages carry explicit values, structs are numbered in order.
            let value = if kind != DefinitionKind::Struct {
                self.expect(&EQUALS, "\"=\"")?;
                let (text, v_line, v_column) = {
                    let tok = self.current();
                    (tok.text.clone(), tok.line, tok.column)
                };
                self.expect(&INTEGER, "integer")?;
                text.parse::<i32>().map_err(|_| {
                    error(&format!("Invalid integer {}", quote(&text)), v_line, v_column)
                })?
            } else {
                fields.len() as i32 + 1
            };

            if self.eat(&DEPRECATED_TOKEN) {
                if kind != DefinitionKind::Message {
                    let deprecated = &self.tokens[self.index - 1];
                    return Err(error("Cannot deprecate this field", deprecated.line, deprecated.column));
                }
                is_deprecated = true;
            }

            self.expect(&SEMICOLON, "\";\"")?;

            if kind != DefinitionKind::Enum && !SNAKE_CASE.is_match(&field_name) {
                self.warn(
                    WarningKind::NamingConvention,
                    format!("{} {}", NAMING_WARNING, field_name),
                    field_line,
                    field_column,
                );
            }

            fields.push(Field {
                name:           field_name,
                line:           field_line,
                column:         field_column,
                type_:          type_opt,
                is_array,
                is_deprecated,
                reserved_index: value,
                doc:            field_doc,
            });
        }

        Ok(Definition { name, line, column, kind, fields, doc })
    }

    fn parse_service(&mut self, doc: Vec<String>) -> Result<Service, KiwiError> {
        let (name, line, column) = self.identifier()?;
        self.expect(&LEFT_BRACE, "\"{\"")?;

        let mut methods = Vec::new();
        loop {
            let start = self.index;
            let method_doc = self.doc_comments();
            if self.current().text == "}" && self.index > start {
                self.index = start;
                self.dangling_doc_comments();
            }
            if self.eat(&RIGHT_BRACE) {
                break;
            }

            let (method_name, method_line, method_column) = self.identifier()?;
            self.expect(&LEFT_PAREN, "\"(\"")?;
            let (request, _, _) = self.identifier()?;
            self.expect(&RIGHT_PAREN, "\")\"")?;
            self.expect(&COLON, "\":\"")?;
            let (response, _, _) = self.identifier()?;
            self.expect(&SEMICOLON, "\";\"")?;

            methods.push(Method {
                name:   method_name,
                line:   method_line,
                column: method_column,
                request,
                response,
                doc:    method_doc,
            });
        }

        Ok(Service { name, line, column, methods, doc })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize_schema;

    fn parse(text: &str) -> ParseOutput {
        let tokens = tokenize_schema(text).expect("tokenize_schema failed");
        parse_schema_with(&tokens, &ParserOptions::default()).expect("parse failed")
    }

    #[test]
    fn package_and_definitions() {
        let out = parse("package game;\nenum Kind { A = 0; B = 1; }\nstruct Pos { float x; float y; }");
        assert_eq!(out.schema.package.as_deref(), Some("game"));
        assert_eq!(out.schema.definitions.len(), 2);
        assert_eq!(out.schema.definitions[1].fields[1].reserved_index, 2);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn doc_comments_attach_to_the_next_declaration() {
        let out = parse(
            "/// A creature\nmessage Monster {\n  /// Note: name may be nil\n  string name = 1;\n  // not doc\n  int hp = 2;\n}",
        );
        let monster = &out.schema.definitions[0];
        assert_eq!(monster.doc, vec![" A creature"]);
        assert_eq!(monster.fields[0].doc, vec![" Note: name may be nil"]);
        assert!(monster.fields[1].doc.is_empty());
    }

    #[test]
    fn doc_comments_can_be_discarded() {
        let tokens = tokenize_schema("/// gone\nstruct P { int x; }").unwrap();
        let out = parse_schema_with(&tokens, &ParserOptions { retain_doc_comments: false }).unwrap();
        assert!(out.schema.definitions[0].doc.is_empty());
    }

    #[test]
    fn naming_convention_warning() {
        let out = parse("message Example { uint clientID = 1; }");
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].kind, WarningKind::NamingConvention);
        assert_eq!(
            out.warnings[0].to_string(),
            "1:24: warning: field names should be lowercase snake_case, got: clientID"
        );
    }

    #[test]
    fn enum_values_are_not_subject_to_naming_rules() {
        let out = parse("enum Type { FLAT = 0; ROUND = 1; }");
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn dangling_doc_comment_warning() {
        let out = parse("struct P {\n  int x;\n  /// orphan\n}\n");
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].kind, WarningKind::DanglingDocComment);
        assert_eq!(out.warnings[0].line, 3);

        let out = parse("struct P { int x; }\n/// trailing");
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].kind, WarningKind::DanglingDocComment);
    }

    #[test]
    fn doc_comment_before_package_is_dangling() {
        let out = parse("/// about the package\npackage game;\nstruct P { int x; }");
        assert_eq!(out.schema.package.as_deref(), Some("game"));
        assert!(out.schema.definitions[0].doc.is_empty());
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].kind, WarningKind::DanglingDocComment);
        assert_eq!((out.warnings[0].line, out.warnings[0].column), (1, 1));

        // Without a package the same lines document the first definition.
        let out = parse("/// about P\nstruct P { int x; }");
        assert_eq!(out.schema.definitions[0].doc, vec![" about P"]);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn services() {
        let out = parse(
            "message Req { int a = 1; }\nmessage Resp { int b = 1; }\n/// Greets\nservice Greeter {\n  /// Say it\n  SayHello(Req): Resp;\n}",
        );
        let service = &out.schema.services[0];
        assert_eq!(service.name, "Greeter");
        assert_eq!(service.doc, vec![" Greets"]);
        assert_eq!(service.methods[0].name, "SayHello");
        assert_eq!(service.methods[0].request, "Req");
        assert_eq!(service.methods[0].response, "Resp");
        assert_eq!(service.methods[0].doc, vec![" Say it"]);
    }

    #[test]
    fn deprecating_struct_fields_is_an_error() {
        let tokens = tokenize_schema("struct P { int x [deprecated]; }").unwrap();
        let err = parse_schema(&tokens).unwrap_err();
        assert!(err.to_string().contains("Cannot deprecate this field"));
    }

    #[test]
    fn missing_semicolon_reports_position() {
        let tokens = tokenize_schema("message M {\n  int a = 1\n}").unwrap();
        match parse_schema(&tokens).unwrap_err() {
            KiwiError::ParseError { msg, line, column } => {
                assert_eq!(msg, "Expected \";\" but found \"}\"");
                assert_eq!((line, column), (3, 1));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn empty_token_list_is_an_empty_schema() {
        assert_eq!(parse_schema(&[]).unwrap(), Schema::default());
    }
}
