use serde::Serialize;

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct Schema {
    pub package:     Option<String>,
    pub definitions: Vec<Definition>,
    pub services:    Vec<Service>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DefinitionKind {
    Enum    = 0,
    Struct  = 1,
    Message = 2,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name:           String,
    pub line:           usize,
    pub column:         usize,
    pub type_:          Option<String>,
    pub is_array:       bool,
    pub is_deprecated:  bool,
    pub reserved_index: i32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub doc:            Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Definition {
    pub name:    String,
    pub line:    usize,
    pub column:  usize,
    pub kind:    DefinitionKind,
    pub fields:  Vec<Field>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub doc:     Vec<String>,
}

/// An RPC method: one request message in, one response message out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Method {
    pub name:     String,
    pub line:     usize,
    pub column:   usize,
    pub request:  String,
    pub response: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub doc:      Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Service {
    pub name:    String,
    pub line:    usize,
    pub column:  usize,
    pub methods: Vec<Method>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub doc:     Vec<String>,
}

impl Schema {
    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().find(|def| def.name == name)
    }
}
