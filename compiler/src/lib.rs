//! kiwi-bridge-compiler
//!
//! This crate implements:
//!  1) A tokenizer + parser for `.kiwi` schema files, with `///` documentation
//!     comments and `service` definitions,
//!  2) A schema verifier (duplicate types, recursive structs, missing types, service methods),
//!  3) `encode_binary_schema` / `decode_binary_schema` for the self-describing binary schema,
//!  4) The schema loader and its warning policy,
//!  5) The generator registry and the command-line style dispatcher that drives it,
//!  6) Error types (`KiwiError`).

pub mod error;
pub mod types;
pub mod utils;
pub mod tokenizer;
pub mod parser;
pub mod verifier;
pub mod compiler;
pub mod loader;
pub mod diagnostics;
pub mod generators;
pub mod dispatcher;

pub use compiler::compile_schema;
pub use compiler::decode_binary_schema;
pub use compiler::encode_binary_schema;
pub use dispatcher::run;
pub use error::KiwiError;
pub use loader::{load_binary_schema, LoaderOptions, WarningPolicy};
