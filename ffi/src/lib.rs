//! kiwi-bridge
//!
//! C-callable entry points around the Kiwi schema parser and the code
//! generators. A host loads the `cdylib`, turns schema files into binary
//! schemas with `kb_schema_parse_file` and runs generators with
//! `kb_generate`. Failures never unwind into the host: they come back as a
//! null pointer or a non-zero exit code plus an optional error string.
//!
//! The C declarations live in `include/kiwi_bridge.h`. Rust callers can use
//! the [`host`] module instead of the raw functions.

mod envelope;
mod marshal;
mod api;
pub mod host;

pub use api::{
    kb_error_free,
    kb_generate,
    kb_schema_free,
    kb_schema_parse_file,
    kb_schema_parse_file_ex,
    kb_version,
};
pub use envelope::KbBytes;
