//! Byte-level codec for the Kiwi binary schema format.
//!
//! Integers are written as little-endian base-128 groups (zig-zag for signed
//! values) and strings are UTF-8 followed by a single NUL byte. See
//! [https://github.com/evanw/kiwi](https://github.com/evanw/kiwi) for the
//! original description of the encoding.
//!
//! ```
//! use kiwi_bridge_wire::{WireReader, WireWriter};
//!
//! let mut writer = WireWriter::new();
//! writer.write_string("Point");
//! writer.write_var_int(-3);
//!
//! let bytes = writer.into_bytes();
//! let mut reader = WireReader::new(&bytes);
//! assert_eq!(reader.read_string().unwrap(), "Point");
//! assert_eq!(reader.read_var_int().unwrap(), -3);
//! assert!(reader.is_at_end());
//! ```

pub mod reader;
pub mod writer;

pub use reader::*;
pub use writer::*;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("unexpected end of input at offset {offset} (wanted {wanted} more bytes)")]
    UnexpectedEof { offset: usize, wanted: usize },

    #[error("string starting at offset {offset} is not NUL-terminated")]
    UnterminatedString { offset: usize },

    #[error("invalid boolean byte {value} at offset {offset}")]
    InvalidBool { value: u8, offset: usize },
}
