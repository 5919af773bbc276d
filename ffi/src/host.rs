//! Safe wrappers over the C entry points, the way a host application binds
//! them: arguments are marshalled to C strings, results are copied out and
//! every native allocation is released exactly once.

use std::ffi::{c_char, c_int, CStr, CString, NulError};
use std::path::Path;
use std::ptr;

use kiwi_bridge_compiler::WarningPolicy;
use thiserror::Error;

use crate::api::{kb_error_free, kb_generate, kb_schema_free, kb_schema_parse_file_ex};

#[derive(Debug, Error)]
pub enum HostError {
    /// The native call failed and reported this message.
    #[error("{0}")]
    Native(String),

    #[error("generator failed with exit code {code}: {message}")]
    Exit { code: i32, message: String },

    #[error("argument contains a NUL byte")]
    Nul(#[from] NulError),
}

/// Takes ownership of a native error message.
unsafe fn take_error(message: *const c_char) -> String {
    if message.is_null() {
        return "no error message was reported".to_string();
    }
    let text = CStr::from_ptr(message).to_string_lossy().into_owned();
    kb_error_free(message);
    text
}

/// Parses `path` with the default warning policy and returns the binary schema.
pub fn parse_schema_file(path: impl AsRef<Path>) -> Result<Vec<u8>, HostError> {
    parse_schema_file_with(path, WarningPolicy::default())
}

pub fn parse_schema_file_with(path: impl AsRef<Path>, policy: WarningPolicy) -> Result<Vec<u8>, HostError> {
    let filename = CString::new(path.as_ref().to_string_lossy().into_owned())?;
    let mut error: *const c_char = ptr::null();

    // SAFETY: both pointers are valid for the duration of the call and the
    // returned envelope is released below.
    unsafe {
        let envelope = kb_schema_parse_file_ex(filename.as_ptr(), policy as c_int, &mut error);
        if envelope.is_null() {
            return Err(HostError::Native(take_error(error)));
        }
        let bytes = (*envelope).as_slice().to_vec();
        kb_schema_free(envelope);
        Ok(bytes)
    }
}

/// Runs the generators with `args` (no program name).
pub fn run_generator<S: AsRef<str>>(args: &[S]) -> Result<(), HostError> {
    let owned = args
        .iter()
        .map(|a| CString::new(a.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    let pointers: Vec<*const c_char> = owned.iter().map(|a| a.as_ptr()).collect();
    let mut error: *const c_char = ptr::null();

    // SAFETY: `pointers` holds `pointers.len()` strings kept alive by `owned`.
    let code = unsafe { kb_generate(pointers.as_ptr(), pointers.len(), &mut error) };
    if code == 0 {
        return Ok(());
    }

    let message = unsafe { take_error(error) };
    Err(HostError::Exit { code, message })
}
