//! The exported C functions. Every entry point runs its work through
//! [`run_guarded`], so no error or panic crosses the boundary.

use std::ffi::{c_char, c_int, CStr};
use std::io::Write;
use std::path::Path;
use std::ptr;

use kiwi_bridge_compiler::{dispatcher, load_binary_schema, KiwiError, LoaderOptions, WarningPolicy};
use tracing::debug;

use crate::envelope::KbBytes;
use crate::marshal::{free_message, run_guarded};

static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");

/// Borrows a C string argument as UTF-8.
unsafe fn utf8_argument<'a>(value: *const c_char, name: &str) -> Result<&'a str, KiwiError> {
    if value.is_null() {
        return Err(KiwiError::null_argument(name));
    }
    CStr::from_ptr(value)
        .to_str()
        .map_err(|_| KiwiError::Argument(format!("Argument {} is not valid UTF-8", name)))
}

fn flush_std_streams() {
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
}

/// Releases an error message returned through an `out_error` slot.
///
/// Null and the library's static messages are ignored.
///
/// # Safety
/// `message` must be null or a message returned by this library that has not
/// been released yet.
#[no_mangle]
pub unsafe extern "C" fn kb_error_free(message: *const c_char) {
    free_message(message);
}

/// Parses and verifies a schema file and returns its binary schema.
///
/// Field naming warnings are ignored, every other parser warning fails the
/// call. Returns null on failure; `*out_error` then holds the reason if
/// `out_error` is non-null.
///
/// # Safety
/// `filename` must be null or a NUL-terminated string. `out_error` must be
/// null or valid for a pointer write.
#[no_mangle]
pub unsafe extern "C" fn kb_schema_parse_file(
    filename: *const c_char,
    out_error: *mut *const c_char,
) -> *mut KbBytes {
    parse_file(filename, WarningPolicy::IgnoreNamingConvention as c_int, out_error)
}

/// Like [`kb_schema_parse_file`] with an explicit warning policy:
/// 0 ignores field naming warnings, 1 makes every warning fatal.
///
/// # Safety
/// Same as [`kb_schema_parse_file`].
#[no_mangle]
pub unsafe extern "C" fn kb_schema_parse_file_ex(
    filename: *const c_char,
    warning_policy: c_int,
    out_error: *mut *const c_char,
) -> *mut KbBytes {
    parse_file(filename, warning_policy, out_error)
}

unsafe fn parse_file(filename: *const c_char, warning_policy: c_int, out_error: *mut *const c_char) -> *mut KbBytes {
    run_guarded(out_error, ptr::null_mut(), || {
        let filename = utf8_argument(filename, "filename")?;
        let options = LoaderOptions {
            warning_policy: WarningPolicy::try_from(warning_policy)?,
            ..LoaderOptions::default()
        };
        debug!(filename, policy = ?options.warning_policy, "parsing schema file");

        let binary = load_binary_schema(Path::new(filename), &options)?;
        KbBytes::allocate(&binary)
    })
}

/// Releases a buffer returned by [`kb_schema_parse_file`]. Null is ignored.
///
/// # Safety
/// `schema` must be null or a buffer returned by this library that has not
/// been released yet.
#[no_mangle]
pub unsafe extern "C" fn kb_schema_free(schema: *mut KbBytes) {
    KbBytes::release(schema);
}

/// Runs the generators with command-line style arguments, program name
/// excluded. Returns the exit code; 0 is success. On failure a non-zero code
/// is returned and `*out_error` holds the reason if `out_error` is non-null.
///
/// # Safety
/// `args` must point to `count` NUL-terminated strings (it may be null when
/// `count` is 0). `out_error` must be null or valid for a pointer write.
#[no_mangle]
pub unsafe extern "C" fn kb_generate(
    args: *const *const c_char,
    count: usize,
    out_error: *mut *const c_char,
) -> c_int {
    let code = run_guarded(out_error, 1, || {
        if args.is_null() && count > 0 {
            return Err(KiwiError::null_argument("args"));
        }

        let mut arguments = Vec::with_capacity(count);
        for i in 0..count {
            let arg = utf8_argument(*args.add(i), &format!("args[{}]", i))?;
            arguments.push(arg);
        }
        debug!(?arguments, "running generators");

        dispatcher::run(&arguments)
    });

    flush_std_streams();
    code
}

/// The library version as a static NUL-terminated string. Never free it.
#[no_mangle]
pub extern "C" fn kb_version() -> *const c_char {
    VERSION.as_ptr() as *const c_char
}
