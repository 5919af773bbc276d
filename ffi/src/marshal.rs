//! Turns failures into C strings and keeps panics from unwinding into the host.

use std::alloc::{alloc, dealloc, Layout};
use std::ffi::{c_char, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use kiwi_bridge_compiler::KiwiError;
use tracing::{error, warn};

static OUT_OF_MEMORY: &[u8] = b"Out-of-memory when trying to allocate an error text.\0";
static UNKNOWN_ERROR: &[u8] = b"Unknown error\0";

pub(crate) fn out_of_memory() -> *const c_char {
    OUT_OF_MEMORY.as_ptr() as *const c_char
}

pub(crate) fn unknown_error() -> *const c_char {
    UNKNOWN_ERROR.as_ptr() as *const c_char
}

fn is_sentinel(message: *const c_char) -> bool {
    ptr::eq(message, out_of_memory()) || ptr::eq(message, unknown_error())
}

/// Copies `text` into a fresh NUL-terminated heap string. Interior NUL bytes
/// are dropped. Falls back to the out-of-memory sentinel.
pub(crate) fn allocate_message(text: &str) -> *const c_char {
    let len = text.bytes().filter(|&b| b != 0).count();
    let layout = match Layout::array::<u8>(len + 1) {
        Ok(layout) => layout,
        Err(_) => return out_of_memory(),
    };

    // SAFETY: the layout has a non-zero size.
    let base = unsafe { alloc(layout) };
    if base.is_null() {
        return out_of_memory();
    }

    // SAFETY: `base` has room for `len` bytes plus the terminator.
    unsafe {
        for (i, b) in text.bytes().filter(|&b| b != 0).enumerate() {
            *base.add(i) = b;
        }
        *base.add(len) = 0;
    }
    base as *const c_char
}

/// Releases a message made by [`allocate_message`]. Null and the static
/// sentinels are ignored.
///
/// # Safety
/// `message` must be null, a sentinel, or an unreleased message from
/// [`allocate_message`].
pub(crate) unsafe fn free_message(message: *const c_char) {
    if message.is_null() || is_sentinel(message) {
        return;
    }
    let len = CStr::from_ptr(message).to_bytes().len();
    if let Ok(layout) = Layout::array::<u8>(len + 1) {
        dealloc(message as *mut u8, layout);
    }
}

/// Runs `op`, returning its value on success and `fallback` otherwise.
///
/// On failure the message goes to `*out_error` when `out_error` is non-null;
/// a null slot means nothing is allocated. Panics report `"Unknown error"`.
///
/// # Safety
/// `out_error` must be null or valid for a pointer write.
pub(crate) unsafe fn run_guarded<T, F>(out_error: *mut *const c_char, fallback: T, op: F) -> T
where
    F: FnOnce() -> Result<T, KiwiError>,
{
    let message = match panic::catch_unwind(AssertUnwindSafe(op)) {
        Ok(Ok(value)) => return value,
        Ok(Err(e)) => {
            warn!(category = e.category(), error = %e, "call failed");
            if out_error.is_null() {
                return fallback;
            }
            allocate_message(&e.to_string())
        }
        Err(_) => {
            error!("panic caught at the C boundary");
            unknown_error()
        }
    };

    if !out_error.is_null() {
        *out_error = message;
    }
    fallback
}
