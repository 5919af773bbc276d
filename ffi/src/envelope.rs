//! Length-prefixed byte buffers handed across the C boundary.
//!
//! The header and the payload share one heap block: the payload starts right
//! after the header, so a single deallocation releases both. The block's
//! layout is recomputed from `size` when it is released.

use std::alloc::{alloc, dealloc, Layout};
use std::mem::{align_of, size_of};
use std::ptr;

use kiwi_bridge_compiler::KiwiError;

/// A byte buffer owned by the caller once returned. `data` is null iff
/// `size` is zero.
#[repr(C)]
#[derive(Debug)]
pub struct KbBytes {
    pub size: u64,
    pub data: *mut u8,
}

const fn padded(size: usize, align: usize) -> usize {
    (size + align - 1) / align * align
}

const HEADER_SIZE: usize = padded(size_of::<KbBytes>(), align_of::<*mut u8>());

fn layout(payload_len: usize) -> Option<Layout> {
    let total = HEADER_SIZE.checked_add(payload_len)?;
    Layout::from_size_align(total, align_of::<KbBytes>()).ok()
}

impl KbBytes {
    /// Copies `payload` into a fresh envelope of exactly its length.
    pub fn allocate(payload: &[u8]) -> Result<*mut KbBytes, KiwiError> {
        let layout = layout(payload.len()).ok_or_else(|| {
            KiwiError::State(format!("a buffer of {} bytes cannot be allocated", payload.len()))
        })?;

        // SAFETY: the layout is never zero-sized because it contains the header.
        let base = unsafe { alloc(layout) };
        if base.is_null() {
            return Err(KiwiError::State(format!("out of memory allocating {} bytes", layout.size())));
        }

        // SAFETY: `base` points to `layout.size()` writable bytes aligned for
        // `KbBytes`; the payload region starts after the padded header.
        unsafe {
            let data = if payload.is_empty() {
                ptr::null_mut()
            } else {
                let data = base.add(HEADER_SIZE);
                ptr::copy_nonoverlapping(payload.as_ptr(), data, payload.len());
                data
            };
            let envelope = base as *mut KbBytes;
            ptr::write(envelope, KbBytes { size: payload.len() as u64, data });
            Ok(envelope)
        }
    }

    /// Releases an envelope made by [`KbBytes::allocate`]. Null is ignored.
    ///
    /// # Safety
    /// `envelope` must be null or come from [`KbBytes::allocate`] and must not
    /// have been released before.
    pub unsafe fn release(envelope: *mut KbBytes) {
        if envelope.is_null() {
            return;
        }
        let size = (*envelope).size as usize;
        if let Some(layout) = layout(size) {
            dealloc(envelope as *mut u8, layout);
        }
    }

    /// The payload as a slice.
    ///
    /// # Safety
    /// `self` must be a live envelope made by [`KbBytes::allocate`].
    pub unsafe fn as_slice(&self) -> &[u8] {
        if self.data.is_null() {
            &[]
        } else {
            std::slice::from_raw_parts(self.data, self.size as usize)
        }
    }
}
