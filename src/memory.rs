use super::constants::PAGE_ALIGN;
use super::error::AllocError;
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

static MAPPED_BYTES: AtomicUsize = AtomicUsize::new(0);

// Regions come back zeroed: the bump path of a fresh page hands out cells
// without clearing them.
pub fn safe_alloc(size: usize) -> Result<NonNull<u8>, AllocError> {
    assert!(size > 0, "safe_alloc: size must be > 0");

    let layout = Layout::from_size_align(size, PAGE_ALIGN)?;
    let ptr = unsafe { alloc_zeroed(layout) };

    match NonNull::new(ptr) {
        Some(ptr) => {
            MAPPED_BYTES.fetch_add(size, Ordering::Relaxed);
            Ok(ptr)
        }
        None => {
            log::error!("safe_alloc: failed to acquire {} bytes", size);
            Err(AllocError::OutOfMemory { requested: size })
        }
    }
}

/// # Safety
///
/// `ptr` must have been returned by `safe_alloc(size)` with the same `size`,
/// and must not be used afterwards.
pub unsafe fn free(ptr: NonNull<u8>, size: usize) {
    let layout = Layout::from_size_align_unchecked(size, PAGE_ALIGN);

    dealloc(ptr.as_ptr(), layout);
    MAPPED_BYTES.fetch_sub(size, Ordering::Relaxed);
}

/// Bytes currently held by pages across the whole process.
pub fn mapped_bytes() -> usize {
    MAPPED_BYTES.load(Ordering::Relaxed)
}
