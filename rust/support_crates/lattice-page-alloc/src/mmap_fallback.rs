use std::alloc::{Layout, alloc_zeroed, dealloc};

use crate::page_capacity;

/// Allocates zero-filled, page-aligned memory (emulated with the global allocator).
pub fn allocate(size: usize) -> std::io::Result<(*mut std::ffi::c_void, usize)> {
    let page_size = get_page_size();
    let capacity = page_capacity(size, page_size).ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::OutOfMemory, "mapping size overflow")
    })?;
    let layout = Layout::from_size_align(capacity, page_size)
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "Invalid layout"))?;

    let ptr = unsafe { alloc_zeroed(layout) };
    if ptr.is_null() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::OutOfMemory,
            "Failed to allocate memory",
        ));
    }
    log::trace!("allocated {capacity} page bytes at {ptr:p}");
    Ok((ptr as *mut std::ffi::c_void, capacity))
}

/// Frees memory returned by [`allocate`].
///
/// # Safety
///
/// `ptr` and `capacity` must come from the same [`allocate`] call and the block
/// must not have been freed already.
pub unsafe fn free(ptr: *mut std::ffi::c_void, capacity: usize) -> std::io::Result<()> {
    let page_size = get_page_size();
    if !capacity.is_multiple_of(page_size) {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "capacity is not page-aligned",
        ));
    }
    let layout = Layout::from_size_align(capacity, page_size)
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "Invalid layout"))?;

    unsafe {
        dealloc(ptr as *mut u8, layout);
    }
    Ok(())
}

/// Returns the emulated page size in bytes.
pub fn get_page_size() -> usize {
    4 * 1024
}
