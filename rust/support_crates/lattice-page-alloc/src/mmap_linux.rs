use std::sync::OnceLock;

use crate::page_capacity;

/// Maps at least `size` bytes of zero-filled, readable and writable memory.
///
/// The mapping is private and anonymous, and uses the standard system page size
/// (typically 4KB).
///
/// # Arguments
///
/// * `size` - The number of bytes to map. The actual mapping is rounded up to the
///   nearest page boundary. A zero `size` maps one page.
///
/// # Returns
///
/// Returns a `Result` containing:
/// - `Ok((ptr, capacity))` - A pointer to the page-aligned start of the mapping and
///   its capacity in bytes, which may be larger than `size`
/// - `Err(io::Error)` - If the rounded size overflows or the kernel refuses the
///   mapping (for example `ENOMEM` for requests beyond the address space)
///
/// The returned pointer must be released with [`free`], passing the same capacity.
pub fn allocate(size: usize) -> std::io::Result<(*mut std::ffi::c_void, usize)> {
    let capacity = page_capacity(size, get_page_size()).ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::OutOfMemory, "mapping size overflow")
    })?;
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            capacity,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        )
    };
    if ptr.is_null() || ptr == libc::MAP_FAILED {
        return Err(std::io::Error::last_os_error());
    }
    log::trace!("mapped {capacity} bytes at {ptr:p}");
    Ok((ptr, capacity))
}

/// Unmaps a region returned by [`allocate`].
///
/// # Arguments
///
/// * `ptr` - The start of the mapping, as returned by [`allocate`]
/// * `capacity` - The capacity in bytes that was **returned** by [`allocate`], not
///   the size that was requested
///
/// # Returns
///
/// Returns `Ok(())` on success, or the OS error reported by `munmap`.
///
/// # Safety
///
/// `ptr` and `capacity` must come from the same [`allocate`] call, the region must
/// not have been unmapped already, and nothing may access it afterwards.
pub unsafe fn free(ptr: *mut std::ffi::c_void, capacity: usize) -> std::io::Result<()> {
    let res = unsafe { libc::munmap(ptr, capacity) };
    if res < 0 {
        return Err(std::io::Error::last_os_error());
    }
    log::trace!("unmapped {capacity} bytes at {ptr:p}");
    Ok(())
}

/// Returns the system page size in bytes.
///
/// The value is read with `sysconf(_SC_PAGESIZE)` once and cached in a
/// [`OnceLock`]. Falls back to 4KB if the page size cannot be determined.
pub fn get_page_size() -> usize {
    static SIZE: OnceLock<usize> = OnceLock::new();
    *SIZE.get_or_init(|| read_page_size().unwrap_or(4 * 1024))
}

fn read_page_size() -> std::io::Result<usize> {
    let res = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if res <= 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(res as usize)
}
