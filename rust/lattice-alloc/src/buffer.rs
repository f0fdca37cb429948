use std::ffi::c_void;

/// Opaque handle to a raw memory block produced by an [`Allocator`](crate::Allocator).
///
/// A `Buffer` is only an address: copying it copies the address, equality is
/// pointer identity, and dropping it releases nothing. The block is released by
/// exactly one call to [`Allocator::free`](crate::Allocator::free) (or the crate-level
/// [`free`](crate::free)) on the allocator that produced it.
///
/// A null buffer stands for "no allocation", either a zero-size request or an
/// allocation failure.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Buffer {
    ptr: *mut c_void,
}

impl Buffer {
    /// Wraps a raw block address.
    #[inline]
    pub const fn new(ptr: *mut c_void) -> Buffer {
        Buffer { ptr }
    }

    #[inline]
    pub const fn null() -> Buffer {
        Buffer {
            ptr: std::ptr::null_mut(),
        }
    }

    /// Returns the wrapped address unchanged.
    #[inline]
    pub fn ptr(&self) -> *mut c_void {
        self.ptr
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }
}

impl Default for Buffer {
    #[inline]
    fn default() -> Self {
        Buffer::null()
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Buffer").field(&self.ptr).finish()
    }
}

// SAFETY: a Buffer is an address value with no access of its own. Reading or
// releasing the block it names goes through the unsafe Allocator methods, whose
// callers take responsibility for synchronization.
unsafe impl Send for Buffer {}

// SAFETY: see `Send` above.
unsafe impl Sync for Buffer {}
