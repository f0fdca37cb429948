use std::sync::Arc;

use crate::buffer::Buffer;

/// Width of the size header that header-based strategies place at the start of
/// each block.
pub const HEADER_WIDTH: usize = std::mem::size_of::<usize>();

/// A memory allocation strategy.
///
/// Implementations report failure as a null [`Buffer`] and never panic or return
/// errors from [`malloc`](Allocator::malloc). Escalating a failed request into an
/// error is the job of the crate-level [`malloc`](crate::malloc).
///
/// For every non-null buffer returned by `malloc(size)`, `size(buffer)` must return
/// exactly `size` until the buffer is freed.
///
/// Buffers must be freed by the same allocator instance that produced them.
pub trait Allocator: Send + Sync {
    /// Allocates a block able to hold `size` payload bytes.
    ///
    /// Returns a null buffer if the request cannot be satisfied. A zero-size
    /// request may return either a null or a non-null buffer.
    fn malloc(&self, size: usize) -> Buffer;

    /// Releases a block. Freeing a null buffer is a no-op.
    ///
    /// # Safety
    ///
    /// `buffer` must be null or must have been returned by `malloc` on this
    /// allocator and not freed since.
    unsafe fn free(&self, buffer: Buffer);

    /// Returns the size requested when `buffer` was allocated, or 0 for a null buffer.
    ///
    /// # Safety
    ///
    /// `buffer` must be null or a live buffer produced by this allocator.
    unsafe fn size(&self, buffer: Buffer) -> usize;

    /// Returns the address of the first payload byte of `buffer`, or null for a
    /// null buffer.
    ///
    /// The default layout places the payload right after a [`HEADER_WIDTH`]-byte
    /// header at the block start.
    ///
    /// # Safety
    ///
    /// `buffer` must be null or a live buffer produced by this allocator.
    unsafe fn data_ptr(&self, buffer: Buffer) -> *mut u8 {
        if buffer.is_null() {
            return std::ptr::null_mut();
        }
        unsafe { (buffer.ptr() as *mut u8).add(HEADER_WIDTH) }
    }
}

impl<A: Allocator + ?Sized> Allocator for &A {
    #[inline]
    fn malloc(&self, size: usize) -> Buffer {
        (**self).malloc(size)
    }

    #[inline]
    unsafe fn free(&self, buffer: Buffer) {
        unsafe { (**self).free(buffer) }
    }

    #[inline]
    unsafe fn size(&self, buffer: Buffer) -> usize {
        unsafe { (**self).size(buffer) }
    }

    #[inline]
    unsafe fn data_ptr(&self, buffer: Buffer) -> *mut u8 {
        unsafe { (**self).data_ptr(buffer) }
    }
}

impl<A: Allocator + ?Sized> Allocator for Box<A> {
    #[inline]
    fn malloc(&self, size: usize) -> Buffer {
        (**self).malloc(size)
    }

    #[inline]
    unsafe fn free(&self, buffer: Buffer) {
        unsafe { (**self).free(buffer) }
    }

    #[inline]
    unsafe fn size(&self, buffer: Buffer) -> usize {
        unsafe { (**self).size(buffer) }
    }

    #[inline]
    unsafe fn data_ptr(&self, buffer: Buffer) -> *mut u8 {
        unsafe { (**self).data_ptr(buffer) }
    }
}

impl<A: Allocator + ?Sized> Allocator for Arc<A> {
    #[inline]
    fn malloc(&self, size: usize) -> Buffer {
        (**self).malloc(size)
    }

    #[inline]
    unsafe fn free(&self, buffer: Buffer) {
        unsafe { (**self).free(buffer) }
    }

    #[inline]
    unsafe fn size(&self, buffer: Buffer) -> usize {
        unsafe { (**self).size(buffer) }
    }

    #[inline]
    unsafe fn data_ptr(&self, buffer: Buffer) -> *mut u8 {
        unsafe { (**self).data_ptr(buffer) }
    }
}

/// Writes the size header at the start of a freshly allocated block.
///
/// # Safety
///
/// `block` must be non-null, aligned for `usize` and valid for at least
/// [`HEADER_WIDTH`] bytes of writes.
#[inline]
pub(crate) unsafe fn write_header(block: *mut std::ffi::c_void, size: usize) {
    unsafe { (block as *mut usize).write(size) }
}

/// Reads the size header of a header-based block, 0 for null.
///
/// # Safety
///
/// `buffer` must be null or point to a live block whose header was written by
/// [`write_header`].
#[inline]
pub(crate) unsafe fn read_header(buffer: Buffer) -> usize {
    if buffer.is_null() {
        return 0;
    }
    unsafe { (buffer.ptr() as *const usize).read() }
}
