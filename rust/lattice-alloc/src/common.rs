//! The default host-heap allocation strategy.

use crate::{
    allocator::{Allocator, HEADER_WIDTH, read_header, write_header},
    buffer::Buffer,
};

/// Allocates from the host heap (`malloc(3)`/`free(3)`), storing the requested
/// size in a header at the start of each block.
///
/// Block layout: `[size: usize][payload: size bytes]`. The returned buffer points
/// at the header; use [`Allocator::data_ptr`] to reach the payload.
///
/// `CommonAllocator` adds no locking of its own. It is as thread-safe as the
/// host heap.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommonAllocator;

impl CommonAllocator {
    pub const fn new() -> CommonAllocator {
        CommonAllocator
    }
}

impl Allocator for CommonAllocator {
    fn malloc(&self, size: usize) -> Buffer {
        let Some(total) = size.checked_add(HEADER_WIDTH) else {
            return Buffer::null();
        };
        let block = unsafe { libc::malloc(total) };
        if block.is_null() {
            return Buffer::null();
        }
        unsafe { write_header(block, size) };
        Buffer::new(block)
    }

    unsafe fn free(&self, buffer: Buffer) {
        unsafe { libc::free(buffer.ptr()) }
    }

    unsafe fn size(&self, buffer: Buffer) -> usize {
        unsafe { read_header(buffer) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malloc_records_size() {
        let allocator = CommonAllocator::new();
        let buffer = allocator.malloc(1024);
        assert!(!buffer.is_null());
        unsafe {
            assert_eq!(allocator.size(buffer), 1024);
            assert_eq!(allocator.size(buffer), 1024);
            allocator.free(buffer);
        }
    }

    #[test]
    fn test_zero_size() {
        let allocator = CommonAllocator::new();
        let buffer = allocator.malloc(0);
        unsafe {
            assert_eq!(allocator.size(buffer), 0);
            allocator.free(buffer);
        }
    }

    #[test]
    fn test_null_buffer() {
        let allocator = CommonAllocator::new();
        unsafe {
            assert_eq!(allocator.size(Buffer::null()), 0);
            assert!(allocator.data_ptr(Buffer::null()).is_null());
            allocator.free(Buffer::null());
        }
    }

    #[test]
    fn test_overflowing_request_returns_null() {
        let allocator = CommonAllocator::new();
        assert!(allocator.malloc(usize::MAX).is_null());
        assert!(allocator.malloc(usize::MAX - HEADER_WIDTH + 1).is_null());
    }

    #[test]
    fn test_heap_exhaustion_returns_null() {
        // Fits in usize with the header, but no host heap can satisfy it.
        let allocator = CommonAllocator::new();
        assert!(allocator.malloc(isize::MAX as usize).is_null());
    }

    #[test]
    fn test_payload_follows_header() {
        let allocator = CommonAllocator::new();
        let buffer = allocator.malloc(64);
        unsafe {
            let data = allocator.data_ptr(buffer);
            assert_eq!(data as usize, buffer.ptr() as usize + HEADER_WIDTH);
            std::ptr::write_bytes(data, 0xFF, 64);
            assert_eq!(allocator.size(buffer), 64);
            allocator.free(buffer);
        }
    }

    #[test]
    fn test_distinct_buffers() {
        let allocator = CommonAllocator::new();
        let a = allocator.malloc(64);
        let b = allocator.malloc(64);
        assert_ne!(a, b);
        unsafe {
            assert_eq!(allocator.size(a), 64);
            assert_eq!(allocator.size(b), 64);
            allocator.free(a);
            allocator.free(b);
        }
    }
}
