//! Page-backed allocation strategy.

use lattice_page_alloc::{mmap, page_capacity};

use crate::{
    allocator::{Allocator, HEADER_WIDTH, read_header, write_header},
    buffer::Buffer,
};

/// Allocates each block as its own anonymous page mapping.
///
/// Uses the same `[size: usize][payload]` layout as
/// [`CommonAllocator`](crate::CommonAllocator). The header also tells `free` how
/// large the mapping is. Payload bytes start out zeroed.
///
/// Every block occupies at least one page, so this strategy suits large tensor
/// storage rather than many small buffers.
#[derive(Debug, Default, Clone, Copy)]
pub struct PageAllocator;

impl PageAllocator {
    pub const fn new() -> PageAllocator {
        PageAllocator
    }

    /// Allocation granularity in bytes.
    pub fn page_size() -> usize {
        mmap::get_page_size()
    }
}

impl Allocator for PageAllocator {
    fn malloc(&self, size: usize) -> Buffer {
        let Some(total) = size.checked_add(HEADER_WIDTH) else {
            return Buffer::null();
        };
        match mmap::allocate(total) {
            Ok((block, _)) => {
                unsafe { write_header(block, size) };
                Buffer::new(block)
            }
            Err(e) => {
                log::debug!("page allocation of {size} bytes failed: {e}");
                Buffer::null()
            }
        }
    }

    unsafe fn free(&self, buffer: Buffer) {
        if buffer.is_null() {
            return;
        }
        let size = unsafe { read_header(buffer) };
        // The header was written after a successful mapping of this size, so the
        // capacity computation cannot overflow here.
        let Some(capacity) = page_capacity(size + HEADER_WIDTH, Self::page_size()) else {
            return;
        };
        if let Err(e) = unsafe { mmap::free(buffer.ptr(), capacity) } {
            log::warn!("failed to release {capacity} mapped bytes at {:p}: {e}", buffer.ptr());
        }
    }

    unsafe fn size(&self, buffer: Buffer) -> usize {
        unsafe { read_header(buffer) }
    }
}
