//! Memory allocation for tensor storage.
//!
//! Every raw block behind a tensor is obtained through [`malloc`] and released
//! through [`free`]. Both go to one process-wide [`Allocator`] (see
//! [`allocator`]), which is a [`CommonAllocator`] unless configured otherwise.
//!
//! Allocators report exhaustion as a null [`Buffer`]. [`malloc`] turns a null
//! result for a nonzero request into an
//! [`ErrorKind::AllocationFailure`](lattice_common::ErrorKind::AllocationFailure).

pub mod allocator;
pub mod buffer;
pub mod common;
pub mod config;
pub mod counter;
pub mod global;
pub mod page;
pub mod tracking;

pub use allocator::{Allocator, HEADER_WIDTH};
pub use buffer::Buffer;
pub use common::CommonAllocator;
pub use config::{AllocatorConfig, AllocatorKind};
pub use global::{allocator, install_allocator, memory_stats};
pub use page::PageAllocator;
pub use tracking::{MemoryStats, TrackingAllocator};

use lattice_common::{Error, Result};

/// Allocates `size` bytes from the process-wide allocator.
///
/// A zero-size request never fails and may return a null buffer.
///
/// # Errors
///
/// Returns `AllocationFailure` carrying `size` when a nonzero request yields a
/// null buffer.
pub fn malloc(size: usize) -> Result<Buffer> {
    malloc_with(allocator(), size)
}

/// Allocates `size` bytes from `allocator`, applying the same failure policy as
/// [`malloc`].
pub fn malloc_with(allocator: &dyn Allocator, size: usize) -> Result<Buffer> {
    let buffer = allocator.malloc(size);
    if size != 0 && buffer.is_null() {
        log::error!("unable to allocate {size} bytes");
        return Err(Error::allocation_failure(size));
    }
    Ok(buffer)
}

/// Returns `buffer` to the process-wide allocator. Freeing a null buffer is a no-op.
///
/// # Safety
///
/// `buffer` must be null or have been returned by [`malloc`] and not freed since.
pub unsafe fn free(buffer: Buffer) {
    unsafe { allocator().free(buffer) }
}

#[cfg(test)]
mod tests {
    use lattice_common::ErrorKind;

    use super::*;

    /// Simulates an exhausted host heap.
    struct ExhaustedAllocator;

    impl Allocator for ExhaustedAllocator {
        fn malloc(&self, _size: usize) -> Buffer {
            Buffer::null()
        }

        unsafe fn free(&self, _buffer: Buffer) {}

        unsafe fn size(&self, _buffer: Buffer) -> usize {
            0
        }
    }

    #[test]
    fn test_exhausted_allocator_escalates() {
        let huge = 1usize << 45;
        let err = malloc_with(&ExhaustedAllocator, huge).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::AllocationFailure { size } if *size == huge));
        assert!(err.to_string().contains(&huge.to_string()));
    }

    #[test]
    fn test_zero_size_never_escalates() {
        let buffer = malloc_with(&ExhaustedAllocator, 0).unwrap();
        assert!(buffer.is_null());
    }

    #[test]
    fn test_host_heap_exhaustion_escalates() {
        let huge = isize::MAX as usize;
        for allocator in [
            &CommonAllocator::new() as &dyn Allocator,
            &PageAllocator::new() as &dyn Allocator,
        ] {
            let err = malloc_with(allocator, huge).unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::AllocationFailure { size } if *size == huge));
            assert_eq!(
                err.to_string(),
                format!("[malloc] Unable to allocate {huge} bytes.")
            );
        }
    }

    #[test]
    fn test_malloc_with_success() {
        let allocator = CommonAllocator::new();
        let buffer = malloc_with(&allocator, 32).unwrap();
        unsafe {
            assert_eq!(allocator.size(buffer), 32);
            allocator.free(buffer);
        }
    }
}
