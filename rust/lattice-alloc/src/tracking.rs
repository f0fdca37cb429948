//! Memory accounting wrapper around another allocation strategy.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{allocator::Allocator, buffer::Buffer, counter::Counter};

/// Snapshot of the byte counters kept by a [`TrackingAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStats {
    /// Requested bytes of all live buffers.
    pub active: usize,
    /// Highest `active` value since creation or the last peak reset.
    pub peak: usize,
    /// Upper bound on `active`, if one is enforced.
    pub limit: Option<usize>,
}

/// Wraps an allocator, counting active and peak requested bytes and optionally
/// enforcing a limit on active bytes.
///
/// A request that would exceed the limit yields a null buffer, just like host
/// memory exhaustion; the inner allocator is not called.
pub struct TrackingAllocator<A> {
    inner: A,
    active: AtomicUsize,
    peak: AtomicUsize,
    limit: Option<usize>,
    /// Bytes still available under `limit`.
    remaining: Option<Counter>,
}

impl<A: Allocator> TrackingAllocator<A> {
    pub fn new(inner: A) -> TrackingAllocator<A> {
        TrackingAllocator {
            inner,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            limit: None,
            remaining: None,
        }
    }

    pub fn with_limit(inner: A, limit: usize) -> TrackingAllocator<A> {
        TrackingAllocator {
            limit: Some(limit),
            remaining: Some(Counter::new(limit)),
            ..Self::new(inner)
        }
    }

    pub fn active_memory(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub fn peak_memory(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    /// Resets the peak to the current active byte count.
    pub fn reset_peak_memory(&self) {
        self.peak.store(self.active_memory(), Ordering::Release);
    }

    pub fn memory_limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            active: self.active_memory(),
            peak: self.peak_memory(),
            limit: self.limit,
        }
    }
}

impl<A: Allocator> Allocator for TrackingAllocator<A> {
    fn malloc(&self, size: usize) -> Buffer {
        if let Some(remaining) = self.remaining.as_ref() {
            if !remaining.withdraw(size) {
                return Buffer::null();
            }
        }

        let buffer = self.inner.malloc(size);
        if buffer.is_null() && size != 0 {
            if let Some(remaining) = self.remaining.as_ref() {
                remaining.deposit(size);
            }
            return buffer;
        }

        let active = self.active.fetch_add(size, Ordering::AcqRel) + size;
        self.peak.fetch_max(active, Ordering::AcqRel);
        buffer
    }

    unsafe fn free(&self, buffer: Buffer) {
        if buffer.is_null() {
            unsafe { self.inner.free(buffer) };
            return;
        }
        let size = unsafe { self.inner.size(buffer) };
        unsafe { self.inner.free(buffer) };
        self.active.fetch_sub(size, Ordering::AcqRel);
        if let Some(remaining) = self.remaining.as_ref() {
            remaining.deposit(size);
        }
    }

    unsafe fn size(&self, buffer: Buffer) -> usize {
        unsafe { self.inner.size(buffer) }
    }

    unsafe fn data_ptr(&self, buffer: Buffer) -> *mut u8 {
        unsafe { self.inner.data_ptr(buffer) }
    }
}

impl<A> std::fmt::Debug for TrackingAllocator<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingAllocator")
            .field("active", &self.active.load(Ordering::Relaxed))
            .field("peak", &self.peak.load(Ordering::Relaxed))
            .field("limit", &self.limit)
            .field("remaining", &self.remaining.as_ref().map(Counter::read))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommonAllocator;

    #[test]
    fn test_active_and_peak() {
        let allocator = TrackingAllocator::new(CommonAllocator::new());
        let a = allocator.malloc(100);
        let b = allocator.malloc(50);
        assert_eq!(allocator.active_memory(), 150);
        assert_eq!(allocator.peak_memory(), 150);

        unsafe { allocator.free(a) };
        assert_eq!(allocator.active_memory(), 50);
        assert_eq!(allocator.peak_memory(), 150);

        allocator.reset_peak_memory();
        assert_eq!(allocator.peak_memory(), 50);

        unsafe { allocator.free(b) };
        assert_eq!(allocator.active_memory(), 0);
        assert_eq!(allocator.memory_limit(), None);
    }

    #[test]
    fn test_limit_returns_null() {
        let allocator = TrackingAllocator::with_limit(CommonAllocator::new(), 1000);
        let a = allocator.malloc(600);
        assert!(!a.is_null());
        assert!(allocator.malloc(500).is_null());
        assert_eq!(allocator.active_memory(), 600);

        unsafe { allocator.free(a) };
        let b = allocator.malloc(1000);
        assert!(!b.is_null());
        unsafe {
            assert_eq!(allocator.size(b), 1000);
            allocator.free(b);
        }
        assert_eq!(
            allocator.stats(),
            MemoryStats {
                active: 0,
                peak: 1000,
                limit: Some(1000),
            }
        );
    }

    #[test]
    fn test_inner_failure_restores_budget() {
        let allocator = TrackingAllocator::with_limit(CommonAllocator::new(), usize::MAX);
        assert!(allocator.malloc(usize::MAX).is_null());
        assert_eq!(allocator.active_memory(), 0);
        let b = allocator.malloc(16);
        assert!(!b.is_null());
        unsafe { allocator.free(b) };
    }

    #[test]
    fn test_debug_shows_remaining_budget() {
        let allocator = TrackingAllocator::with_limit(CommonAllocator::new(), 100);
        let buffer = allocator.malloc(30);
        let text = format!("{allocator:?}");
        assert!(text.contains("active: 30"), "{text}");
        assert!(text.contains("remaining: Some(70)"), "{text}");
        unsafe { allocator.free(buffer) };

        let untracked = TrackingAllocator::new(CommonAllocator::new());
        assert!(format!("{untracked:?}").contains("remaining: None"));
    }

    #[test]
    fn test_null_free_is_not_counted() {
        let allocator = TrackingAllocator::new(CommonAllocator::new());
        unsafe { allocator.free(Buffer::null()) };
        assert_eq!(allocator.active_memory(), 0);
    }
}
