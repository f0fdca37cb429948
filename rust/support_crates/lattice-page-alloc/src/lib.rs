//! Page-granular anonymous memory mappings.
//!
//! `mmap` resolves to the platform implementation: `mmap(2)` on Linux and
//! page-aligned `std::alloc` blocks elsewhere. Both expose the same functions.

#[cfg_attr(target_os = "linux", path = "mmap_linux.rs")]
#[cfg_attr(not(target_os = "linux"), path = "mmap_fallback.rs")]
pub mod mmap;

/// Rounds `size` up to a whole number of pages of `page_size` bytes.
///
/// A zero `size` still occupies one page. Returns `None` when the rounded
/// value does not fit in `usize`.
///
/// `page_size` must be a power of two.
#[inline]
pub fn page_capacity(size: usize, page_size: usize) -> Option<usize> {
    debug_assert!(page_size.is_power_of_two());
    size.max(1)
        .checked_add(page_size - 1)
        .map(|n| n & !(page_size - 1))
}
