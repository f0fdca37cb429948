//! Runs in its own process: querying stats must not create the global allocator.

use lattice_alloc::{
    Allocator, PageAllocator, allocator, free, install_allocator, malloc, memory_stats,
};

#[test]
fn test_memory_stats_does_not_block_install() {
    assert_eq!(memory_stats(), None);
    install_allocator(Box::new(PageAllocator::new())).unwrap();

    let buffer = malloc(100).unwrap();
    assert!((buffer.ptr() as usize).is_multiple_of(PageAllocator::page_size()));
    unsafe {
        assert_eq!(allocator().size(buffer), 100);
        free(buffer);
    }
    assert_eq!(memory_stats(), None);
}
