//! Runs in its own process: the environment is read once, on first use.

use lattice_alloc::{MemoryStats, config::ENV_TRACK_MEMORY, free, malloc, memory_stats};

#[test]
fn test_tracking_env_reports_stats() {
    // SAFETY: this is the only test in the binary, no other thread reads the environment.
    unsafe { std::env::set_var(ENV_TRACK_MEMORY, "1") };

    let a = malloc(1000).unwrap();
    let b = malloc(24).unwrap();
    assert_eq!(
        memory_stats(),
        Some(MemoryStats {
            active: 1024,
            peak: 1024,
            limit: None,
        })
    );

    unsafe { free(a) };
    let stats = memory_stats().unwrap();
    assert_eq!(stats.active, 24);
    assert_eq!(stats.peak, 1024);

    unsafe { free(b) };
    assert_eq!(memory_stats().unwrap().active, 0);
}
