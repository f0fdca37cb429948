use std::sync::atomic::{AtomicUsize, Ordering};

/// A thread-safe byte counter that never goes below zero.
///
/// Multiple consumers withdraw amounts (if enough remains) and deposit them back.
/// [`TrackingAllocator`](crate::TrackingAllocator) keeps one as the bytes still
/// available under its memory limit.
///
/// All updates are atomic, so the counter may be shared between threads without
/// a lock.
#[derive(Debug)]
pub struct Counter(AtomicUsize);

impl Counter {
    /// Creates a new `Counter` holding `amount` bytes.
    pub fn new(amount: usize) -> Counter {
        Counter(AtomicUsize::new(amount))
    }

    /// Attempts to withdraw `amount` bytes from the counter.
    ///
    /// If the counter holds at least `amount`, it is decreased by `amount` and
    /// `true` is returned. Otherwise the counter is left unchanged and `false` is
    /// returned.
    ///
    /// Concurrent withdrawals race through a compare-and-exchange loop, so the
    /// total withdrawn never exceeds what was deposited.
    ///
    /// # Arguments
    ///
    /// * `amount` - The number of bytes to withdraw. Withdrawing 0 always succeeds.
    ///
    /// # Returns
    ///
    /// `true` if the withdrawal was successful, `false` otherwise.
    pub fn withdraw(&self, amount: usize) -> bool {
        let mut current = self.0.load(Ordering::Relaxed);
        while current >= amount {
            match self.0.compare_exchange_weak(
                current,
                current - amount,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(updated) => current = updated,
            }
        }
        false
    }

    /// Returns `amount` bytes to the counter.
    pub fn deposit(&self, amount: usize) {
        self.0.fetch_add(amount, Ordering::AcqRel);
    }

    /// Returns the number of bytes currently held.
    ///
    /// **Note**: This is intended for diagnostics. In a concurrent environment the
    /// value may be outdated by the time it is used.
    pub fn read(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }
}
