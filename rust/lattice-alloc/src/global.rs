//! The process-wide allocator instance.

use std::sync::OnceLock;

use lattice_common::{Error, Result};

use crate::{
    allocator::Allocator,
    config::AllocatorConfig,
    tracking::{MemoryStats, TrackingAllocator},
};

enum GlobalAllocator {
    Plain(Box<dyn Allocator>),
    Tracking(TrackingAllocator<Box<dyn Allocator>>),
}

impl GlobalAllocator {
    fn from_config(config: &AllocatorConfig) -> GlobalAllocator {
        match config.build_tracking() {
            Some(tracking) => GlobalAllocator::Tracking(tracking),
            None => GlobalAllocator::Plain(config.build()),
        }
    }

    fn as_dyn(&self) -> &dyn Allocator {
        match self {
            GlobalAllocator::Plain(allocator) => allocator.as_ref(),
            GlobalAllocator::Tracking(allocator) => allocator,
        }
    }
}

static GLOBAL: OnceLock<GlobalAllocator> = OnceLock::new();

/// Returns the process-wide allocator, creating it on first access.
///
/// Unless [`install_allocator`] ran first, the strategy comes from
/// [`AllocatorConfig::from_env`]; a malformed environment falls back to the
/// default [`CommonAllocator`](crate::CommonAllocator). The instance lives until
/// the process exits.
pub fn allocator() -> &'static dyn Allocator {
    GLOBAL.get_or_init(init_from_env).as_dyn()
}

/// Registers `allocator` as the process-wide allocator.
///
/// Must run before the first call to [`allocator`], [`malloc`](crate::malloc) or
/// [`free`](crate::free); afterwards it fails with
/// [`ErrorKind::AlreadyInitialized`](lattice_common::ErrorKind::AlreadyInitialized).
pub fn install_allocator(allocator: Box<dyn Allocator>) -> Result<()> {
    GLOBAL
        .set(GlobalAllocator::Plain(allocator))
        .map_err(|_| Error::already_initialized())?;
    log::debug!("installed custom global allocator");
    Ok(())
}

/// Byte counters of the process-wide allocator when it was built with tracking
/// (`LATTICE_TRACK_MEMORY` or `LATTICE_MEMORY_LIMIT`).
///
/// Returns `None` if the allocator is untracked or has not been created yet.
/// Querying does not create it, so [`install_allocator`] may still run afterwards.
pub fn memory_stats() -> Option<MemoryStats> {
    match GLOBAL.get()? {
        GlobalAllocator::Tracking(allocator) => Some(allocator.stats()),
        GlobalAllocator::Plain(_) => None,
    }
}

fn init_from_env() -> GlobalAllocator {
    let config = AllocatorConfig::from_env().unwrap_or_else(|e| {
        log::warn!("ignoring allocator environment configuration: {e}");
        AllocatorConfig::default()
    });
    log::debug!("creating global allocator: {config:?}");
    GlobalAllocator::from_config(&config)
}
