//! Selection of the process-wide allocation strategy.

use std::str::FromStr;

use lattice_common::{Error, Result, verify_arg};

use crate::{
    allocator::Allocator, common::CommonAllocator, page::PageAllocator,
    tracking::TrackingAllocator,
};

/// Environment variable naming the strategy: `common` or `page`.
pub const ENV_ALLOCATOR: &str = "LATTICE_ALLOCATOR";
/// Environment variable holding a limit on active bytes.
pub const ENV_MEMORY_LIMIT: &str = "LATTICE_MEMORY_LIMIT";
/// Environment variable turning on active/peak byte accounting.
pub const ENV_TRACK_MEMORY: &str = "LATTICE_TRACK_MEMORY";

/// Built-in allocation strategies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AllocatorKind {
    /// Host heap, see [`CommonAllocator`].
    #[default]
    Common,
    /// Anonymous page mappings, see [`PageAllocator`].
    Page,
}

impl FromStr for AllocatorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "common" => Ok(AllocatorKind::Common),
            "page" => Ok(AllocatorKind::Page),
            other => Err(Error::invalid_config(
                ENV_ALLOCATOR,
                format!("unknown allocator '{other}', expected 'common' or 'page'"),
            )),
        }
    }
}

/// Describes how to build the global allocator.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AllocatorConfig {
    pub kind: AllocatorKind,
    /// Limit on active requested bytes. Implies tracking.
    pub memory_limit: Option<usize>,
    /// Wrap the strategy in a [`TrackingAllocator`] even without a limit.
    pub track_usage: bool,
}

impl AllocatorConfig {
    /// Reads the configuration from the process environment.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<AllocatorConfig> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<AllocatorConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AllocatorConfig::default();
        if let Some(kind) = lookup(ENV_ALLOCATOR) {
            config.kind = kind.parse()?;
        }
        if let Some(limit) = lookup(ENV_MEMORY_LIMIT) {
            let limit = limit.trim().parse::<usize>().map_err(|e| {
                Error::invalid_config(ENV_MEMORY_LIMIT, format!("'{limit}': {e}"))
            })?;
            config.memory_limit = Some(limit);
        }
        if let Some(flag) = lookup(ENV_TRACK_MEMORY) {
            config.track_usage = parse_flag(ENV_TRACK_MEMORY, &flag)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(memory_limit) = self.memory_limit {
            verify_arg!(memory_limit, memory_limit > 0);
        }
        Ok(())
    }

    /// Whether [`build`](Self::build) wraps the strategy in a [`TrackingAllocator`].
    pub fn is_tracking(&self) -> bool {
        self.track_usage || self.memory_limit.is_some()
    }

    /// Constructs the configured strategy.
    pub fn build(&self) -> Box<dyn Allocator> {
        match (self.kind, self.memory_limit) {
            (AllocatorKind::Common, None) if !self.track_usage => Box::new(CommonAllocator::new()),
            (AllocatorKind::Page, None) if !self.track_usage => Box::new(PageAllocator::new()),
            (AllocatorKind::Common, limit) => Box::new(tracking(CommonAllocator::new(), limit)),
            (AllocatorKind::Page, limit) => Box::new(tracking(PageAllocator::new(), limit)),
        }
    }

    /// Like [`build`](Self::build), but keeps the concrete tracking type so its
    /// counters stay reachable. Returns `None` when tracking is off.
    pub(crate) fn build_tracking(&self) -> Option<TrackingAllocator<Box<dyn Allocator>>> {
        if !self.is_tracking() {
            return None;
        }
        let inner = AllocatorConfig {
            kind: self.kind,
            memory_limit: None,
            track_usage: false,
        }
        .build();
        Some(tracking(inner, self.memory_limit))
    }
}

fn tracking<A: Allocator>(inner: A, limit: Option<usize>) -> TrackingAllocator<A> {
    match limit {
        Some(limit) => TrackingAllocator::with_limit(inner, limit),
        None => TrackingAllocator::new(inner),
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(Error::invalid_config(
            name,
            format!("'{other}' is not a boolean flag"),
        )),
    }
}
