//! # Runtime configuration.
//!
//! Provides [`Config`] (settings for the [`Warden`](crate::Warden)) and
//! [`PoolConfig`] (sizing of a [`WorkerPool`](crate::WorkerPool)).
//!
//! ## Sentinel values
//! - `grace = 0s` → do not wait for stewards on shutdown
//! - `heartbeat_capacity = 0` → clamped to 1
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

/// Global configuration for the warden runtime.
///
/// ## Field semantics
/// - `grace`: maximum wait for stewards to stop after shutdown is requested
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `steward_timeout`: default heartbeat timeout for stewards built by the warden
/// - `heartbeat_capacity`: queue size of the upstream heartbeat of stewards built by the warden (min 1; beats beyond it are dropped)
/// - `pool`: default sizing for pools built by the warden
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for stewards to exit on shutdown.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel.
    ///
    /// Slow subscribers lagging more than `bus_capacity` events skip older items.
    pub bus_capacity: usize,

    /// Default silence window after which a steward restarts its ward.
    ///
    /// The ward is asked to beat every `steward_timeout / 2`.
    pub steward_timeout: Duration,

    /// Capacity of the upstream heartbeat of warden-built stewards.
    ///
    /// Wards size their own heartbeat (`WardFn::with_capacity`; `Ticker` uses 1).
    pub heartbeat_capacity: usize,

    /// Default pool sizing.
    pub pool: PoolConfig,
}

impl Config {
    /// Returns the bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the heartbeat capacity clamped to a minimum of 1.
    #[inline]
    pub fn heartbeat_capacity_clamped(&self) -> usize {
        self.heartbeat_capacity.max(1)
    }

    /// Returns the shutdown grace as an `Option` (`None` when zero).
    #[inline]
    pub fn grace(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 30s`
    /// - `bus_capacity = 1024`
    /// - `steward_timeout = 10s` (wards beat every 5s)
    /// - `heartbeat_capacity = 1`
    /// - `pool = PoolConfig::default()`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
            steward_timeout: Duration::from_secs(10),
            heartbeat_capacity: 1,
            pool: PoolConfig::default(),
        }
    }
}

/// Sizing of a worker pool.
///
/// `workers` and `queue_capacity` must be positive; the pool rejects zeros
/// with a [`ConfigError`](crate::ConfigError). `fault_capacity = 0` is clamped to 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of concurrent executors.
    pub workers: usize,
    /// Capacity of the shared job queue.
    pub queue_capacity: usize,
    /// Capacity of the fault queue; faults beyond it are dropped.
    pub fault_capacity: usize,
}

impl PoolConfig {
    /// Creates a config with the given sizes.
    pub fn new(workers: usize, queue_capacity: usize, fault_capacity: usize) -> Self {
        Self {
            workers,
            queue_capacity,
            fault_capacity,
        }
    }

    #[inline]
    pub(crate) fn fault_capacity_clamped(&self) -> usize {
        self.fault_capacity.max(1)
    }
}

impl Default for PoolConfig {
    /// `workers = 4`, `queue_capacity = 64`, `fault_capacity = 16`.
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 64,
            fault_capacity: 16,
        }
    }
}
