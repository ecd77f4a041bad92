//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the supervisor runtime.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 by [`Bus`](crate::Bus)
//! - `pump_buffer = 0` → clamped to 1 byte reads

/// Global configuration for the supervisor runtime.
#[derive(Clone, Debug)]
pub struct Config {
    /// Character that starts a shard-selection line on stdin (`:Caves`).
    pub selector: char,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages
    /// skip older items.
    pub bus_capacity: usize,

    /// Read size used when copying shard stdout/stderr.
    pub pump_buffer: usize,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a pump read size clamped to a minimum of 1.
    #[inline]
    pub fn pump_buffer_clamped(&self) -> usize {
        self.pump_buffer.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `selector = ':'`
    /// - `bus_capacity = 1024`
    /// - `pump_buffer = 8 KiB`
    fn default() -> Self {
        Self {
            selector: ':',
            bus_capacity: 1024,
            pump_buffer: 8 * 1024,
        }
    }
}
