//! Process-wide pool configuration.
//!
//! The shard count is fixed for the lifetime of the process: every typed
//! pool sizes its shard array from the value that is current when the first
//! pool is created. Call [`set_recycle_config`] before any allocation goes
//! through the pools; afterwards the configuration is frozen.

use std::sync::OnceLock;

/// Global pool configuration
static GLOBAL_CONFIG: OnceLock<RecycleConfig> = OnceLock::new();

/// Default number of shards per typed pool.
///
/// Shards trade free-list search cost against lock contention: allocation
/// traffic tagged with distinct hints lands on distinct mutexes.
pub const DEFAULT_SHARD_COUNT: usize = 128;

/// Configuration for the buffer-recycling pools
#[derive(Debug, Clone)]
pub struct RecycleConfig {
    /// Number of shards per (element type, backing allocator) pool
    pub shard_count: usize,
}

impl Default for RecycleConfig {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
        }
    }
}

/// Builder for customizing the pool configuration
pub struct RecycleConfigBuilder {
    config: RecycleConfig,
}

impl RecycleConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: RecycleConfig::default(),
        }
    }

    /// Set the number of shards per typed pool
    ///
    /// # Panics
    ///
    /// Panics if `shard_count` is zero.
    pub fn shard_count(mut self, shard_count: usize) -> Self {
        assert!(shard_count > 0, "shard_count must be positive");
        self.config.shard_count = shard_count;
        self
    }

    /// Build the configuration
    pub fn build(self) -> RecycleConfig {
        self.config
    }
}

impl Default for RecycleConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the global pool configuration
pub fn recycle_config() -> &'static RecycleConfig {
    GLOBAL_CONFIG.get_or_init(RecycleConfig::default)
}

/// Set the global pool configuration
///
/// Returns the rejected configuration if the global configuration was
/// already initialised (either by an earlier call or by first pool use).
pub fn set_recycle_config(config: RecycleConfig) -> Result<(), RecycleConfig> {
    GLOBAL_CONFIG.set(config)
}
