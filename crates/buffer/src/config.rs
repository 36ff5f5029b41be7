//! Buffer configuration.
//!
//! This module provides sizing configuration shared by both buffer backends.

use strata_core::MAX_FRAMED_LEN;

/// Buffer sizing parameters.
#[derive(Debug, Clone)]
pub struct BufferConfig {
    /// Capacity a new buffer starts with (default: 3KB).
    pub initial_capacity: usize,

    /// Largest capacity growth may reach (default: `i32::MAX`).
    ///
    /// Every position has to fit the 4-byte length field of a record, so
    /// this can never exceed `i32::MAX`.
    pub max_capacity: usize,

    /// Number of released regions a [`BufferPool`](crate::BufferPool) keeps
    /// for reuse (default: 64).
    pub pool_max_regions: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        BufferConfig {
            initial_capacity: 3 * 1024, // 3KB
            max_capacity: MAX_FRAMED_LEN,
            pool_max_regions: 64,
        }
    }
}

impl BufferConfig {
    /// Create a new buffer configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set initial capacity (builder pattern).
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set maximum capacity (builder pattern).
    pub fn with_max_capacity(mut self, capacity: usize) -> Self {
        self.max_capacity = capacity;
        self
    }

    /// Set how many recycled regions a pool retains (builder pattern).
    pub fn with_pool_max_regions(mut self, regions: usize) -> Self {
        self.pool_max_regions = regions;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), BufferConfigError> {
        if self.initial_capacity == 0 {
            return Err(BufferConfigError::ZeroInitialCapacity);
        }
        if self.max_capacity > MAX_FRAMED_LEN {
            return Err(BufferConfigError::MaxCapacityTooLarge);
        }
        if self.initial_capacity > self.max_capacity {
            return Err(BufferConfigError::InitialExceedsMax);
        }
        Ok(())
    }

    /// Create a configuration optimized for testing (tiny buffers, frequent growth).
    pub fn for_testing() -> Self {
        BufferConfig {
            initial_capacity: 16,
            max_capacity: 1024 * 1024, // 1MB
            pool_max_regions: 4,
        }
    }
}

/// Buffer configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferConfigError {
    /// Initial capacity must be non-zero.
    #[error("Initial capacity must be at least 1 byte")]
    ZeroInitialCapacity,

    /// Initial capacity exceeds maximum capacity.
    #[error("Initial capacity cannot exceed max capacity")]
    InitialExceedsMax,

    /// Maximum capacity does not fit a 32-bit length field.
    #[error("Max capacity cannot exceed i32::MAX")]
    MaxCapacityTooLarge,
}

impl From<BufferConfigError> for strata_core::Error {
    fn from(e: BufferConfigError) -> Self {
        strata_core::Error::InvalidState(format!("invalid buffer config: {}", e))
    }
}
