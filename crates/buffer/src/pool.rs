//! Pool of reusable regions for [`PooledBuffer`](crate::PooledBuffer).
//!
//! The pool keeps a bounded free list of `BytesMut` regions. Acquiring a
//! buffer reuses the first free region that is large enough; releasing the
//! last reference hands the region back.

use crate::config::BufferConfig;
use crate::pooled::PooledBuffer;
use bytes::BytesMut;
use parking_lot::Mutex;
use std::sync::Arc;
use strata_core::Result;
use tracing::trace;

/// Cheaply clonable handle to a shared region pool.
///
/// The pool itself is `Send + Sync`; the buffers it hands out are not
/// meant to be shared.
#[derive(Debug, Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    free: Mutex<Vec<BytesMut>>,
    max_regions: usize,
    default_capacity: usize,
    max_capacity: usize,
}

impl BufferPool {
    /// Pool sized from `config`, which must pass [`BufferConfig::validate`].
    pub fn new(config: &BufferConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: &BufferConfig) -> Self {
        BufferPool {
            inner: Arc::new(PoolInner {
                free: Mutex::new(Vec::with_capacity(config.pool_max_regions)),
                max_regions: config.pool_max_regions,
                default_capacity: config.initial_capacity,
                max_capacity: config.max_capacity,
            }),
        }
    }

    /// Buffer with the pool's default capacity.
    pub fn acquire_default(&self) -> PooledBuffer {
        self.acquire(self.inner.default_capacity)
    }

    /// Buffer with at least `capacity` bytes of room.
    pub fn acquire(&self, capacity: usize) -> PooledBuffer {
        let region = {
            let mut free = self.inner.free.lock();
            free.iter()
                .position(|region| region.capacity() >= capacity)
                .map(|index| free.swap_remove(index))
        };
        let region = match region {
            Some(region) => {
                trace!(target: "strata::buffer", capacity = region.capacity(), "Reusing pooled region");
                region
            }
            None => BytesMut::with_capacity(capacity),
        };
        PooledBuffer::from_pool(region, self.clone(), self.inner.max_capacity)
    }

    /// Return a region to the free list, or drop it if the list is full.
    pub(crate) fn recycle(&self, mut region: BytesMut) {
        region.clear();
        let mut free = self.inner.free.lock();
        if free.len() < self.inner.max_regions {
            trace!(target: "strata::buffer", capacity = region.capacity(), "Recycled region");
            free.push(region);
        } else {
            trace!(target: "strata::buffer", capacity = region.capacity(), "Pool full; dropping region");
        }
    }

    /// Number of regions waiting for reuse.
    pub fn free_regions(&self) -> usize {
        self.inner.free.lock().len()
    }

    /// Largest capacity buffers from this pool may grow to.
    pub fn max_capacity(&self) -> usize {
        self.inner.max_capacity
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        BufferPool::from_valid(&BufferConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Buffer;

    #[test]
    fn test_release_returns_region() {
        let pool = BufferPool::new(&BufferConfig::for_testing()).unwrap();
        let mut buf = pool.acquire(128);
        buf.write_i64(1).unwrap();
        assert_eq!(pool.free_regions(), 0);

        buf.release();
        assert_eq!(pool.free_regions(), 1);
    }

    #[test]
    fn test_acquire_reuses_large_enough_region() {
        let pool = BufferPool::new(&BufferConfig::for_testing()).unwrap();
        let mut buf = pool.acquire(256);
        buf.release();

        let reused = pool.acquire(64);
        assert!(reused.capacity() >= 256);
        assert_eq!(reused.length(), 0);
        assert_eq!(pool.free_regions(), 0);
    }

    #[test]
    fn test_acquire_skips_small_regions() {
        let pool = BufferPool::new(&BufferConfig::for_testing()).unwrap();
        let mut small = pool.acquire(8);
        small.release();

        let big = pool.acquire(4096);
        assert!(big.capacity() >= 4096);
        assert_eq!(pool.free_regions(), 1);
    }

    #[test]
    fn test_pool_is_bounded() {
        let config = BufferConfig::for_testing().with_pool_max_regions(2);
        let pool = BufferPool::new(&config).unwrap();
        let mut buffers: Vec<_> = (0..4).map(|_| pool.acquire(16)).collect();
        for buf in &mut buffers {
            buf.release();
        }
        assert_eq!(pool.free_regions(), 2);
    }

    #[test]
    fn test_drop_returns_region() {
        let pool = BufferPool::new(&BufferConfig::for_testing()).unwrap();
        {
            let _buf = pool.acquire_default();
        }
        assert_eq!(pool.free_regions(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = BufferConfig::for_testing()
            .with_initial_capacity(128)
            .with_max_capacity(64);
        let err = BufferPool::new(&config).unwrap_err();
        assert!(matches!(err, strata_core::Error::InvalidState(_)));
        assert!(BufferPool::new(&BufferConfig::new().with_initial_capacity(0)).is_err());
    }
}
