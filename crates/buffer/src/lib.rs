//! Binary buffers for Strata journal and snapshot persistence
//!
//! This crate provides the byte storage the record codec writes into:
//!
//! - Buffer: Cursor-based read/write contract shared by every backend
//! - GrowableBuffer: One contiguous region, swapped out by pluggable
//!   extension/continuation strategies; supports size framing and windows
//! - PooledBuffer: Pool-managed, reference-counted region with independent
//!   cursors; framing is inert and windowing unsupported
//! - BufferPool: Bounded free list of regions for pooled buffers
//! - BufferConfig: Capacity limits shared by both backends
//!
//! Integers are big-endian on both backends, so bytes written by one can be
//! read by the other.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod growable;
pub mod pool;
pub mod pooled;
pub mod region;
pub mod strategy;
pub mod traits;

pub use config::{BufferConfig, BufferConfigError};
pub use growable::GrowableBuffer;
pub use pool::BufferPool;
pub use pooled::PooledBuffer;
pub use region::Region;
pub use strategy::{
    next_power_of_two_above, ContinuationStrategy, ExtensionStrategy, NoContinuation,
    PowerOfTwoExtension, ReaderContinuation,
};
pub use traits::{Buffer, FramedBuffer};
