//! Growth and continuation strategies for the growable backend.
//!
//! When a write would cross the limit, the buffer hands its region to an
//! [`ExtensionStrategy`], which must leave room for the write while
//! preserving every byte written so far. When a read would cross the limit,
//! the buffer hands its region to a [`ContinuationStrategy`], which advances
//! the read frontier (for example by pulling more journal bytes from disk)
//! and is free to discard bytes that were already consumed.
//!
//! Strategies are the only place in this layer where blocking I/O may
//! happen.

use crate::region::Region;
use std::io::{ErrorKind, Read};
use strata_core::{Error, Result};
use tracing::{debug, trace};

/// Makes room for writes past the current limit.
pub trait ExtensionStrategy: Send {
    /// Ensure at least `required` bytes fit after `region.position()`.
    ///
    /// `current_limit` is the limit at the time the write was attempted.
    /// Implementations that swap the region must carry over `[0, position)`
    /// and release the old one.
    fn extend(&mut self, current_limit: usize, required: usize, region: &mut Region) -> Result<()>;
}

/// Supplies more readable bytes once the current ones run out.
pub trait ContinuationStrategy: Send {
    /// Ensure at least `required` bytes are readable from `region.position()`.
    ///
    /// Bytes before the position may be dropped; the position may move.
    fn continue_reading(&mut self, required: usize, region: &mut Region) -> Result<()>;
}

/// Smallest power of two strictly greater than `size`.
///
/// Returns `None` on overflow.
pub fn next_power_of_two_above(size: usize) -> Option<usize> {
    size.checked_add(1)?.checked_next_power_of_two()
}

/// Reallocates to the next power of two above the required size and copies
/// the written prefix across.
#[derive(Debug, Clone, Copy)]
pub struct PowerOfTwoExtension {
    max_capacity: usize,
}

impl PowerOfTwoExtension {
    /// Extension that never grows past `max_capacity`.
    pub fn new(max_capacity: usize) -> Self {
        PowerOfTwoExtension { max_capacity }
    }

    /// Largest capacity this strategy will allocate.
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }
}

impl ExtensionStrategy for PowerOfTwoExtension {
    fn extend(&mut self, current_limit: usize, required: usize, region: &mut Region) -> Result<()> {
        let needed = region
            .position()
            .checked_add(required)
            .filter(|needed| *needed <= self.max_capacity)
            .ok_or(Error::GrowthFailure {
                requested: region.position().saturating_add(required),
                max: self.max_capacity,
            })?;
        let capacity = next_power_of_two_above(needed)
            .unwrap_or(self.max_capacity)
            .min(self.max_capacity);

        let mut grown = Region::allocate(capacity)?;
        grown.put(region.written())?;
        debug!(
            target: "strata::buffer",
            from_limit = current_limit,
            from_capacity = region.capacity(),
            to_capacity = capacity,
            "Extended buffer region"
        );
        std::mem::replace(region, grown).release();
        Ok(())
    }
}

/// Continuation for buffers that only ever read what they already hold.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContinuation;

impl ContinuationStrategy for NoContinuation {
    fn continue_reading(&mut self, required: usize, region: &mut Region) -> Result<()> {
        Err(Error::Underflow {
            requested: required,
            available: region.remaining(),
            position: region.position(),
        })
    }
}

/// Refills the region from an [`io::Read`](std::io::Read) source.
///
/// Unread bytes are compacted to the front of the region and the remainder
/// is filled from the source. The region is enlarged when a single read
/// needs more than its capacity.
#[derive(Debug)]
pub struct ReaderContinuation<R> {
    source: R,
    exhausted: bool,
}

impl<R: Read + Send> ReaderContinuation<R> {
    /// Pull bytes from `source` on demand.
    pub fn new(source: R) -> Self {
        ReaderContinuation {
            source,
            exhausted: false,
        }
    }

    /// Whether the source has reported end of stream.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Give the source back.
    pub fn into_inner(self) -> R {
        self.source
    }
}

impl<R: Read + Send> ContinuationStrategy for ReaderContinuation<R> {
    fn continue_reading(&mut self, required: usize, region: &mut Region) -> Result<()> {
        if required > region.capacity() {
            let capacity = next_power_of_two_above(required).ok_or(Error::GrowthFailure {
                requested: required,
                max: usize::MAX,
            })?;
            let mut bigger = Region::allocate(capacity)?;
            bigger.put(region.unread())?;
            std::mem::replace(region, bigger).release();
        } else {
            region.compact();
        }

        let mut filled = region.position();
        while filled < required && !self.exhausted {
            match self.source.read(&mut region.as_mut_slice()[filled..]) {
                Ok(0) => self.exhausted = true,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        trace!(
            target: "strata::buffer",
            required,
            filled,
            exhausted = self.exhausted,
            "Continued buffer from source"
        );

        region.set_limit(filled)?;
        region.set_position(0)
    }
}
