//! Growable buffer over a single contiguous region.
//!
//! # Cursor model
//!
//! Reading and writing share **one** position. A freshly written buffer is
//! read back by calling [`GrowableBuffer::flip`] (or repositioning to 0).
//! This backend therefore suits write-then-read-once usage, which is how the
//! journal channel uses it. Because a reader mark would alias the writer
//! position, [`Buffer::mark_reader`] and [`Buffer::reset_reader`] fail with
//! `UnsupportedCapability`.
//!
//! # Growth
//!
//! A write that would cross the limit goes through the
//! [`ExtensionStrategy`]; a read that would cross it goes through the
//! [`ContinuationStrategy`]. After an extension:
//! - the writer mark keeps its offset,
//! - a size mark that now lies beyond the writer position is dropped
//!   (the placeholder it pointed at is gone),
//! - a limit deferred by [`Buffer::set_limit`] is applied.
//!
//! Reads inside a [`limit_next`](Buffer::limit_next) window never trigger a
//! continuation; they fail with `Underflow`.

use crate::config::BufferConfig;
use crate::region::Region;
use crate::strategy::{ContinuationStrategy, ExtensionStrategy, NoContinuation, PowerOfTwoExtension};
use crate::traits::{Buffer, FramedBuffer};
use byteorder::{BigEndian, ByteOrder};
use std::fmt;
use strata_core::{Error, Result, MAX_FRAMED_LEN, SIZE_FIELD_LEN};
use tracing::{trace, warn};

const BACKEND: &str = "growable";

/// Buffer over one region, replaced wholesale when it runs out of room.
pub struct GrowableBuffer {
    region: Region,
    extension: Box<dyn ExtensionStrategy>,
    continuation: Box<dyn ContinuationStrategy>,
    /// Offset of the outstanding length placeholder
    size_mark: Option<usize>,
    writer_mark: Option<usize>,
    /// Limit requested beyond capacity, applied after the next extension
    deferred_limit: Option<usize>,
    /// Limit saved by `limit_next`
    window: Option<usize>,
    released: bool,
}

impl GrowableBuffer {
    /// Buffer with `capacity` bytes, power-of-two growth and no continuation.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self::with_strategies(
            Region::allocate(capacity)?,
            PowerOfTwoExtension::new(MAX_FRAMED_LEN),
            NoContinuation,
        ))
    }

    /// Buffer sized from `config`, which must pass [`BufferConfig::validate`].
    pub fn with_config(config: &BufferConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_strategies(
            Region::allocate(config.initial_capacity)?,
            PowerOfTwoExtension::new(config.max_capacity),
            NoContinuation,
        ))
    }

    /// Read-side buffer over bytes that are already in memory.
    pub fn wrap(bytes: Vec<u8>) -> Self {
        Self::with_strategies(
            Region::from_vec(bytes),
            PowerOfTwoExtension::new(MAX_FRAMED_LEN),
            NoContinuation,
        )
    }

    /// Buffer with caller-supplied strategies.
    pub fn with_strategies(
        region: Region,
        extension: impl ExtensionStrategy + 'static,
        continuation: impl ContinuationStrategy + 'static,
    ) -> Self {
        GrowableBuffer {
            region,
            extension: Box::new(extension),
            continuation: Box::new(continuation),
            size_mark: None,
            writer_mark: None,
            deferred_limit: None,
            window: None,
            released: false,
        }
    }

    /// limit := position, position := 0.
    pub fn flip(&mut self) {
        self.region.flip();
    }

    /// The current backing region.
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Limit waiting for the next extension, if any.
    pub fn deferred_limit(&self) -> Option<usize> {
        self.deferred_limit
    }

    /// Whether [`Buffer::release`] has run.
    pub fn is_released(&self) -> bool {
        self.released
    }

    fn ensure_writable(&mut self, len: usize) -> Result<()> {
        if self.region.remaining() >= len {
            return Ok(());
        }

        let current_limit = self.region.limit();
        self.extension.extend(current_limit, len, &mut self.region)?;
        self.drop_stale_size_mark();
        if let Some(limit) = self.deferred_limit.take() {
            self.set_limit(limit)?;
        }

        if self.region.remaining() < len {
            return Err(Error::GrowthFailure {
                requested: self.region.position().saturating_add(len),
                max: self.region.limit(),
            });
        }
        Ok(())
    }

    fn ensure_readable(&mut self, len: usize) -> Result<()> {
        if self.region.remaining() >= len {
            return Ok(());
        }
        if self.window.is_none() {
            self.continuation.continue_reading(len, &mut self.region)?;
            self.drop_stale_size_mark();
        }

        if self.region.remaining() < len {
            return Err(Error::Underflow {
                requested: len,
                available: self.region.remaining(),
                position: self.region.position(),
            });
        }
        Ok(())
    }

    fn drop_stale_size_mark(&mut self) {
        if let Some(mark) = self.size_mark {
            if self.region.position() < mark {
                warn!(
                    target: "strata::buffer",
                    size_mark = mark,
                    position = self.region.position(),
                    "Region swap moved position behind the size mark; dropping it"
                );
                self.size_mark = None;
            }
        }
    }
}

impl Buffer for GrowableBuffer {
    fn capacity(&self) -> usize {
        self.region.capacity()
    }

    fn length(&self) -> usize {
        self.region.position()
    }

    fn remaining(&self) -> usize {
        self.region.remaining()
    }

    fn limit(&self) -> usize {
        self.region.limit()
    }

    fn set_limit(&mut self, limit: usize) -> Result<()> {
        if limit > self.region.capacity() {
            trace!(
                target: "strata::buffer",
                limit,
                capacity = self.region.capacity(),
                "Deferring limit until next extension"
            );
            self.deferred_limit = Some(limit);
            return Ok(());
        }
        self.deferred_limit = None;
        self.region.set_limit(limit)
    }

    fn reader_position(&self) -> usize {
        self.region.position()
    }

    fn writer_position(&self) -> usize {
        self.region.position()
    }

    fn set_reader_position(&mut self, position: usize) -> Result<()> {
        self.region.set_position(position)
    }

    fn set_writer_position(&mut self, position: usize) -> Result<()> {
        self.region.set_position(position)
    }

    fn clear(&mut self) {
        self.region.clear();
        self.size_mark = None;
        self.writer_mark = None;
        self.window = None;
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        std::mem::replace(&mut self.region, Region::from_vec(Vec::new())).release();
        self.size_mark = None;
        self.writer_mark = None;
        self.window = None;
        self.released = true;
        trace!(target: "strata::buffer", "Released growable buffer");
    }

    fn is_available(&mut self) -> Result<bool> {
        match self.ensure_readable(1) {
            Ok(()) => Ok(true),
            Err(Error::Underflow { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.ensure_writable(1)?;
        self.region.take_mut(1)[0] = value;
        Ok(())
    }

    fn write_i16(&mut self, value: i16) -> Result<()> {
        self.ensure_writable(2)?;
        BigEndian::write_i16(self.region.take_mut(2), value);
        Ok(())
    }

    fn write_i32(&mut self, value: i32) -> Result<()> {
        self.ensure_writable(4)?;
        BigEndian::write_i32(self.region.take_mut(4), value);
        Ok(())
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.ensure_writable(8)?;
        BigEndian::write_i64(self.region.take_mut(8), value);
        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_writable(data.len())?;
        self.region.take_mut(data.len()).copy_from_slice(data);
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.ensure_readable(1)?;
        Ok(self.region.take(1)[0])
    }

    fn read_i16(&mut self) -> Result<i16> {
        self.ensure_readable(2)?;
        Ok(BigEndian::read_i16(self.region.take(2)))
    }

    fn read_i32(&mut self) -> Result<i32> {
        self.ensure_readable(4)?;
        Ok(BigEndian::read_i32(self.region.take(4)))
    }

    fn read_i64(&mut self) -> Result<i64> {
        self.ensure_readable(8)?;
        Ok(BigEndian::read_i64(self.region.take(8)))
    }

    fn read_slice(&mut self, len: usize) -> Result<&[u8]> {
        self.ensure_readable(len)?;
        Ok(self.region.take(len))
    }

    fn written(&self) -> &[u8] {
        self.region.written()
    }

    fn readable(&self) -> &[u8] {
        self.region.unread()
    }

    fn mark_reader(&mut self) -> Result<()> {
        Err(Error::unsupported("mark_reader", BACKEND))
    }

    fn reset_reader(&mut self) -> Result<()> {
        Err(Error::unsupported("reset_reader", BACKEND))
    }

    fn mark_writer(&mut self) -> Result<()> {
        self.writer_mark = Some(self.region.position());
        Ok(())
    }

    fn reset_writer(&mut self) -> Result<()> {
        let mark = self
            .writer_mark
            .take()
            .ok_or_else(|| Error::InvalidState("reset_writer without a writer mark".into()))?;
        self.region.set_position(mark)
    }

    fn mark_size(&mut self) -> Result<()> {
        if let Some(mark) = self.size_mark {
            return Err(Error::InvalidState(format!(
                "size mark already outstanding at {}",
                mark
            )));
        }
        self.ensure_writable(SIZE_FIELD_LEN)?;
        self.size_mark = Some(self.region.position());
        self.region.take_mut(SIZE_FIELD_LEN).fill(0);
        Ok(())
    }

    fn write_size(&mut self) -> Result<()> {
        let mark = self
            .size_mark
            .take()
            .ok_or_else(|| Error::InvalidState("write_size without an outstanding size mark".into()))?;
        let position = self.region.position();
        let size = position
            .checked_sub(mark + SIZE_FIELD_LEN)
            .ok_or_else(|| {
                Error::InvalidState(format!(
                    "writer position {} is behind the size mark {}",
                    position, mark
                ))
            })?;
        let size = i32::try_from(size).map_err(|_| Error::GrowthFailure {
            requested: size,
            max: MAX_FRAMED_LEN,
        })?;

        let mut field = [0u8; SIZE_FIELD_LEN];
        BigEndian::write_i32(&mut field, size);
        self.region.put_at(mark, &field);
        Ok(())
    }

    fn size_mark_position(&self) -> Option<usize> {
        self.size_mark
    }

    fn limit_next(&mut self, len: usize) -> Result<()> {
        if self.window.is_some() {
            return Err(Error::InvalidState(
                "limit_next while a window is already active".into(),
            ));
        }
        self.ensure_readable(len)?;
        self.window = Some(self.region.limit());
        self.region.set_limit(self.region.position() + len)
    }

    fn reset_next_limit(&mut self) -> Result<()> {
        let saved = self
            .window
            .take()
            .ok_or_else(|| Error::InvalidState("reset_next_limit without an active window".into()))?;
        self.set_limit(saved)
    }
}

impl FramedBuffer for GrowableBuffer {}

impl fmt::Debug for GrowableBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrowableBuffer")
            .field("capacity", &self.region.capacity())
            .field("position", &self.region.position())
            .field("limit", &self.region.limit())
            .field("size_mark", &self.size_mark)
            .field("writer_mark", &self.writer_mark)
            .field("deferred_limit", &self.deferred_limit)
            .field("window", &self.window)
            .field("released", &self.released)
            .finish()
    }
}
