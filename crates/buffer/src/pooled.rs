//! Pooled buffer with independent reader and writer indices.
//!
//! Backed by a `BytesMut` region drawn from a [`BufferPool`]. Growth is
//! automatic (bounded by the pool's max capacity) and the region goes back to
//! the pool when the reference count drops to zero.
//!
//! This backend serves short-lived network buffers that a higher framing
//! layer composes. Size framing is therefore inert here (`mark_size` and
//! `write_size` do nothing) and windowing fails with `UnsupportedCapability`.
//! It does not implement [`FramedBuffer`](crate::FramedBuffer).

use crate::pool::BufferPool;
use crate::traits::Buffer;
use bytes::{Buf, BufMut, BytesMut};
use std::fmt;
use strata_core::{Error, Result, MAX_FRAMED_LEN};
use tracing::trace;

const BACKEND: &str = "pooled";

/// Reference-counted buffer over a pool-managed region.
///
/// The writer index is the region's length; the limit reported through
/// [`Buffer`] is the writer index.
pub struct PooledBuffer {
    inner: BytesMut,
    reader: usize,
    reader_mark: usize,
    writer_mark: usize,
    max_capacity: usize,
    ref_count: usize,
    pool: Option<BufferPool>,
}

impl PooledBuffer {
    /// Stand-alone buffer; its region is freed rather than recycled.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::build(BytesMut::with_capacity(capacity), None, MAX_FRAMED_LEN)
    }

    /// Stand-alone buffer that refuses to grow past `max_capacity`.
    pub fn with_max_capacity(capacity: usize, max_capacity: usize) -> Self {
        Self::build(BytesMut::with_capacity(capacity), None, max_capacity)
    }

    pub(crate) fn from_pool(region: BytesMut, pool: BufferPool, max_capacity: usize) -> Self {
        Self::build(region, Some(pool), max_capacity)
    }

    fn build(inner: BytesMut, pool: Option<BufferPool>, max_capacity: usize) -> Self {
        PooledBuffer {
            inner,
            reader: 0,
            reader_mark: 0,
            writer_mark: 0,
            max_capacity,
            ref_count: 1,
            pool,
        }
    }

    /// Take another reference. Fails once the buffer was fully released.
    pub fn retain(&mut self) -> Result<()> {
        if self.ref_count == 0 {
            return Err(Error::InvalidState(
                "retain on a fully released buffer".into(),
            ));
        }
        self.ref_count += 1;
        Ok(())
    }

    /// Outstanding references.
    pub fn ref_count(&self) -> usize {
        self.ref_count
    }

    fn ensure_writable(&mut self, len: usize) -> Result<()> {
        let requested = self.inner.len().saturating_add(len);
        if requested > self.max_capacity {
            return Err(Error::GrowthFailure {
                requested,
                max: self.max_capacity,
            });
        }
        if requested > self.inner.capacity() {
            trace!(
                target: "strata::buffer",
                from_capacity = self.inner.capacity(),
                requested,
                "Growing pooled region"
            );
            self.inner.reserve(len);
        }
        Ok(())
    }

    fn take(&mut self, len: usize) -> Result<&[u8]> {
        let available = self.inner.len() - self.reader;
        if available < len {
            return Err(Error::Underflow {
                requested: len,
                available,
                position: self.reader,
            });
        }
        let start = self.reader;
        self.reader += len;
        Ok(&self.inner[start..start + len])
    }

    fn free_region(&mut self) {
        let region = std::mem::take(&mut self.inner);
        self.reader = 0;
        self.reader_mark = 0;
        self.writer_mark = 0;
        match &self.pool {
            Some(pool) => pool.recycle(region),
            None => drop(region),
        }
    }
}

impl Buffer for PooledBuffer {
    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn length(&self) -> usize {
        self.inner.len()
    }

    fn remaining(&self) -> usize {
        self.inner.len() - self.reader
    }

    fn limit(&self) -> usize {
        self.inner.len()
    }

    fn set_limit(&mut self, limit: usize) -> Result<()> {
        self.set_writer_position(limit)
    }

    fn reader_position(&self) -> usize {
        self.reader
    }

    fn writer_position(&self) -> usize {
        self.inner.len()
    }

    fn set_reader_position(&mut self, position: usize) -> Result<()> {
        if position > self.inner.len() {
            return Err(Error::InvalidState(format!(
                "reader position {} beyond writer position {}",
                position,
                self.inner.len()
            )));
        }
        self.reader = position;
        Ok(())
    }

    fn set_writer_position(&mut self, position: usize) -> Result<()> {
        if position < self.reader {
            return Err(Error::InvalidState(format!(
                "writer position {} behind reader position {}",
                position, self.reader
            )));
        }
        if position <= self.inner.len() {
            self.inner.truncate(position);
        } else {
            let extra = position - self.inner.len();
            self.ensure_writable(extra)?;
            self.inner.resize(position, 0);
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.reader = 0;
        self.reader_mark = 0;
        self.writer_mark = 0;
        self.inner.clear();
    }

    fn release(&mut self) {
        if self.ref_count == 0 {
            return;
        }
        self.ref_count -= 1;
        if self.ref_count == 0 {
            self.free_region();
        }
    }

    fn is_available(&mut self) -> Result<bool> {
        Ok(self.remaining() > 0)
    }

    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.ensure_writable(1)?;
        self.inner.put_u8(value);
        Ok(())
    }

    fn write_i16(&mut self, value: i16) -> Result<()> {
        self.ensure_writable(2)?;
        self.inner.put_i16(value);
        Ok(())
    }

    fn write_i32(&mut self, value: i32) -> Result<()> {
        self.ensure_writable(4)?;
        self.inner.put_i32(value);
        Ok(())
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.ensure_writable(8)?;
        self.inner.put_i64(value);
        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_writable(data.len())?;
        self.inner.put_slice(data);
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8> {
        let mut src = self.take(1)?;
        Ok(src.get_u8())
    }

    fn read_i16(&mut self) -> Result<i16> {
        let mut src = self.take(2)?;
        Ok(src.get_i16())
    }

    fn read_i32(&mut self) -> Result<i32> {
        let mut src = self.take(4)?;
        Ok(src.get_i32())
    }

    fn read_i64(&mut self) -> Result<i64> {
        let mut src = self.take(8)?;
        Ok(src.get_i64())
    }

    fn read_slice(&mut self, len: usize) -> Result<&[u8]> {
        self.take(len)
    }

    fn written(&self) -> &[u8] {
        &self.inner[..]
    }

    fn readable(&self) -> &[u8] {
        &self.inner[self.reader..]
    }

    fn mark_reader(&mut self) -> Result<()> {
        self.reader_mark = self.reader;
        Ok(())
    }

    fn reset_reader(&mut self) -> Result<()> {
        self.set_reader_position(self.reader_mark)
    }

    fn mark_writer(&mut self) -> Result<()> {
        self.writer_mark = self.inner.len();
        Ok(())
    }

    fn reset_writer(&mut self) -> Result<()> {
        self.set_writer_position(self.writer_mark)
    }

    // Framing belongs to the layer composing these buffers.
    fn mark_size(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_size(&mut self) -> Result<()> {
        Ok(())
    }

    fn size_mark_position(&self) -> Option<usize> {
        None
    }

    fn limit_next(&mut self, _len: usize) -> Result<()> {
        Err(Error::unsupported("limit_next", BACKEND))
    }

    fn reset_next_limit(&mut self) -> Result<()> {
        Err(Error::unsupported("reset_next_limit", BACKEND))
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if self.ref_count > 0 {
            self.ref_count = 0;
            self.free_region();
        }
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("capacity", &self.inner.capacity())
            .field("reader", &self.reader)
            .field("writer", &self.inner.len())
            .field("ref_count", &self.ref_count)
            .field("pooled", &self.pool.is_some())
            .finish()
    }
}
