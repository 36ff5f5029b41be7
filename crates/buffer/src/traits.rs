//! Buffer contract shared by all backends.
//!
//! # Cursor model
//!
//! A buffer tracks a reader and a writer position, a `limit` and a
//! `capacity`, with `0 <= position <= limit <= capacity` at all times.
//! The growable backend shares one position between reading and writing;
//! the pooled backend keeps them independent. See the backend docs.
//!
//! # Capabilities
//!
//! Both backends implement [`Buffer`]. Operations a backend cannot honour
//! fail with [`Error::UnsupportedCapability`](strata_core::Error) instead
//! of silently degrading, with one documented exception: size framing on
//! the pooled backend is inert. Code that depends on framing or windowing
//! (the record codec) asks for [`FramedBuffer`], which only the growable
//! backend implements, so the wrong backend is rejected at compile time.
//!
//! # Thread Safety
//!
//! None. A buffer is owned by one channel/worker at a time and handed off,
//! never aliased.

use strata_core::Result;

/// Cursor-based binary buffer.
///
/// All multi-byte integers are big-endian.
pub trait Buffer {
    /// Total allocated size.
    fn capacity(&self) -> usize;

    /// Bytes written so far (the writer position).
    fn length(&self) -> usize;

    /// Bytes readable without a continuation or growth event.
    fn remaining(&self) -> usize;

    /// Current usable upper bound.
    fn limit(&self) -> usize;

    /// Move the usable upper bound.
    fn set_limit(&mut self, limit: usize) -> Result<()>;

    /// Current reader position.
    fn reader_position(&self) -> usize;

    /// Current writer position.
    fn writer_position(&self) -> usize;

    /// Move the reader position.
    fn set_reader_position(&mut self, position: usize) -> Result<()>;

    /// Move the writer position.
    fn set_writer_position(&mut self, position: usize) -> Result<()>;

    /// Reset cursors to the start. Memory is kept.
    fn clear(&mut self);

    /// Free the backing region. Releasing twice is a no-op.
    ///
    /// Any other use after release is a protocol violation on the owner's
    /// side; it is not checked at runtime.
    fn release(&mut self);

    /// Whether at least one byte can be read.
    fn is_available(&mut self) -> Result<bool>;

    /// Append one byte.
    fn write_u8(&mut self, value: u8) -> Result<()>;

    /// Append a 16-bit integer.
    fn write_i16(&mut self, value: i16) -> Result<()>;

    /// Append a 32-bit integer.
    fn write_i32(&mut self, value: i32) -> Result<()>;

    /// Append a 64-bit integer.
    fn write_i64(&mut self, value: i64) -> Result<()>;

    /// Append a byte slice.
    fn write_bytes(&mut self, data: &[u8]) -> Result<()>;

    /// Append `count` bytes of `data` starting at `offset`.
    fn write_bytes_range(&mut self, data: &[u8], offset: usize, count: usize) -> Result<()> {
        let end = offset.checked_add(count).filter(|end| *end <= data.len());
        match end {
            Some(end) => self.write_bytes(&data[offset..end]),
            None => Err(strata_core::Error::Malformed(format!(
                "range {}+{} outside a {}-byte source",
                offset,
                count,
                data.len()
            ))),
        }
    }

    /// Consume all readable bytes of `source` and append them here.
    fn write_from_buffer(&mut self, source: &mut dyn Buffer) -> Result<()> {
        let count = source.remaining();
        let data = source.read_slice(count)?;
        self.write_bytes(data)
    }

    /// Read one byte.
    fn read_u8(&mut self) -> Result<u8>;

    /// Read a 16-bit integer.
    fn read_i16(&mut self) -> Result<i16>;

    /// Read a 32-bit integer.
    fn read_i32(&mut self) -> Result<i32>;

    /// Read a 64-bit integer.
    fn read_i64(&mut self) -> Result<i64>;

    /// Borrow the next `len` bytes in place and advance past them.
    ///
    /// This is the zero-copy read primitive.
    fn read_slice(&mut self, len: usize) -> Result<&[u8]>;

    /// Read `len` bytes into a fresh vector.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.read_slice(len).map(<[u8]>::to_vec)
    }

    /// Fill `dst` from the buffer.
    fn read_into(&mut self, dst: &mut [u8]) -> Result<()> {
        let src = self.read_slice(dst.len())?;
        dst.copy_from_slice(src);
        Ok(())
    }

    /// Consume every readable byte.
    fn read_remaining(&mut self) -> Result<Vec<u8>> {
        let len = self.remaining();
        self.read_bytes(len)
    }

    /// Bytes written so far, `[0, writer)`. Does not move any cursor.
    fn written(&self) -> &[u8];

    /// Currently readable bytes. Does not move any cursor.
    fn readable(&self) -> &[u8];

    /// Save the reader position.
    fn mark_reader(&mut self) -> Result<()>;

    /// Restore the saved reader position.
    fn reset_reader(&mut self) -> Result<()>;

    /// Save the writer position.
    fn mark_writer(&mut self) -> Result<()>;

    /// Restore the saved writer position.
    fn reset_writer(&mut self) -> Result<()>;

    /// Remember the writer position and write a 4-byte zero placeholder.
    fn mark_size(&mut self) -> Result<()>;

    /// Backpatch the placeholder with the number of bytes written after it.
    ///
    /// The writer position is left at the end of the payload.
    fn write_size(&mut self) -> Result<()>;

    /// Position of the outstanding size placeholder, if any.
    fn size_mark_position(&self) -> Option<usize>;

    /// Narrow the readable window to the next `len` bytes.
    fn limit_next(&mut self, len: usize) -> Result<()>;

    /// Restore the limit saved by [`limit_next`](Buffer::limit_next).
    fn reset_next_limit(&mut self) -> Result<()>;
}

/// A buffer on which size framing and windowing are real operations.
///
/// Implemented only by backends whose `mark_size`/`write_size` backpatch
/// and whose `limit_next` bounds reads.
pub trait FramedBuffer: Buffer {}
