//! Zero-copy bridge between schemas and buffers.
//!
//! A schema never sees a concrete buffer. The adapter binds an [`Output`] or
//! [`Input`] view onto whatever buffer the codec is working with, for exactly
//! the duration of one payload. Nothing is retained between bindings, so the
//! adapter can't leak a reference to a buffer that has since been released.
//!
//! Integers are big-endian, matching the record framing around them.
//! `Output` and `Input` also implement `io::Write`/`io::Read`, which is how
//! serde-based schemas plug in.

use std::cell::Cell;
use std::io;
use std::marker::PhantomData;
use strata_buffer::Buffer;
use strata_core::{Error, Result};

/// Per-worker adapter binding schema views onto buffers.
///
/// Owned by a single codec. It is `Send` but not `Sync`: move it between
/// threads freely, never share it.
#[derive(Debug, Default)]
pub struct ZeroCopyAdapter {
    _not_sync: PhantomData<Cell<()>>,
}

impl ZeroCopyAdapter {
    /// Fresh adapter.
    pub fn new() -> Self {
        ZeroCopyAdapter {
            _not_sync: PhantomData,
        }
    }

    /// Bind an output view at the buffer's writer position.
    pub fn output<'a>(&'a mut self, buffer: &'a mut dyn Buffer) -> Output<'a> {
        let start = buffer.writer_position();
        Output {
            buffer,
            start,
            _adapter: PhantomData,
        }
    }

    /// Bind an input view at the buffer's reader position.
    pub fn input<'a>(&'a mut self, buffer: &'a mut dyn Buffer) -> Input<'a> {
        let start = buffer.reader_position();
        Input {
            buffer,
            start,
            _adapter: PhantomData,
        }
    }
}

/// Write-side view handed to [`Schema::write_to`](crate::Schema::write_to).
pub struct Output<'a> {
    buffer: &'a mut dyn Buffer,
    start: usize,
    _adapter: PhantomData<&'a mut ZeroCopyAdapter>,
}

impl Output<'_> {
    /// Bytes written through this view.
    pub fn written(&self) -> usize {
        self.buffer.writer_position().saturating_sub(self.start)
    }

    /// Write a byte.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.buffer.write_u8(value)
    }

    /// Write a boolean as one byte, 0 or 1.
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.buffer.write_u8(value as u8)
    }

    /// Write a big-endian `i16`.
    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.buffer.write_i16(value)
    }

    /// Write a big-endian `i32`.
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.buffer.write_i32(value)
    }

    /// Write a big-endian `u32`.
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.buffer.write_i32(value as i32)
    }

    /// Write a big-endian `i64`.
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.buffer.write_i64(value)
    }

    /// Write a big-endian `u64`.
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.buffer.write_i64(value as i64)
    }

    /// Write an `f64` by its IEEE-754 bits.
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_u64(value.to_bits())
    }

    /// Write raw bytes with no length prefix.
    pub fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.write_bytes(data)
    }

    /// Write a `u32` length followed by the bytes.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        let len = u32::try_from(data.len()).map_err(|_| {
            Error::Malformed(format!("{} bytes exceed a u32 length prefix", data.len()))
        })?;
        self.write_u32(len)?;
        self.buffer.write_bytes(data)
    }

    /// Write a length-prefixed UTF-8 string.
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        self.write_bytes(value.as_bytes())
    }
}

impl io::Write for Output<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.write_bytes(buf).map_err(Error::into_io)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Read-side view handed to [`Schema::merge_from`](crate::Schema::merge_from).
pub struct Input<'a> {
    buffer: &'a mut dyn Buffer,
    start: usize,
    _adapter: PhantomData<&'a mut ZeroCopyAdapter>,
}

impl Input<'_> {
    /// Bytes consumed through this view.
    pub fn consumed(&self) -> usize {
        self.buffer.reader_position().saturating_sub(self.start)
    }

    /// Bytes left before the current limit.
    pub fn remaining(&self) -> usize {
        self.buffer.remaining()
    }

    /// Whether the payload is exhausted.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Read a byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.buffer.read_u8()
    }

    /// Read a boolean; anything but 0 or 1 is malformed.
    pub fn read_bool(&mut self) -> Result<bool> {
        match self.buffer.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::Malformed(format!("invalid boolean byte {}", other))),
        }
    }

    /// Read a big-endian `i16`.
    pub fn read_i16(&mut self) -> Result<i16> {
        self.buffer.read_i16()
    }

    /// Read a big-endian `i32`.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.buffer.read_i32()
    }

    /// Read a big-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.buffer.read_i32()? as u32)
    }

    /// Read a big-endian `i64`.
    pub fn read_i64(&mut self) -> Result<i64> {
        self.buffer.read_i64()
    }

    /// Read a big-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(self.buffer.read_i64()? as u64)
    }

    /// Read an `f64` from its IEEE-754 bits.
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Borrow `len` raw bytes straight out of the buffer.
    pub fn read_raw(&mut self, len: usize) -> Result<&[u8]> {
        self.buffer.read_slice(len)
    }

    /// Borrow a `u32`-length-prefixed byte string.
    pub fn read_bytes(&mut self) -> Result<&[u8]> {
        let len = self.read_u32()? as usize;
        self.buffer.read_slice(len)
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| Error::Malformed(format!("invalid UTF-8 string: {}", e)))
    }
}

impl io::Read for Input<'_> {
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        if dst.is_empty() {
            return Ok(0);
        }
        if self.buffer.remaining() == 0 && !self.buffer.is_available().map_err(Error::into_io)? {
            return Ok(0);
        }
        let n = dst.len().min(self.buffer.remaining());
        self.buffer
            .read_into(&mut dst[..n])
            .map_err(Error::into_io)?;
        Ok(n)
    }
}
