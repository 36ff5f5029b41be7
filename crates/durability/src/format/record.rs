//! Record framing.
//!
//! # Record Layout
//!
//! ```text
//! ┌──────────────────┬──────────────────┬─────────────────────────┐
//! │ TypeId (4, BE)   │ Length (4, BE)   │ Payload (Length bytes)  │
//! └──────────────────┴──────────────────┴─────────────────────────┘
//! ```
//!
//! Length counts payload bytes only. It is written as a placeholder and
//! backpatched once the payload is complete, so a reader that doesn't know
//! the type can still step over the record.

use strata_buffer::Buffer;
use strata_core::{Error, Result, RECORD_HEADER_LEN};

/// Header in front of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Registered identifier of the payload's type
    pub type_id: u32,
    /// Payload length in bytes
    pub length: usize,
}

impl RecordHeader {
    /// Size of the header on the wire
    pub const LEN: usize = RECORD_HEADER_LEN;

    /// Read a header at the reader position.
    ///
    /// A negative length is `Malformed`.
    pub fn read_from(buffer: &mut dyn Buffer) -> Result<Self> {
        let type_id = buffer.read_i32()? as u32;
        let raw_length = buffer.read_i32()?;
        let length = usize::try_from(raw_length).map_err(|_| {
            Error::Malformed(format!(
                "negative length {} in record of type {:#010x}",
                raw_length, type_id
            ))
        })?;
        Ok(RecordHeader { type_id, length })
    }

    /// Bytes the whole record occupies
    pub fn record_len(&self) -> usize {
        Self::LEN + self.length
    }
}

/// Step over one record without decoding it.
///
/// Returns the header of the skipped record.
pub fn skip_record(buffer: &mut dyn Buffer) -> Result<RecordHeader> {
    let header = RecordHeader::read_from(buffer)?;
    buffer.read_slice(header.length)?;
    Ok(header)
}

/// Read a signed count field; negative counts are `Malformed`.
pub(crate) fn read_count(buffer: &mut dyn Buffer) -> Result<usize> {
    let raw = buffer.read_i32()?;
    usize::try_from(raw).map_err(|_| Error::Malformed(format!("negative record count {}", raw)))
}

/// Write a count field.
pub(crate) fn write_count(buffer: &mut dyn Buffer, count: usize) -> Result<()> {
    let raw = i32::try_from(count)
        .map_err(|_| Error::Malformed(format!("{} records exceed an i32 count", count)))?;
    buffer.write_i32(raw)
}
