//! Wire-format sizes for journal records
//!
//! ```text
//! Record      ::= TypeId:i32 Length:i32 Payload:u8[Length]
//! Batch       ::= Count:i32 Record*
//! CommitInfo  ::= TxId:i64 Timestamp:i64 Count:i32 Record*
//! Snapshot    ::= <schema-defined top-level message, unframed>
//! ```
//!
//! All integers are big-endian. These values are part of the on-disk format
//! and cannot change without bumping [`JOURNAL_FORMAT_VERSION`].

/// Version of the record framing described above
pub const JOURNAL_FORMAT_VERSION: u32 = 1;

/// Size of the type identifier that leads every record
pub const TYPE_ID_LEN: usize = 4;

/// Size of the backpatched payload length field
pub const SIZE_FIELD_LEN: usize = 4;

/// Type identifier plus length field
pub const RECORD_HEADER_LEN: usize = TYPE_ID_LEN + SIZE_FIELD_LEN;

/// Size of the record count that leads a batch
pub const COUNT_FIELD_LEN: usize = 4;

/// Transaction id (8) + timestamp (8) + record count (4)
pub const COMMIT_HEADER_LEN: usize = 8 + 8 + COUNT_FIELD_LEN;

/// Largest position a buffer may reach; lengths are signed 32-bit on the wire
pub const MAX_FRAMED_LEN: usize = i32::MAX as usize;
