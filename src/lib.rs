//! Strata journal - binary buffers and record codec for journal persistence
//!
//! Strata journals are sequences of framed records, each carrying a typed
//! message encoded by a registered schema. Commits group records under a
//! transaction id and timestamp; snapshots hold one unframed message.
//!
//! # Quick Start
//!
//! ```ignore
//! use strata_journal::prelude::*;
//!
//! let mut registry = TypeRegistry::new();
//! registry.register_with_id(1, BincodeSchema::<Deposit>::new("bank.Deposit"))?;
//! let mut codec = RecordCodec::new(Arc::new(registry));
//!
//! let mut buf = GrowableBuffer::new(256)?;
//! let info = TransactionCommitInfo::new(42, now).with_commit(deposit);
//! codec.encode_commit_info(&mut buf, &info)?;
//!
//! buf.flip();
//! let decoded = codec.decode_commit_info(&mut buf)?;
//! ```
//!
//! # Architecture
//!
//! - [`limits`]: wire-format sizes and the journal format version
//! - [`buffer`]: growable and pooled buffer backends
//! - [`codec`]: schemas, type registry and the record codec

pub mod prelude;

pub use strata_buffer as buffer;
pub use strata_durability as codec;

pub use strata_core::{limits, Error, Result};
