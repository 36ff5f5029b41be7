//! Journal byte formats.
//!
//! Framing only: where a record starts, how long it is and what type it
//! carries. Payload bytes belong to the schemas.
//!
//! # Module Structure
//!
//! - `record`: record header and skipping unknown records
//! - `commit_info`: the transaction commit envelope

pub mod commit_info;
pub mod record;

pub use commit_info::TransactionCommitInfo;
pub use record::{skip_record, RecordHeader};
