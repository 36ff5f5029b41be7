//! Core types for the Strata journal codec
//!
//! This crate defines the foundations shared by the buffer and durability crates:
//! - Error: Error type hierarchy and `Result` alias
//! - Limits: Wire-format field sizes and the journal format version

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod limits;

pub use error::{Error, Result};
pub use limits::{
    COMMIT_HEADER_LEN, COUNT_FIELD_LEN, JOURNAL_FORMAT_VERSION, MAX_FRAMED_LEN, RECORD_HEADER_LEN,
    SIZE_FIELD_LEN, TYPE_ID_LEN,
};
