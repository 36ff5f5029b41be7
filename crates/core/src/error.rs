//! Error types for the journal buffer and codec layer
//!
//! This module defines all error types used throughout the buffer and
//! record-codec crates. We use `thiserror` for automatic `Display` and
//! `Error` trait implementations.
//!
//! Every error is returned synchronously at the point of failure. Nothing in
//! this layer retries, truncates or logs-and-continues.

use std::io;
use thiserror::Error;

/// Result type alias for buffer and codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the buffer and codec layer
#[derive(Debug, Error)]
pub enum Error {
    /// The backend does not support the requested operation
    ///
    /// Reader mark/reset on the growable backend, windowing on the pooled
    /// backend.
    #[error("{operation} is not supported by the {backend} buffer")]
    UnsupportedCapability {
        /// Operation that was attempted
        operation: &'static str,
        /// Backend that refused it
        backend: &'static str,
    },

    /// Attempt to encode a value whose type was never registered
    #[error("Type {type_name} is not registered")]
    UnregisteredType {
        /// Rust type name of the value
        type_name: &'static str,
    },

    /// Decoded a record whose type identifier has no registered schema
    #[error("Unknown type identifier {type_id:#010x}")]
    UnknownTypeId {
        /// Identifier read from the record header
        type_id: u32,
    },

    /// Two registrations map to the same identifier
    #[error("Type identifier {type_id:#010x} collision: {existing} already registered, rejecting {incoming}")]
    RegistrationCollision {
        /// Contested identifier
        type_id: u32,
        /// Type that owns the identifier
        existing: &'static str,
        /// Type that tried to claim it
        incoming: &'static str,
    },

    /// A schema failed while encoding or decoding a record
    #[error("Codec failure for type {type_id:#010x} at position {position}: {source}")]
    CodecFailure {
        /// Identifier of the record being processed
        type_id: u32,
        /// Buffer position where the record's payload starts
        position: usize,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Growth beyond the configured maximum, or allocation failure
    #[error("Cannot grow buffer to {requested} bytes (max {max})")]
    GrowthFailure {
        /// Capacity that was needed
        requested: usize,
        /// Largest capacity allowed
        max: usize,
    },

    /// Read past the readable frontier (or past an active window)
    #[error("Buffer underflow at position {position}: need {requested} bytes, {available} available")]
    Underflow {
        /// Bytes the read needed
        requested: usize,
        /// Bytes that could be read
        available: usize,
        /// Reader position at the time of the read
        position: usize,
    },

    /// Operation used out of protocol (no size mark, nested window, ...)
    #[error("Invalid buffer state: {0}")]
    InvalidState(String),

    /// Payload bytes do not form a valid message
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// I/O error raised by a continuation source
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Wrap a schema-level failure with the record context it occurred in
    pub fn codec(type_id: u32, position: usize, source: Error) -> Self {
        Error::CodecFailure {
            type_id,
            position,
            source: Box::new(source),
        }
    }

    /// Shorthand for [`Error::UnsupportedCapability`]
    pub fn unsupported(operation: &'static str, backend: &'static str) -> Self {
        Error::UnsupportedCapability { operation, backend }
    }

    /// Carry this error through an `io::Read`/`io::Write` boundary
    pub fn into_io(self) -> io::Error {
        match self {
            Error::Io(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }

    /// Recover an error previously passed through [`Error::into_io`]
    pub fn from_io(e: io::Error) -> Self {
        let wraps_ours = e.get_ref().map_or(false, |inner| inner.is::<Error>());
        if !wraps_ours {
            return Error::Io(e);
        }
        match e.into_inner().map(|inner| inner.downcast::<Error>()) {
            Some(Ok(inner)) => *inner,
            Some(Err(other)) => Error::Io(io::Error::new(io::ErrorKind::Other, other)),
            None => Error::InvalidState("I/O error without a payload".into()),
        }
    }

    /// Whether this error came from a missing registration on either side
    pub fn is_unknown_type(&self) -> bool {
        matches!(
            self,
            Error::UnregisteredType { .. } | Error::UnknownTypeId { .. }
        )
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        match *e {
            bincode::ErrorKind::Io(io) => Error::from_io(io),
            other => Error::Malformed(other.to_string()),
        }
    }
}
