//! Record codec for Strata journals and snapshots
//!
//! This crate turns typed messages into framed journal records and back:
//!
//! - Codec: `Schema` contract and the bincode-backed schema
//! - Adapter: zero-copy `Output`/`Input` views a schema writes through
//! - Registry: type identifier <-> schema mapping, shared read-only
//! - Format: record header, batch and commit envelope framing
//! - Serializer: `RecordCodec`, the per-worker encoder/decoder
//!
//! Byte storage lives in `strata-buffer`; errors and wire sizes in
//! `strata-core`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod codec;
pub mod format;
pub mod registry;
pub mod serializer;

pub use adapter::{Input, Output, ZeroCopyAdapter};
pub use codec::{
    AnyMessage, BincodeSchema, DynSchema, FnSchema, Message, Schema, TypedSchema,
};
pub use format::{skip_record, RecordHeader, TransactionCommitInfo};
pub use registry::{derive_type_id, RegisteredType, TypeRegistry, SNAPSHOT_TYPE_ID};
pub use serializer::{RecordCodec, SERIALIZER_TYPE};
