//! Everything needed to register types and encode or decode a journal.

pub use std::sync::Arc;

pub use strata_buffer::{
    Buffer, BufferConfig, BufferPool, FramedBuffer, GrowableBuffer, PooledBuffer,
};
pub use strata_core::{Error, Result, JOURNAL_FORMAT_VERSION};
pub use strata_durability::{
    AnyMessage, BincodeSchema, Input, Message, Output, RecordCodec, Schema,
    TransactionCommitInfo, TypeRegistry,
};
