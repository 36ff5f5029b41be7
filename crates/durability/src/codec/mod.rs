//! Schemas: how message types become record payloads.
//!
//! - `traits`: [`Schema`], its object-safe form and the [`Message`] trait
//! - `serde_schema`: bincode-backed schema for serde types

pub mod serde_schema;
pub mod traits;

pub use serde_schema::BincodeSchema;
pub use traits::{AnyMessage, DynSchema, FnSchema, Message, Schema, TypedSchema};
