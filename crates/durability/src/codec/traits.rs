//! Schema trait definitions.
//!
//! A schema knows how to write one message type into an [`Output`] and how to
//! read it back from an [`Input`]. The record codec never looks inside a
//! payload; everything between the record header and the next record is the
//! schema's business.

use crate::adapter::{Input, Output};
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use strata_core::{Error, Result};

/// A value the journal can carry.
///
/// Implemented for every `'static + Send` type. The object-safe form lets a
/// batch hold messages of different types side by side.
///
/// As with `Any`, a `Box<dyn Message>` is itself a `Message`: call methods
/// through `&*boxed`, not on the box.
pub trait Message: Any + Send {
    /// Rust type name, for diagnostics only.
    fn type_name(&self) -> &'static str;

    /// Borrow as `Any` to recover the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Convert into a boxed `Any`.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T: Any + Send> Message for T {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

impl dyn Message {
    /// Whether the message is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrow the message as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Take the message as a `T`.
    pub fn downcast<T: Any>(self: Box<Self>) -> std::result::Result<Box<T>, Box<dyn Any + Send>> {
        self.into_any().downcast::<T>()
    }

    /// `TypeId` of the concrete message.
    pub fn message_type(&self) -> TypeId {
        self.as_any().type_id()
    }
}

impl fmt::Debug for dyn Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Message<{}>", self.type_name())
    }
}

/// A decoded message whose type is only known at runtime.
pub type AnyMessage = Box<dyn Message>;

/// Schema for one message type.
///
/// # Thread Safety
///
/// Schemas live in a shared registry and are used by every worker at once,
/// so they must be `Send + Sync` and keep no per-call state.
///
/// # Identity
///
/// `name` is the stable, human-chosen name of the message type. Derived type
/// identifiers are hashed from it, so renaming a schema changes its
/// identifier on the wire.
pub trait Schema: Send + Sync + 'static {
    /// Type this schema encodes.
    type Value: Any + Send;

    /// Stable name of the encoded type.
    fn name(&self) -> &'static str;

    /// Write `value` to the output.
    fn write_to(&self, output: &mut Output<'_>, value: &Self::Value) -> Result<()>;

    /// Read a value from the input.
    ///
    /// The input is already bounded to the payload; reading past it fails.
    fn merge_from(&self, input: &mut Input<'_>) -> Result<Self::Value>;
}

/// Object-safe view of a [`Schema`], as stored in the registry.
pub trait DynSchema: Send + Sync {
    /// Stable name of the encoded type.
    fn name(&self) -> &'static str;

    /// `TypeId` of the encoded type.
    fn value_type(&self) -> TypeId;

    /// Write a type-erased message.
    ///
    /// Fails with `InvalidState` if the message is not this schema's type.
    fn write_dyn(&self, output: &mut Output<'_>, message: &dyn Message) -> Result<()>;

    /// Read a message and erase its type.
    fn merge_dyn(&self, input: &mut Input<'_>) -> Result<AnyMessage>;
}

/// Adapter from a typed [`Schema`] to [`DynSchema`].
pub struct TypedSchema<S> {
    schema: S,
}

impl<S: Schema> TypedSchema<S> {
    /// Wrap a schema.
    pub fn new(schema: S) -> Self {
        TypedSchema { schema }
    }

    /// The wrapped schema.
    pub fn inner(&self) -> &S {
        &self.schema
    }
}

impl<S: Schema> DynSchema for TypedSchema<S> {
    fn name(&self) -> &'static str {
        self.schema.name()
    }

    fn value_type(&self) -> TypeId {
        TypeId::of::<S::Value>()
    }

    fn write_dyn(&self, output: &mut Output<'_>, message: &dyn Message) -> Result<()> {
        let value = message.downcast_ref::<S::Value>().ok_or_else(|| {
            Error::InvalidState(format!(
                "schema {} cannot write a {}",
                self.schema.name(),
                message.type_name()
            ))
        })?;
        self.schema.write_to(output, value)
    }

    fn merge_dyn(&self, input: &mut Input<'_>) -> Result<AnyMessage> {
        let value = self.schema.merge_from(input)?;
        Ok(Box::new(value))
    }
}

impl<S> fmt::Debug for TypedSchema<S>
where
    S: Schema,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedSchema")
            .field("name", &self.schema.name())
            .field("value", &std::any::type_name::<S::Value>())
            .finish()
    }
}

/// Schema built from a pair of closures.
///
/// Handy for small hand-written payloads and for tests.
pub struct FnSchema<T, W, M> {
    name: &'static str,
    write: W,
    merge: M,
    _value: PhantomData<fn() -> T>,
}

impl<T, W, M> FnSchema<T, W, M>
where
    T: Any + Send,
    W: Fn(&mut Output<'_>, &T) -> Result<()> + Send + Sync + 'static,
    M: Fn(&mut Input<'_>) -> Result<T> + Send + Sync + 'static,
{
    /// Schema named `name` using `write` and `merge`.
    pub fn new(name: &'static str, write: W, merge: M) -> Self {
        FnSchema {
            name,
            write,
            merge,
            _value: PhantomData,
        }
    }
}

impl<T, W, M> Schema for FnSchema<T, W, M>
where
    T: Any + Send,
    W: Fn(&mut Output<'_>, &T) -> Result<()> + Send + Sync + 'static,
    M: Fn(&mut Input<'_>) -> Result<T> + Send + Sync + 'static,
{
    type Value = T;

    fn name(&self) -> &'static str {
        self.name
    }

    fn write_to(&self, output: &mut Output<'_>, value: &T) -> Result<()> {
        (self.write)(output, value)
    }

    fn merge_from(&self, input: &mut Input<'_>) -> Result<T> {
        (self.merge)(input)
    }
}
