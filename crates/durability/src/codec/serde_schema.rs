//! Schema for any serde type, encoded with bincode.

use super::traits::Schema;
use crate::adapter::{Input, Output};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use strata_core::Result;

/// Bincode-encoded payload for a serde type.
///
/// The payload is bincode's default layout, written straight into the
/// buffer through the adapter with no intermediate `Vec`.
pub struct BincodeSchema<T> {
    name: &'static str,
    _value: PhantomData<fn() -> T>,
}

impl<T> BincodeSchema<T> {
    /// Schema registered under `name`.
    pub const fn new(name: &'static str) -> Self {
        BincodeSchema {
            name,
            _value: PhantomData,
        }
    }
}

impl<T> Schema for BincodeSchema<T>
where
    T: Serialize + DeserializeOwned + Any + Send,
{
    type Value = T;

    fn name(&self) -> &'static str {
        self.name
    }

    fn write_to(&self, output: &mut Output<'_>, value: &T) -> Result<()> {
        bincode::serialize_into(output, value)?;
        Ok(())
    }

    fn merge_from(&self, input: &mut Input<'_>) -> Result<T> {
        Ok(bincode::deserialize_from(input)?)
    }
}

impl<T> fmt::Debug for BincodeSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BincodeSchema")
            .field("name", &self.name)
            .finish()
    }
}
