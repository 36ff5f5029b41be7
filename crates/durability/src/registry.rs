//! Type registry for record routing
//!
//! The registry is the single source of truth for which message types the
//! journal can carry. It maps:
//! - Rust type -> wire type identifier (encoding)
//! - wire type identifier -> schema (decoding)
//!
//! plus one optional schema for the unframed snapshot payload.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut registry = TypeRegistry::new();
//!
//! // Stable, explicit identifier
//! registry.register_with_id(0x10, BincodeSchema::<Deposit>::new("bank.Deposit"))?;
//!
//! // Identifier derived from the schema name
//! let id = registry.register(BincodeSchema::<Withdrawal>::new("bank.Withdrawal"))?;
//!
//! // Freeze and share with every codec
//! let registry = Arc::new(registry);
//! ```
//!
//! Registration takes `&mut self`; once wrapped in an `Arc` the registry is
//! read-only, so lookups need no locking.

use crate::codec::{DynSchema, Message, Schema, TypedSchema};
use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::fmt;
use strata_core::{Error, Result};
use tracing::debug;
use xxhash_rust::xxh3::{xxh3_64, Xxh3};

/// Identifier reserved for the snapshot schema in error context.
pub const SNAPSHOT_TYPE_ID: u32 = 0;

/// Derive a wire identifier from a schema name.
///
/// xxh3-64 of the name, folded to 32 bits.
pub fn derive_type_id(name: &str) -> u32 {
    let hash = xxh3_64(name.as_bytes());
    (hash ^ (hash >> 32)) as u32
}

/// One registered message type.
pub struct RegisteredType {
    id: u32,
    schema: Box<dyn DynSchema>,
}

impl RegisteredType {
    /// Wire identifier.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Schema name.
    pub fn name(&self) -> &'static str {
        self.schema.name()
    }

    /// Schema for this type.
    pub fn schema(&self) -> &dyn DynSchema {
        self.schema.as_ref()
    }
}

impl fmt::Debug for RegisteredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredType")
            .field("id", &format_args!("{:#010x}", self.id))
            .field("name", &self.name())
            .finish()
    }
}

/// Registry of message schemas keyed both ways
#[derive(Default)]
pub struct TypeRegistry {
    /// Rust type -> wire identifier
    by_type: FxHashMap<TypeId, u32>,
    /// Wire identifier -> registration
    by_id: FxHashMap<u32, RegisteredType>,
    /// Schema for the unframed snapshot payload
    snapshot: Option<Box<dyn DynSchema>>,
}

impl TypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema under an identifier derived from its name
    ///
    /// Returns the identifier. Fails with `RegistrationCollision` if the
    /// type is already registered or another type hashes to the same id.
    pub fn register<S: Schema>(&mut self, schema: S) -> Result<u32> {
        let id = derive_type_id(schema.name());
        self.insert(id, Box::new(TypedSchema::new(schema)))
    }

    /// Register a schema under an explicit identifier
    pub fn register_with_id<S: Schema>(&mut self, id: u32, schema: S) -> Result<u32> {
        self.insert(id, Box::new(TypedSchema::new(schema)))
    }

    /// Register the schema for snapshot payloads
    ///
    /// At most one snapshot schema may be registered.
    pub fn register_snapshot<S: Schema>(&mut self, schema: S) -> Result<()> {
        if let Some(existing) = &self.snapshot {
            return Err(Error::RegistrationCollision {
                type_id: SNAPSHOT_TYPE_ID,
                existing: existing.name(),
                incoming: schema.name(),
            });
        }
        debug!(target: "strata::codec", name = schema.name(), "Registered snapshot schema");
        self.snapshot = Some(Box::new(TypedSchema::new(schema)));
        Ok(())
    }

    fn insert(&mut self, id: u32, schema: Box<dyn DynSchema>) -> Result<u32> {
        if id == SNAPSHOT_TYPE_ID {
            return Err(Error::RegistrationCollision {
                type_id: id,
                existing: "<snapshot>",
                incoming: schema.name(),
            });
        }
        if let Some(existing_id) = self.by_type.get(&schema.value_type()) {
            let existing = self.by_id.get(existing_id).map_or("<unknown>", |r| r.name());
            return Err(Error::RegistrationCollision {
                type_id: *existing_id,
                existing,
                incoming: schema.name(),
            });
        }
        if let Some(existing) = self.by_id.get(&id) {
            return Err(Error::RegistrationCollision {
                type_id: id,
                existing: existing.name(),
                incoming: schema.name(),
            });
        }

        debug!(target: "strata::codec", type_id = id, name = schema.name(), "Registered type");
        self.by_type.insert(schema.value_type(), id);
        self.by_id.insert(id, RegisteredType { id, schema });
        Ok(id)
    }

    /// Whether `T` has a registered schema
    pub fn is_registered<T: Any>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }

    /// Wire identifier of `T`, if registered
    pub fn type_id_of<T: Any>(&self) -> Option<u32> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Registration for a wire identifier
    pub fn get(&self, id: u32) -> Option<&RegisteredType> {
        self.by_id.get(&id)
    }

    /// Registration for a message's concrete type
    pub fn resolve(&self, message: &dyn Message) -> Result<&RegisteredType> {
        self.by_type
            .get(&message.message_type())
            .and_then(|id| self.by_id.get(id))
            .ok_or(Error::UnregisteredType {
                type_name: message.type_name(),
            })
    }

    /// Snapshot schema, if one is registered
    pub fn snapshot_schema(&self) -> Option<&dyn DynSchema> {
        self.snapshot.as_deref()
    }

    /// All registered identifiers, ascending
    pub fn type_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.by_id.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered record types (the snapshot schema not included)
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether no record types are registered
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Hash of every (identifier, name) pair and the snapshot schema name
    ///
    /// Two processes can exchange journals only if their fingerprints match.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Xxh3::new();
        for id in self.type_ids() {
            if let Some(registered) = self.by_id.get(&id) {
                hasher.update(&id.to_be_bytes());
                hasher.update(registered.name().as_bytes());
                hasher.update(&[0]);
            }
        }
        if let Some(snapshot) = &self.snapshot {
            hasher.update(snapshot.name().as_bytes());
        }
        hasher.digest()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&RegisteredType> = self.by_id.values().collect();
        types.sort_unstable_by_key(|r| r.id);
        f.debug_struct("TypeRegistry")
            .field("types", &types)
            .field("snapshot", &self.snapshot.as_ref().map(|s| s.name()))
            .finish()
    }
}
