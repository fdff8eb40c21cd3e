//! Entity schema declarations for the Courtside client engine.
//!
//! Defines the declarative side of the data-binding layer:
//! - [`EntityType`] — a declared shape (keyed entity, composite view, or page)
//! - [`FieldDescriptor`] — classifies one field and renders its query fragment
//! - [`Registry`] — the name→type table with two-phase registration:
//!   declare every shape first (relations referenced by name), then
//!   [`Registry::validate`] resolves references, synthesizes page types for
//!   paginated relations, and merges inherited fields.
//!
//! Schemas are plain data. Nothing here touches the network; the cache crate
//! consumes the resolved tables to build queries and apply responses.

mod entity_type;
mod field;
mod registry;

pub use entity_type::{EntityKind, EntityType};
pub use field::{FieldDescriptor, FieldTarget, ScalarKind, wire_name};
pub use registry::{Registry, list_field_name, list_type_name};

/// Result type alias using the crate's error type.
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Errors raised while declaring or validating schemas.
///
/// All of these are fatal at startup: a schema that fails validation must
/// never be handed to the cache.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A relation referenced a type name that was never registered.
    #[error("unknown entity type: {0}")]
    UnknownType(String),

    /// Two types were registered under the same normalized name.
    #[error("duplicate entity type: {0}")]
    DuplicateType(String),

    /// A type named a parent that was never registered.
    #[error("type {type_name} extends unknown parent {parent}")]
    UnknownParent { type_name: String, parent: String },

    /// Inheritance chain loops back on itself.
    #[error("inheritance cycle through {0}")]
    InheritanceCycle(String),

    /// Field tables were requested before [`Registry::validate`] ran.
    #[error("registry has not been validated")]
    NotValidated,

    /// A declaration that cannot be expressed on the wire.
    #[error("malformed schema for {type_name}: {message}")]
    Malformed {
        type_name: String,
        message: String,
    },
}
