//! Core type definitions for the Courtside client engine.
//!
//! This crate defines the fundamental, schema-agnostic types used throughout
//! the data-binding layer:
//! - Entity type names and identities (keyed and composite/view)
//! - Cache slot keys (scalar id, or generated token for views)
//! - Push-invalidation events delivered by the server
//!
//! All domain-specific shapes (teams, players, matches, etc.) are declared
//! against the schema crate, not here.

mod event;
mod names;

pub use event::PushEvent;
pub use names::{EntityName, Identity, SlotKey};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),
}
