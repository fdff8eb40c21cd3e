//! The identity map and live-entity engine of the Courtside client.
//!
//! A [`Cache`] owns the single-instance-per-identity map: every consumer
//! asking for `(type, id)` gets the same [`Entity`], whose fields are
//! mutated in place as responses arrive, so every held reference observes
//! updates. Entities render their own requests through the query builder,
//! send them through the collaborator [`Transport`], and reconcile
//! themselves when push events name them.
//!
//! Concurrency model: overlapping reloads of one instance are not
//! serialized — the response that arrives last wins, even if its request
//! was issued earlier. Push-driven and locally-triggered reloads share
//! that same unsynchronized path.
//!
//! [`Transport`]: courtside_transport::Transport

mod cache;
mod config;
mod entity;
mod events;
mod page;
pub mod permissions;
mod query;

pub use cache::Cache;
pub use config::CacheConfig;
pub use entity::{Entity, FieldValue, LoadState};
pub use events::run_event_pump;
pub use page::Page;

use courtside_schema::SchemaError;
use courtside_transport::TransportError;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors surfaced by the cache engine.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Schema lookup or validation failure.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The transport failed; not retried by the engine.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Serialization error while rendering arguments.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The response lacked the expected top-level payload. Distinct from
    /// an individual field being legitimately empty.
    #[error("response carried no payload for {0}")]
    MissingData(String),

    /// The cache (or the instance's slot) is gone.
    #[error("detached entity: {0}")]
    Detached(String),

    /// The page's owning parent no longer exists.
    #[error("page has no living parent")]
    PageDetached,

    /// Construction misuse: wrong identity flavor for the type.
    #[error("identity mismatch for {type_name}: {message}")]
    IdentityMismatch {
        type_name: String,
        message: String,
    },
}
