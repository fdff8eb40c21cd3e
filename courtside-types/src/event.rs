//! Push-invalidation events.
//!
//! The server announces entity changes over a persistent connection. Each
//! event names one entity by `(type, id)`; the cache routes it to the
//! matching live instance, if any. Delivery is best-effort: events may be
//! dropped or duplicated, and the engine treats them purely as reload hints.

use serde::{Deserialize, Serialize};

/// A server-originated invalidation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum PushEvent {
    /// An existing entity changed; the matching cached instance (and any
    /// view whose composite identity references it) should reload.
    EntityUpdated {
        /// The entity type's declared or normalized name.
        type_name: String,
        /// The entity's scalar primary key.
        id: i64,
    },

    /// A new entity of the given type exists; materialized "all of type"
    /// collections should reload to pick it up.
    EntityCreated {
        /// The entity type's declared or normalized name.
        type_name: String,
        /// The new entity's scalar primary key.
        id: i64,
    },
}

impl PushEvent {
    /// The type name the event targets.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::EntityUpdated { type_name, .. } | Self::EntityCreated { type_name, .. } => {
                type_name
            }
        }
    }

    /// The scalar id the event targets.
    #[must_use]
    pub fn id(&self) -> i64 {
        match self {
            Self::EntityUpdated { id, .. } | Self::EntityCreated { id, .. } => *id,
        }
    }
}
