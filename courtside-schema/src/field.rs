//! Field descriptors and query-fragment rendering.

use crate::{Registry, SchemaResult};
use courtside_types::EntityName;
use serde::{Deserialize, Serialize};

/// Recognized scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    String,
    Number,
    Boolean,
}

/// What a field points at: a scalar kind, or another entity type by name.
///
/// Relations are always referenced by name so that mutually-referencing
/// types can be declared in any order; the registry resolves the names
/// during validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldTarget {
    Scalar(ScalarKind),
    Relation(EntityName),
}

/// Classifies one declared field of an entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub target: FieldTarget,
    /// List-valued. Scalar lists are requested as-is; relation lists on
    /// non-page types are rewritten to paginated relations at validation.
    pub is_array: bool,
    /// Keep the declared field name unmodified on the wire (no remap, no
    /// `_id` suffix). Used for container fields like a page's `items`.
    pub explicit: bool,
}

impl FieldDescriptor {
    #[must_use]
    pub fn scalar(kind: ScalarKind) -> Self {
        Self {
            target: FieldTarget::Scalar(kind),
            is_array: false,
            explicit: false,
        }
    }

    /// Shorthand for a string scalar.
    #[must_use]
    pub fn string() -> Self {
        Self::scalar(ScalarKind::String)
    }

    /// Shorthand for a numeric scalar.
    #[must_use]
    pub fn number() -> Self {
        Self::scalar(ScalarKind::Number)
    }

    /// Shorthand for a boolean scalar.
    #[must_use]
    pub fn boolean() -> Self {
        Self::scalar(ScalarKind::Boolean)
    }

    /// A to-one relation to the named type.
    #[must_use]
    pub fn relation(target: impl Into<EntityName>) -> Self {
        Self {
            target: FieldTarget::Relation(target.into()),
            is_array: false,
            explicit: false,
        }
    }

    /// A to-many relation to the named type. On non-page owners the
    /// registry rewrites this into a paginated relation during validation.
    #[must_use]
    pub fn relation_list(target: impl Into<EntityName>) -> Self {
        Self {
            target: FieldTarget::Relation(target.into()),
            is_array: true,
            explicit: false,
        }
    }

    /// A list of scalars, requested under its (remapped) name as-is.
    #[must_use]
    pub fn scalar_list(kind: ScalarKind) -> Self {
        Self {
            target: FieldTarget::Scalar(kind),
            is_array: true,
            explicit: false,
        }
    }

    /// Marks the field as explicitly named on the wire.
    #[must_use]
    pub fn explicit(mut self) -> Self {
        self.explicit = true;
        self
    }

    /// Whether this field points at another entity type.
    #[must_use]
    pub fn is_relation(&self) -> bool {
        matches!(self.target, FieldTarget::Relation(_))
    }

    /// The relation target name, if any.
    #[must_use]
    pub fn relation_target(&self) -> Option<&EntityName> {
        match &self.target {
            FieldTarget::Relation(name) => Some(name),
            FieldTarget::Scalar(_) => None,
        }
    }

    /// Renders this field into a query fragment using type-level
    /// information only.
    ///
    /// Rules, in order:
    /// - relation to a view target: `name{ key1 key2 }` — only the
    ///   identity-defining keys, views cannot be traversed inline
    /// - relation to an explicitly-rendered target (a page): the declared
    ///   name; the query builder replaces this with the live value's own
    ///   sub-request when one exists
    /// - `explicit` config: the declared name, untouched
    /// - to-many relation: bare remapped name (list of ids)
    /// - to-one relation: `name_id` — singular relations are requested as
    ///   their foreign key, never expanded
    /// - scalar: the remapped name
    pub fn render(&self, field_name: &str, registry: &Registry) -> SchemaResult<String> {
        let target = match &self.target {
            FieldTarget::Scalar(_) => return Ok(wire_name(field_name).to_string()),
            FieldTarget::Relation(name) => registry.resolve(name)?,
        };

        if let Some(id_keys) = target.id_keys() {
            return Ok(format!("{}{{{}}}", wire_name(field_name), id_keys.join(" ")));
        }

        if target.is_page() {
            return Ok(field_name.to_string());
        }

        if self.explicit {
            return Ok(field_name.to_string());
        }

        if self.is_array {
            return Ok(wire_name(field_name).to_string());
        }

        Ok(format!("{field_name}_id"))
    }
}

/// Remaps a declared field name to its wire name.
///
/// A static exception list, not a pluralization rule: any new plural
/// relation name must be added here explicitly or it will be requested
/// under the wrong wire name.
#[must_use]
pub fn wire_name(field_name: &str) -> &str {
    match field_name {
        "members" => "member_ids",
        "permissions" => "permission_ids",
        "players" => "player_ids",
        "matches" => "match_ids",
        "maps" => "map_ids",
        "games" => "game_ids",
        "queues" => "queue_ids",
        "whitelist" => "whitelist_ids",
        "blacklist" => "blacklist_ids",
        other => other,
    }
}
