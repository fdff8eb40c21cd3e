//! Entity type names and identities.
//!
//! Type names are compared case-insensitively: the cache and the schema
//! registry key everything by the normalized (lowercased) form, while the
//! declared form is kept for rendering query roots.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// The declared name of an entity type (e.g. `Team`, `MapPickProcess`).
///
/// Equality and hashing use the normalized form, so `Team` and `team` name
/// the same type. The query root name lowercases only the first character
/// (`MapPickProcess` → `mapPickProcess`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct EntityName {
    declared: String,
    normalized: String,
}

impl EntityName {
    #[must_use]
    pub fn new(declared: impl Into<String>) -> Self {
        let declared = declared.into();
        let normalized = declared.to_lowercase();
        Self {
            declared,
            normalized,
        }
    }

    /// The name as declared in the schema.
    #[must_use]
    pub fn declared(&self) -> &str {
        &self.declared
    }

    /// The lowercased form used as a lookup key.
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// The query-root spelling: declared name with the first character
    /// lowercased.
    #[must_use]
    pub fn query_name(&self) -> String {
        let mut chars = self.declared.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl PartialEq for EntityName {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for EntityName {}

impl std::hash::Hash for EntityName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl From<String> for EntityName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for EntityName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<EntityName> for String {
    fn from(name: EntityName) -> Self {
        name.declared
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.declared)
    }
}

/// The identity of a live entity instance.
///
/// Keyed entities are named by a single scalar id and are canonical in the
/// cache. Views are named by a composite mapping of parameters and are
/// never deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identity {
    /// A scalar primary key.
    Key(i64),
    /// A composite identity, e.g. `{player_id: 3, team_id: 7}`.
    View(BTreeMap<String, Value>),
}

impl Identity {
    /// Builds a composite identity from key/value pairs.
    #[must_use]
    pub fn view<K: Into<String>, V: Into<Value>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self::View(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    #[must_use]
    pub fn is_view(&self) -> bool {
        matches!(self, Self::View(_))
    }

    /// The scalar key, if this is a keyed identity.
    #[must_use]
    pub fn as_key(&self) -> Option<i64> {
        match self {
            Self::Key(id) => Some(*id),
            Self::View(_) => None,
        }
    }

    /// The composite parameter map, if this is a view identity.
    #[must_use]
    pub fn as_view(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Key(_) => None,
            Self::View(map) => Some(map),
        }
    }
}

impl From<i64> for Identity {
    fn from(id: i64) -> Self {
        Self::Key(id)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(id) => write!(f, "{id}"),
            Self::View(map) => {
                let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                write!(f, "view({})", keys.join(", "))
            }
        }
    }
}

/// The key a live instance is cached under.
///
/// Keyed entities use their scalar id. Views get a freshly generated token
/// per construction, so two views with identical composite parameters
/// occupy distinct slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotKey {
    Key(i64),
    Token(Uuid),
}

impl SlotKey {
    /// Generates a fresh token for a view slot.
    #[must_use]
    pub fn generate() -> Self {
        Self::Token(Uuid::now_v7())
    }
}

impl From<i64> for SlotKey {
    fn from(id: i64) -> Self {
        Self::Key(id)
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(id) => write!(f, "{id}"),
            Self::Token(token) => write!(f, "{token}"),
        }
    }
}
