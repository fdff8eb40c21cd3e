//! Live entity instances.
//!
//! An [`Entity`] is the single mutable object representing one identity.
//! It is created empty, registered in the identity map, then populated
//! asynchronously; all subsequent reloads mutate it in place. Consumers
//! hold `Arc<Entity>` and read through the typed accessors.

use crate::cache::Cache;
use crate::page::Page;
use crate::{CacheError, CacheResult};
use courtside_types::{EntityName, Identity, SlotKey};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, Weak};

/// Load lifecycle of a live instance. `Ready` re-enters `Loading` on
/// every reload, including push-triggered ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// A load is in flight (or about to be dispatched).
    Loading,
    /// The most recent load has been applied.
    Ready,
}

/// The current value of one field on a live instance.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Explicitly absent in the last response.
    Null,
    /// A raw scalar.
    Scalar(Value),
    /// A list of raw scalars (or foreign-key ids).
    List(Vec<Value>),
    /// A to-one relation resolved through the identity map.
    Reference(Arc<Entity>),
    /// A paginated relation, owned by this instance and updated in place.
    Page(Arc<Page>),
}

impl FieldValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

#[derive(Debug)]
struct EntityState {
    fields: HashMap<String, FieldValue>,
    args: BTreeMap<String, Value>,
    load_state: LoadState,
}

/// The mutable, self-loading object bound to one identity.
///
/// Reference-stable by construction: for a given `(type, identity)` at
/// most one instance exists for the lifetime of the cache, and data only
/// ever flows into it, never into a replacement object.
#[derive(Debug)]
pub struct Entity {
    name: EntityName,
    identity: Identity,
    slot: SlotKey,
    cache: Weak<Cache>,
    state: RwLock<EntityState>,
}

impl Entity {
    pub(crate) fn new(
        cache: Weak<Cache>,
        name: EntityName,
        identity: Identity,
        slot: SlotKey,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            identity,
            slot,
            cache,
            state: RwLock::new(EntityState {
                fields: HashMap::new(),
                args: BTreeMap::new(),
                load_state: LoadState::Loading,
            }),
        })
    }

    #[must_use]
    pub fn name(&self) -> &EntityName {
        &self.name
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The top-level query root this instance renders under.
    #[must_use]
    pub fn query_root(&self) -> String {
        self.name.query_name()
    }

    #[must_use]
    pub fn load_state(&self) -> LoadState {
        self.state.read().unwrap().load_state
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.load_state() == LoadState::Ready
    }

    /// The current value of a field, if any load has populated it.
    #[must_use]
    pub fn field_value(&self, field_name: &str) -> Option<FieldValue> {
        self.state.read().unwrap().fields.get(field_name).cloned()
    }

    /// Reads a string scalar field.
    #[must_use]
    pub fn get_str(&self, field_name: &str) -> Option<String> {
        match self.field_value(field_name)? {
            FieldValue::Scalar(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Reads a numeric scalar field.
    #[must_use]
    pub fn get_f64(&self, field_name: &str) -> Option<f64> {
        match self.field_value(field_name)? {
            FieldValue::Scalar(value) => value.as_f64(),
            _ => None,
        }
    }

    /// Reads an integer scalar field (foreign keys included).
    #[must_use]
    pub fn get_i64(&self, field_name: &str) -> Option<i64> {
        match self.field_value(field_name)? {
            FieldValue::Scalar(value) => value.as_i64(),
            _ => None,
        }
    }

    /// Reads a boolean scalar field.
    #[must_use]
    pub fn get_bool(&self, field_name: &str) -> Option<bool> {
        match self.field_value(field_name)? {
            FieldValue::Scalar(value) => value.as_bool(),
            _ => None,
        }
    }

    /// The live instance behind a to-one relation field.
    #[must_use]
    pub fn relation(&self, field_name: &str) -> Option<Arc<Entity>> {
        match self.field_value(field_name)? {
            FieldValue::Reference(entity) => Some(entity),
            _ => None,
        }
    }

    /// The page behind a paginated relation field.
    #[must_use]
    pub fn page(&self, field_name: &str) -> Option<Arc<Page>> {
        match self.field_value(field_name)? {
            FieldValue::Page(page) => Some(page),
            _ => None,
        }
    }

    /// The raw values of a list field.
    #[must_use]
    pub fn list(&self, field_name: &str) -> Option<Vec<Value>> {
        match self.field_value(field_name)? {
            FieldValue::List(values) => Some(values),
            _ => None,
        }
    }

    /// Sets an ad-hoc query argument (e.g. for computed server fields).
    /// Takes effect on the next reload.
    pub fn set_arg(&self, name: impl Into<String>, value: Value) {
        self.state.write().unwrap().args.insert(name.into(), value);
    }

    /// Snapshot of the current ad-hoc arguments.
    #[must_use]
    pub fn args(&self) -> BTreeMap<String, Value> {
        self.state.read().unwrap().args.clone()
    }

    /// Reloads this instance through its cache.
    ///
    /// Fails with [`CacheError::Detached`] if the cache is gone or the
    /// instance has been evicted.
    pub async fn load(&self) -> CacheResult<()> {
        let cache = self
            .cache
            .upgrade()
            .ok_or_else(|| CacheError::Detached(self.name.to_string()))?;
        let this = cache
            .lookup_slot(&self.name, self.slot)
            .ok_or_else(|| CacheError::Detached(self.name.to_string()))?;
        cache.load(&this).await
    }

    pub(crate) fn set_load_state(&self, load_state: LoadState) {
        self.state.write().unwrap().load_state = load_state;
    }

    /// Applies a batch of field updates under one write lock.
    pub(crate) fn apply_updates(&self, updates: Vec<(String, FieldValue)>) {
        let mut state = self.state.write().unwrap();
        for (name, value) in updates {
            state.fields.insert(name, value);
        }
    }

    /// Sets a field only if it has no value yet. Returns whether it wrote.
    pub(crate) fn init_field(&self, field_name: &str, value: FieldValue) -> bool {
        let mut state = self.state.write().unwrap();
        if state.fields.contains_key(field_name) {
            return false;
        }
        state.fields.insert(field_name.to_string(), value);
        true
    }

    /// Unconditionally resets a field to an empty container.
    pub(crate) fn reset_field(&self, field_name: &str, value: FieldValue) {
        self.state
            .write()
            .unwrap()
            .fields
            .insert(field_name.to_string(), value);
    }
}
