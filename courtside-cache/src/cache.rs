//! The identity map: `(type, identity) → live instance`.
//!
//! The cache is an explicit context object constructed once at startup and
//! passed by reference to everything that needs it; there is no ambient
//! global table. Construction goes through factory functions, never
//! through entity constructors: `get_or_create` is idempotent and
//! side-effect-free on a hit, and a miss registers the new instance in the
//! map *before* its first load is dispatched, so a push event arriving
//! mid-load can still find and re-trigger it.

use crate::config::CacheConfig;
use crate::entity::{Entity, FieldValue, LoadState};
use crate::page::Page;
use crate::query;
use crate::{CacheError, CacheResult};
use courtside_schema::{Registry, SchemaError, list_type_name, wire_name};
use courtside_transport::Transport;
use courtside_types::{EntityName, Identity, PushEvent, SlotKey};
use serde_json::Value;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, RwLock, Weak};
use tracing::{debug, info, warn};

/// The single source of truth for live entity instances.
pub struct Cache {
    registry: Arc<Registry>,
    transport: Arc<dyn Transport>,
    config: CacheConfig,
    slots: RwLock<HashMap<(EntityName, SlotKey), Arc<Entity>>>,
    /// Materialized "all of type" list views, per item type.
    lists: RwLock<HashMap<EntityName, Vec<Weak<Entity>>>>,
}

impl Cache {
    /// Creates a cache over a validated registry and a transport.
    pub fn new(
        registry: Arc<Registry>,
        transport: Arc<dyn Transport>,
        config: CacheConfig,
    ) -> CacheResult<Arc<Self>> {
        if !registry.is_validated() {
            return Err(SchemaError::NotValidated.into());
        }
        info!(client = %config.client_name, "cache created");
        Ok(Arc::new(Self {
            registry,
            transport,
            config,
            slots: RwLock::new(HashMap::new()),
            lists: RwLock::new(HashMap::new()),
        }))
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Number of live instances currently cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.read().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.read().unwrap().is_empty()
    }

    // ── Factories ────────────────────────────────────────────────

    /// Returns the live instance for `(type, id)`, constructing and
    /// loading it in the background on a miss. Idempotent on a hit: the
    /// existing instance comes back unchanged and no load is triggered.
    pub fn get_or_create(
        self: &Arc<Self>,
        type_name: impl Into<EntityName>,
        id: i64,
    ) -> CacheResult<Arc<Entity>> {
        self.keyed_inner(type_name.into(), id, false)
    }

    /// Like [`Cache::get_or_create`] but without dispatching the initial
    /// load; the caller decides when the first fetch happens.
    pub fn get_or_create_deferred(
        self: &Arc<Self>,
        type_name: impl Into<EntityName>,
        id: i64,
    ) -> CacheResult<Arc<Entity>> {
        self.keyed_inner(type_name.into(), id, true)
    }

    /// The cached instance for `(type, id)`, if one exists. Never
    /// constructs.
    #[must_use]
    pub fn get(&self, type_name: impl Into<EntityName>, id: i64) -> Option<Arc<Entity>> {
        self.lookup_slot(&type_name.into(), SlotKey::Key(id))
    }

    /// Constructs a view instance under a fresh slot. Views are never
    /// deduplicated: two calls with identical composite arguments yield
    /// distinct instances.
    pub fn create_view(
        self: &Arc<Self>,
        type_name: impl Into<EntityName>,
        identity: Identity,
    ) -> CacheResult<Arc<Entity>> {
        self.view_inner(type_name.into(), identity, false)
    }

    /// Like [`Cache::create_view`] without the initial load.
    pub fn create_view_deferred(
        self: &Arc<Self>,
        type_name: impl Into<EntityName>,
        identity: Identity,
    ) -> CacheResult<Arc<Entity>> {
        self.view_inner(type_name.into(), identity, true)
    }

    /// Materializes an "all of type" collection: a synthesized list view
    /// with one paginated field over the item type (reachable via
    /// `entity.page(&list_field_name(item))`). `EntityCreated` push events
    /// for the item type reload every list materialized this way.
    pub fn all(self: &Arc<Self>, item_type: impl Into<EntityName>) -> CacheResult<Arc<Entity>> {
        let item = item_type.into();
        let list = self.view_inner(
            list_type_name(&item),
            Identity::view(Vec::<(String, Value)>::new()),
            false,
        )?;
        self.lists
            .write()
            .unwrap()
            .entry(item)
            .or_default()
            .push(Arc::downgrade(&list));
        Ok(list)
    }

    fn keyed_inner(
        self: &Arc<Self>,
        name: EntityName,
        id: i64,
        defer: bool,
    ) -> CacheResult<Arc<Entity>> {
        let ty = self.registry.resolve(&name)?;
        if ty.is_view() || ty.is_page() {
            return Err(CacheError::IdentityMismatch {
                type_name: name.normalized().to_string(),
                message: "scalar id given for a non-keyed type".to_string(),
            });
        }
        let name = ty.name().clone();

        let (entity, created) = self.register(name, Identity::Key(id), SlotKey::Key(id));
        if created {
            debug!(root = %entity.query_root(), id, "cache miss, registered new instance");
            self.ensure_containers(&entity)?;
            if !defer {
                self.spawn_load(Arc::clone(&entity));
            }
        } else {
            debug!(root = %entity.query_root(), id, "cache hit");
        }
        Ok(entity)
    }

    fn view_inner(
        self: &Arc<Self>,
        name: EntityName,
        identity: Identity,
        defer: bool,
    ) -> CacheResult<Arc<Entity>> {
        let ty = self.registry.resolve(&name)?;
        let Some(id_keys) = ty.id_keys() else {
            return Err(CacheError::IdentityMismatch {
                type_name: name.normalized().to_string(),
                message: "not a view type".to_string(),
            });
        };
        let Some(params) = identity.as_view() else {
            return Err(CacheError::IdentityMismatch {
                type_name: name.normalized().to_string(),
                message: "view constructed without its composite identity".to_string(),
            });
        };
        for key in id_keys {
            if !params.contains_key(key) {
                return Err(CacheError::IdentityMismatch {
                    type_name: name.normalized().to_string(),
                    message: format!("composite identity is missing {key}"),
                });
            }
        }
        let name = ty.name().clone();

        let (entity, _) = self.register(name, identity, SlotKey::generate());
        debug!(root = %entity.query_root(), "registered view instance");
        self.ensure_containers(&entity)?;
        if !defer {
            self.spawn_load(Arc::clone(&entity));
        }
        Ok(entity)
    }

    fn register(
        self: &Arc<Self>,
        name: EntityName,
        identity: Identity,
        slot: SlotKey,
    ) -> (Arc<Entity>, bool) {
        let mut slots = self.slots.write().unwrap();
        match slots.entry((name.clone(), slot)) {
            Entry::Occupied(occupied) => (Arc::clone(occupied.get()), false),
            Entry::Vacant(vacant) => {
                let entity = Entity::new(Arc::downgrade(self), name, identity, slot);
                vacant.insert(Arc::clone(&entity));
                (entity, true)
            }
        }
    }

    pub(crate) fn lookup_slot(&self, name: &EntityName, slot: SlotKey) -> Option<Arc<Entity>> {
        self.slots.read().unwrap().get(&(name.clone(), slot)).cloned()
    }

    // ── Retention ────────────────────────────────────────────────
    //
    // No TTL: instances live as long as the cache unless explicitly
    // evicted. Callers owning navigation decide when to drop state.

    /// Removes one keyed instance from the map. Consumers still holding
    /// the `Arc` keep a detached object that can no longer reload.
    pub fn evict(&self, type_name: impl Into<EntityName>, id: i64) -> Option<Arc<Entity>> {
        self.slots
            .write()
            .unwrap()
            .remove(&(type_name.into(), SlotKey::Key(id)))
    }

    /// Drops every cached instance and materialized list.
    pub fn clear(&self) {
        self.slots.write().unwrap().clear();
        self.lists.write().unwrap().clear();
    }

    // ── Loading ──────────────────────────────────────────────────

    /// Reloads one instance: render → send → apply in place.
    ///
    /// Overlapping loads of the same instance are not serialized; the
    /// response applied last becomes the visible state even if its
    /// request was issued earlier. Once dispatched, a load always applies
    /// its result when it returns.
    pub async fn load(self: &Arc<Self>, entity: &Arc<Entity>) -> CacheResult<()> {
        entity.set_load_state(LoadState::Loading);
        self.ensure_containers(entity)?;

        let request = query::render_entity(&self.registry, entity, None)?;
        debug!(root = %entity.query_root(), %request, "dispatching load");

        let response = self.transport.send(&request).await?;
        let root = entity.query_root();
        let payload = response
            .get(&root)
            .filter(|value| !value.is_null())
            .cloned()
            .ok_or_else(|| CacheError::MissingData(root.clone()))?;

        self.apply_data(entity, &payload)?;
        entity.set_load_state(LoadState::Ready);
        Ok(())
    }

    fn spawn_load(self: &Arc<Self>, entity: Arc<Entity>) {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(error) = cache.load(&entity).await {
                warn!(root = %entity.query_root(), %error, "background load failed");
            }
        });
    }

    /// Pre-populates container fields so consumers can observe an empty
    /// page/list before the first response arrives.
    fn ensure_containers(&self, entity: &Arc<Entity>) -> CacheResult<()> {
        for (field_name, descriptor) in self.registry.fields_of(entity.name())? {
            if let Some(target) = descriptor.relation_target() {
                let ty = self.registry.resolve(target)?;
                if ty.is_page() && !descriptor.is_array {
                    let exists = matches!(entity.field_value(field_name), Some(FieldValue::Page(_)));
                    if !exists {
                        let Some(item) = ty.page_item() else { continue };
                        let page = Page::new(
                            entity,
                            field_name,
                            ty.name().clone(),
                            item.clone(),
                            self.config.default_page_args(),
                        );
                        entity.reset_field(field_name, FieldValue::Page(page));
                    }
                    continue;
                }
            }
            if descriptor.is_array && !descriptor.explicit {
                entity.init_field(field_name, FieldValue::List(Vec::new()));
            }
        }
        Ok(())
    }

    /// Applies a response payload onto an instance, field by field.
    ///
    /// Values are looked up by wire name. To-one relations resolve their
    /// foreign-key id through the identity map (constructing and loading
    /// the related instance if unseen); page fields are updated in place,
    /// never replaced; scalars are assigned raw. An individual absent
    /// field is legitimate and becomes `Null`.
    pub(crate) fn apply_data(
        self: &Arc<Self>,
        entity: &Arc<Entity>,
        data: &Value,
    ) -> CacheResult<()> {
        let Some(payload) = data.as_object() else {
            return Err(CacheError::MissingData(entity.query_root()));
        };

        let mut updates: Vec<(String, FieldValue)> = Vec::new();
        for (field_name, descriptor) in self.registry.fields_of(entity.name())? {
            match descriptor.relation_target() {
                Some(target) if !descriptor.is_array => {
                    let ty = self.registry.resolve(target)?;
                    if ty.is_page() {
                        match payload.get(field_name) {
                            // Absent page payloads leave the live container
                            // untouched; it must stay reference-stable.
                            None | Some(Value::Null) => {}
                            Some(value) => {
                                let page = match entity.field_value(field_name) {
                                    Some(FieldValue::Page(page)) => page,
                                    _ => {
                                        let Some(item) = ty.page_item() else { continue };
                                        let page = Page::new(
                                            entity,
                                            field_name,
                                            ty.name().clone(),
                                            item.clone(),
                                            self.config.default_page_args(),
                                        );
                                        updates.push((
                                            field_name.clone(),
                                            FieldValue::Page(Arc::clone(&page)),
                                        ));
                                        page
                                    }
                                };
                                self.apply_page_data(&page, value)?;
                            }
                        }
                    } else if ty.is_view() {
                        match payload.get(field_name) {
                            Some(Value::Object(params)) => {
                                let identity = Identity::View(
                                    params.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                                );
                                let view = self.view_inner(ty.name().clone(), identity, false)?;
                                updates.push((field_name.clone(), FieldValue::Reference(view)));
                            }
                            _ => updates.push((field_name.clone(), FieldValue::Null)),
                        }
                    } else {
                        let wire = format!("{}_id", wire_name(field_name));
                        match payload.get(&wire).and_then(scalar_id) {
                            Some(id) => {
                                let child = self.keyed_inner(ty.name().clone(), id, false)?;
                                updates.push((field_name.clone(), FieldValue::Reference(child)));
                            }
                            None => updates.push((field_name.clone(), FieldValue::Null)),
                        }
                    }
                }
                Some(_) if descriptor.explicit => {
                    // A page's own items field; apply_page_data owns it.
                }
                Some(_) => match payload.get(wire_name(field_name)) {
                    Some(Value::Array(values)) => {
                        updates.push((field_name.clone(), FieldValue::List(values.clone())));
                    }
                    _ => updates.push((field_name.clone(), FieldValue::Null)),
                },
                None => match payload.get(wire_name(field_name)) {
                    None | Some(Value::Null) => {
                        updates.push((field_name.clone(), FieldValue::Null));
                    }
                    Some(Value::Array(values)) => {
                        updates.push((field_name.clone(), FieldValue::List(values.clone())));
                    }
                    Some(value) => {
                        updates.push((field_name.clone(), FieldValue::Scalar(value.clone())));
                    }
                },
            }
        }

        entity.apply_updates(updates);
        Ok(())
    }

    /// Clears and repopulates a page from its nested response object.
    ///
    /// Items may arrive as bare ids (each resolves through the identity
    /// map and loads itself) or as inline objects carrying an `id` (each
    /// resolves through the identity map and is populated from the inline
    /// payload without another round-trip).
    fn apply_page_data(self: &Arc<Self>, page: &Arc<Page>, data: &Value) -> CacheResult<()> {
        let Some(payload) = data.as_object() else {
            return Err(CacheError::MissingData(page.field_name().to_string()));
        };

        let count = payload.get("count").and_then(Value::as_u64);
        let mut items: Vec<Arc<Entity>> = Vec::new();
        if let Some(list) = payload.get("items").and_then(Value::as_array) {
            for item in list {
                if let Some(id) = scalar_id(item) {
                    items.push(self.keyed_inner(page.item_type().clone(), id, false)?);
                } else if let Some(id) = item.get("id").and_then(scalar_id) {
                    let child = self.keyed_inner(page.item_type().clone(), id, true)?;
                    self.apply_data(&child, item)?;
                    child.set_load_state(LoadState::Ready);
                    items.push(child);
                } else {
                    warn!(field = page.field_name(), "page item without id, skipping");
                }
            }
        }

        page.replace(items, count);
        Ok(())
    }

    // ── Push reconciliation ──────────────────────────────────────

    /// Routes one push event into targeted reloads.
    ///
    /// `EntityUpdated` reloads the keyed instance cached under the
    /// event's identity (a no-op when nothing is cached) plus every view
    /// whose composite identity carries `<type>_id` equal to the id.
    /// `EntityCreated` reloads every materialized list of that type.
    /// Failures are logged, never propagated: events are best-effort
    /// hints and the next one will try again.
    pub async fn handle_event(self: &Arc<Self>, event: &PushEvent) {
        match event {
            PushEvent::EntityUpdated { type_name, id } => {
                let Some(ty) = self.registry.get(type_name) else {
                    debug!(type_name, "update event for unregistered type, ignoring");
                    return;
                };
                let name = ty.name().clone();

                let mut targets: Vec<Arc<Entity>> = Vec::new();
                if let Some(entity) = self.lookup_slot(&name, SlotKey::Key(*id)) {
                    targets.push(entity);
                }

                let key_field = format!("{}_id", name.normalized());
                {
                    let slots = self.slots.read().unwrap();
                    for entity in slots.values() {
                        if let Identity::View(params) = entity.identity() {
                            if params.get(&key_field).and_then(scalar_id) == Some(*id) {
                                targets.push(Arc::clone(entity));
                            }
                        }
                    }
                }

                if targets.is_empty() {
                    debug!(type_name, id, "update event matched nothing, no-op");
                    return;
                }
                for entity in targets {
                    if let Err(error) = self.load(&entity).await {
                        warn!(root = %entity.query_root(), %error, "push-triggered reload failed");
                    }
                }
            }

            PushEvent::EntityCreated { type_name, id } => {
                let Some(ty) = self.registry.get(type_name) else {
                    debug!(type_name, "created event for unregistered type, ignoring");
                    return;
                };
                let name = ty.name().clone();

                let watchers: Vec<Arc<Entity>> = {
                    let mut lists = self.lists.write().unwrap();
                    let Some(entries) = lists.get_mut(&name) else {
                        return;
                    };
                    entries.retain(|weak| weak.strong_count() > 0);
                    entries.iter().filter_map(Weak::upgrade).collect()
                };

                debug!(type_name, id, lists = watchers.len(), "created event");
                for list in watchers {
                    if let Err(error) = self.load(&list).await {
                        warn!(root = %list.query_root(), %error, "list reload failed");
                    }
                }
            }
        }
    }
}

/// Accepts ids as JSON numbers or numeric strings (the wire is loose
/// about this).
fn scalar_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
