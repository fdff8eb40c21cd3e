//! Parent-owned paginated sub-collections.
//!
//! A [`Page`] cannot exist without a parent entity: the cache constructs
//! one per paginated relation field when the parent is registered, and the
//! page's query is only ever rendered as a sub-selection of the parent's
//! request. Changing a page's filters therefore reloads the whole parent
//! object graph — a deliberate simplicity/cost trade-off, and a known
//! performance concern for large parents.

use crate::entity::Entity;
use crate::{CacheError, CacheResult};
use courtside_types::EntityName;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, Weak};

#[derive(Debug)]
struct PageState {
    items: Vec<Arc<Entity>>,
    count: Option<u64>,
    args: BTreeMap<String, Value>,
}

/// A self-contained paginated collection bound to one relation field of
/// one parent entity.
///
/// `items` is replaced wholesale on each reload; `count` is the
/// server-reported total across all pages. The read accessors operate on
/// the current in-memory snapshot only and never trigger a fetch.
#[derive(Debug)]
pub struct Page {
    parent: Weak<Entity>,
    field_name: String,
    type_name: EntityName,
    item_type: EntityName,
    state: RwLock<PageState>,
}

impl Page {
    pub(crate) fn new(
        parent: &Arc<Entity>,
        field_name: impl Into<String>,
        type_name: EntityName,
        item_type: EntityName,
        default_args: BTreeMap<String, Value>,
    ) -> Arc<Self> {
        Arc::new(Self {
            parent: Arc::downgrade(parent),
            field_name: field_name.into(),
            type_name,
            item_type,
            state: RwLock::new(PageState {
                items: Vec::new(),
                count: None,
                args: default_args,
            }),
        })
    }

    /// The relation field this page lives under on its parent.
    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// The synthesized page type backing this collection.
    #[must_use]
    pub fn type_name(&self) -> &EntityName {
        &self.type_name
    }

    /// The paginated item type.
    #[must_use]
    pub fn item_type(&self) -> &EntityName {
        &self.item_type
    }

    /// The owning parent entity.
    pub fn parent(&self) -> CacheResult<Arc<Entity>> {
        self.parent.upgrade().ok_or(CacheError::PageDetached)
    }

    /// Snapshot of the current items.
    #[must_use]
    pub fn items(&self) -> Vec<Arc<Entity>> {
        self.state.read().unwrap().items.clone()
    }

    /// Number of items currently held (one page's worth, not the total).
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().unwrap().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().unwrap().items.is_empty()
    }

    /// Server-reported total across all pages, once known.
    #[must_use]
    pub fn count(&self) -> Option<u64> {
        self.state.read().unwrap().count
    }

    /// Snapshot of the current filter/pagination arguments.
    #[must_use]
    pub fn args(&self) -> BTreeMap<String, Value> {
        self.state.read().unwrap().args.clone()
    }

    /// One argument's current value.
    #[must_use]
    pub fn arg(&self, name: &str) -> Option<Value> {
        self.state.read().unwrap().args.get(name).cloned()
    }

    /// Projects each current item through `f`.
    pub fn map<T>(&self, f: impl FnMut(&Arc<Entity>) -> T) -> Vec<T> {
        self.state.read().unwrap().items.iter().map(f).collect()
    }

    /// The current items passing `predicate`.
    pub fn filter_items(&self, mut predicate: impl FnMut(&Arc<Entity>) -> bool) -> Vec<Arc<Entity>> {
        self.state
            .read()
            .unwrap()
            .items
            .iter()
            .filter(|item| predicate(item))
            .cloned()
            .collect()
    }

    /// Whether any current item passes `predicate`.
    pub fn any(&self, mut predicate: impl FnMut(&Arc<Entity>) -> bool) -> bool {
        self.state
            .read()
            .unwrap()
            .items
            .iter()
            .any(|item| predicate(item))
    }

    /// Sets one filter argument, then reloads the owning parent.
    pub async fn set_filter(&self, name: impl Into<String>, value: Value) -> CacheResult<()> {
        self.state.write().unwrap().args.insert(name.into(), value);
        self.reload_parent().await
    }

    /// Applies several filter arguments with a single parent reload.
    pub async fn set_filters(
        &self,
        filters: impl IntoIterator<Item = (String, Value)>,
    ) -> CacheResult<()> {
        {
            let mut state = self.state.write().unwrap();
            for (name, value) in filters {
                state.args.insert(name, value);
            }
        }
        self.reload_parent().await
    }

    /// Jumps to the given page number.
    pub async fn set_page(&self, page: u64) -> CacheResult<()> {
        self.set_filter("page", json!(page)).await
    }

    /// Changes the page size.
    pub async fn set_size(&self, size: u64) -> CacheResult<()> {
        self.set_filter("size", json!(size)).await
    }

    async fn reload_parent(&self) -> CacheResult<()> {
        self.parent()?.load().await
    }

    /// Replaces the item list and count from a fresh response.
    pub(crate) fn replace(&self, items: Vec<Arc<Entity>>, count: Option<u64>) {
        let mut state = self.state.write().unwrap();
        state.items = items;
        state.count = count;
    }
}
