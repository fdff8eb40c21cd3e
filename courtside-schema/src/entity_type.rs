//! Declarative entity-type tables.
//!
//! An [`EntityType`] is a statically-declared mapping from field name to
//! [`FieldDescriptor`], built once at startup through the builder methods
//! and validated by the registry. Declaration order is preserved so that
//! generated queries are deterministic.

use crate::field::{FieldDescriptor, ScalarKind};
use courtside_types::EntityName;
use serde::{Deserialize, Serialize};

/// The flavor of an entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Identified by a single scalar id; canonical in the cache.
    Keyed,
    /// Identified by a composite parameter mapping; never deduplicated.
    View {
        /// The identity-defining parameter names, in wire order.
        id_keys: Vec<String>,
    },
    /// A synthesized paginated container around an item type. Pages render
    /// explicitly (their live sub-request is inlined into the parent's).
    Page {
        /// The paginated item type.
        item: EntityName,
    },
}

/// A declared entity shape: name, kind, optional parent, ordered fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityType {
    name: EntityName,
    kind: EntityKind,
    extends: Option<EntityName>,
    fields: Vec<(String, FieldDescriptor)>,
}

impl EntityType {
    /// Declares a keyed entity type.
    #[must_use]
    pub fn keyed(name: impl Into<EntityName>) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::Keyed,
            extends: None,
            fields: Vec::new(),
        }
    }

    /// Declares a view type with the given composite-identity keys.
    #[must_use]
    pub fn view(
        name: impl Into<EntityName>,
        id_keys: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::View {
                id_keys: id_keys.into_iter().map(Into::into).collect(),
            },
            extends: None,
            fields: Vec::new(),
        }
    }

    /// Synthesizes the page type wrapping `item`, named `<Item>Page`.
    #[must_use]
    pub fn page_of(item: EntityName) -> Self {
        let name = EntityName::new(format!("{}Page", item.declared()));
        Self {
            name,
            kind: EntityKind::Page { item: item.clone() },
            extends: None,
            fields: vec![
                (
                    "items".to_string(),
                    FieldDescriptor::relation_list(item).explicit(),
                ),
                ("count".to_string(), FieldDescriptor::number()),
            ],
        }
    }

    /// Declares a parent type whose fields are merged in during
    /// validation. Same-named fields keep the child's descriptor.
    #[must_use]
    pub fn extends(mut self, parent: impl Into<EntityName>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    /// Adds a field with an arbitrary descriptor.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        self.fields.push((name.into(), descriptor));
        self
    }

    /// Shorthand for a string scalar field.
    #[must_use]
    pub fn string(self, name: impl Into<String>) -> Self {
        self.field(name, FieldDescriptor::string())
    }

    /// Shorthand for a numeric scalar field.
    #[must_use]
    pub fn number(self, name: impl Into<String>) -> Self {
        self.field(name, FieldDescriptor::number())
    }

    /// Shorthand for a boolean scalar field.
    #[must_use]
    pub fn boolean(self, name: impl Into<String>) -> Self {
        self.field(name, FieldDescriptor::boolean())
    }

    /// Shorthand for a to-one relation field.
    #[must_use]
    pub fn relation(self, name: impl Into<String>, target: impl Into<EntityName>) -> Self {
        self.field(name, FieldDescriptor::relation(target))
    }

    /// Shorthand for a paginated to-many relation field.
    #[must_use]
    pub fn relation_list(self, name: impl Into<String>, target: impl Into<EntityName>) -> Self {
        self.field(name, FieldDescriptor::relation_list(target))
    }

    /// Shorthand for a scalar list field.
    #[must_use]
    pub fn scalar_list(self, name: impl Into<String>, kind: ScalarKind) -> Self {
        self.field(name, FieldDescriptor::scalar_list(kind))
    }

    #[must_use]
    pub fn name(&self) -> &EntityName {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    #[must_use]
    pub fn parent(&self) -> Option<&EntityName> {
        self.extends.as_ref()
    }

    #[must_use]
    pub fn is_page(&self) -> bool {
        matches!(self.kind, EntityKind::Page { .. })
    }

    #[must_use]
    pub fn is_view(&self) -> bool {
        matches!(self.kind, EntityKind::View { .. })
    }

    /// The composite-identity keys, if this is a view type.
    #[must_use]
    pub fn id_keys(&self) -> Option<&[String]> {
        match &self.kind {
            EntityKind::View { id_keys } => Some(id_keys),
            _ => None,
        }
    }

    /// The paginated item type, if this is a page type.
    #[must_use]
    pub fn page_item(&self) -> Option<&EntityName> {
        match &self.kind {
            EntityKind::Page { item } => Some(item),
            _ => None,
        }
    }

    /// The fields declared directly on this type, in declaration order.
    /// The registry's resolved tables include inherited fields as well.
    #[must_use]
    pub fn declared_fields(&self) -> &[(String, FieldDescriptor)] {
        &self.fields
    }
}
