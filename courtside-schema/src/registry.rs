//! The schema registry: name→type table and two-phase validation.
//!
//! Phase one declares every shape with relation targets referenced by
//! name, which breaks circular dependencies between types (`Team` and
//! `Player` can reference each other freely). Phase two,
//! [`Registry::validate`], resolves every reference, synthesizes page
//! types for paginated relations and list views for keyed types, merges
//! inherited fields, and memoizes the resulting tables. The cache only
//! ever consumes a validated registry.

use crate::entity_type::{EntityKind, EntityType};
use crate::field::FieldDescriptor;
use crate::{SchemaError, SchemaResult};
use courtside_types::EntityName;
use std::collections::{HashMap, HashSet};

/// The name→type table used to resolve relation fields declared by name.
#[derive(Debug, Default)]
pub struct Registry {
    types: HashMap<String, EntityType>,
    resolved: HashMap<String, Vec<(String, FieldDescriptor)>>,
    validated: bool,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a type to the table. All types must be registered before
    /// [`Registry::validate`] runs.
    pub fn register(&mut self, entity_type: EntityType) -> SchemaResult<()> {
        let key = entity_type.name().normalized().to_string();
        if self.types.contains_key(&key) {
            return Err(SchemaError::DuplicateType(key));
        }
        self.types.insert(key, entity_type);
        self.validated = false;
        Ok(())
    }

    /// Looks up a type by name.
    pub fn resolve(&self, name: &EntityName) -> SchemaResult<&EntityType> {
        self.types
            .get(name.normalized())
            .ok_or_else(|| SchemaError::UnknownType(name.normalized().to_string()))
    }

    /// Looks up a type by raw name (used when routing push events).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EntityType> {
        self.types.get(name.to_lowercase().as_str())
    }

    #[must_use]
    pub fn is_validated(&self) -> bool {
        self.validated
    }

    /// The memoized field table for a type: inherited fields merged in and
    /// paginated relations rewritten. Requires a prior successful
    /// [`Registry::validate`].
    pub fn fields_of(&self, name: &EntityName) -> SchemaResult<&[(String, FieldDescriptor)]> {
        if !self.validated {
            return Err(SchemaError::NotValidated);
        }
        self.resolved
            .get(name.normalized())
            .map(Vec::as_slice)
            .ok_or_else(|| SchemaError::UnknownType(name.normalized().to_string()))
    }

    /// Looks up one field's descriptor on a validated type.
    pub fn field(&self, name: &EntityName, field_name: &str) -> SchemaResult<&FieldDescriptor> {
        self.fields_of(name)?
            .iter()
            .find(|(n, _)| n == field_name)
            .map(|(_, d)| d)
            .ok_or_else(|| SchemaError::Malformed {
                type_name: name.normalized().to_string(),
                message: format!("no field named {field_name}"),
            })
    }

    /// Resolves every reference and builds the memoized field tables.
    ///
    /// - synthesizes an `<Item>List` view (with one paginated field) for
    ///   every keyed type, backing "all of type" collections
    /// - merges parent fields into child tables (child wins on same name)
    /// - rewrites to-many relations on non-page types into paginated
    ///   relations, synthesizing the `<Item>Page` types they point at
    /// - fails on unknown targets, unknown parents, and inheritance cycles
    pub fn validate(&mut self) -> SchemaResult<()> {
        // List views for keyed types. Collected first: synthesis must not
        // alias a hand-declared type.
        let mut synthesized: Vec<EntityType> = Vec::new();
        for ty in self.types.values() {
            if matches!(ty.kind(), EntityKind::Keyed) {
                let list = EntityType::view(list_type_name(ty.name()), Vec::<String>::new())
                    .relation_list(list_field_name(ty.name()), ty.name().clone());
                if !self.types.contains_key(list.name().normalized()) {
                    synthesized.push(list);
                }
            }
        }
        for ty in synthesized {
            self.types.insert(ty.name().normalized().to_string(), ty);
        }

        // Inherited field merge, child declaration order first.
        let mut merged: HashMap<String, Vec<(String, FieldDescriptor)>> = HashMap::new();
        for (key, ty) in &self.types {
            merged.insert(key.clone(), self.merge_fields(ty)?);
        }

        // Paginate to-many relations and synthesize the page types.
        let mut pages: HashMap<String, EntityType> = HashMap::new();
        for (key, fields) in &mut merged {
            let owner_is_page = self
                .types
                .get(key)
                .is_some_and(EntityType::is_page);
            if owner_is_page {
                continue;
            }
            for (_, descriptor) in fields.iter_mut() {
                let Some(target) = descriptor.relation_target().cloned() else {
                    continue;
                };
                if !descriptor.is_array || descriptor.explicit {
                    continue;
                }
                let target_ty = self
                    .types
                    .get(target.normalized())
                    .ok_or_else(|| SchemaError::UnknownType(target.normalized().to_string()))?;
                let page = EntityType::page_of(target_ty.name().clone());
                let page_name = page.name().clone();
                if !self.types.contains_key(page_name.normalized()) {
                    pages.entry(page_name.normalized().to_string()).or_insert(page);
                }
                *descriptor = FieldDescriptor::relation(page_name);
            }
        }
        for (key, page) in pages {
            merged.insert(key.clone(), page.declared_fields().to_vec());
            self.types.insert(key, page);
        }

        // Every remaining relation target must resolve.
        for fields in merged.values() {
            for (_, descriptor) in fields {
                if let Some(target) = descriptor.relation_target() {
                    if !self.types.contains_key(target.normalized()) {
                        return Err(SchemaError::UnknownType(
                            target.normalized().to_string(),
                        ));
                    }
                }
            }
        }

        self.resolved = merged;
        self.validated = true;
        Ok(())
    }

    fn merge_fields(&self, ty: &EntityType) -> SchemaResult<Vec<(String, FieldDescriptor)>> {
        let mut fields = ty.declared_fields().to_vec();
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(ty.name().normalized());

        let mut parent = ty.parent();
        while let Some(parent_name) = parent {
            if !seen.insert(parent_name.normalized()) {
                return Err(SchemaError::InheritanceCycle(
                    parent_name.normalized().to_string(),
                ));
            }
            let parent_ty = self.types.get(parent_name.normalized()).ok_or_else(|| {
                SchemaError::UnknownParent {
                    type_name: ty.name().normalized().to_string(),
                    parent: parent_name.normalized().to_string(),
                }
            })?;
            for (name, descriptor) in parent_ty.declared_fields() {
                if !fields.iter().any(|(existing, _)| existing == name) {
                    fields.push((name.clone(), descriptor.clone()));
                }
            }
            parent = parent_ty.parent();
        }

        Ok(fields)
    }
}

/// The synthesized list-view type name for a keyed type (`Team` → `TeamList`).
#[must_use]
pub fn list_type_name(item: &EntityName) -> EntityName {
    EntityName::new(format!("{}List", item.declared()))
}

/// The single paginated field on a synthesized list view (`team_list`).
#[must_use]
pub fn list_field_name(item: &EntityName) -> String {
    format!("{}_list", item.normalized())
}
