//! The query builder: live entity state → request string.
//!
//! Rendering is a pure function of the entity's current field values and
//! arguments — calling it twice with no intervening mutation produces
//! byte-identical strings. Recursion is bounded to one relation hop:
//! to-one relations render as foreign-key ids and only explicitly-rendered
//! nested values (pages) inline their own sub-request, carrying their own
//! current arguments.

use crate::CacheResult;
use crate::entity::{Entity, FieldValue};
use crate::page::Page;
use courtside_schema::Registry;
use courtside_types::Identity;
use serde_json::Value;
use std::collections::BTreeMap;

/// Renders an entity's full request: `root(args){ field1 field2 ... }`.
pub(crate) fn render_entity(
    registry: &Registry,
    entity: &Entity,
    alias: Option<&str>,
) -> CacheResult<String> {
    let ty = registry.resolve(entity.name())?;

    let mut args: Vec<String> = Vec::new();
    match entity.identity() {
        Identity::View(map) => {
            for (key, value) in map {
                args.push(render_arg(key, value)?);
            }
        }
        Identity::Key(id) => {
            if !ty.is_page() {
                args.push(format!("id: {id}"));
            }
        }
    }
    append_args(&mut args, &entity.args())?;

    let mut parts: Vec<String> = Vec::new();
    for (field_name, descriptor) in registry.fields_of(entity.name())? {
        // Recurse into live pages so their current arguments travel with
        // the parent's request; everything else renders from the
        // type-level descriptor alone.
        match entity.field_value(field_name) {
            Some(FieldValue::Page(page)) => {
                parts.push(render_page(registry, &page, field_name)?);
            }
            _ => parts.push(descriptor.render(field_name, registry)?),
        }
    }

    let root = alias.map_or_else(|| entity.query_root(), str::to_string);
    Ok(assemble(&root, &args, &parts))
}

/// Renders a page's sub-request under the given alias.
pub(crate) fn render_page(registry: &Registry, page: &Page, alias: &str) -> CacheResult<String> {
    let mut args: Vec<String> = Vec::new();
    append_args(&mut args, &page.args())?;

    let mut parts: Vec<String> = Vec::new();
    for (field_name, descriptor) in registry.fields_of(page.type_name())? {
        parts.push(descriptor.render(field_name, registry)?);
    }

    Ok(assemble(alias, &args, &parts))
}

fn append_args(args: &mut Vec<String>, extra: &BTreeMap<String, Value>) -> CacheResult<()> {
    for (key, value) in extra {
        args.push(render_arg(key, value)?);
    }
    Ok(())
}

fn render_arg(key: &str, value: &Value) -> CacheResult<String> {
    Ok(format!("{key}: {}", serde_json::to_string(value)?))
}

fn assemble(root: &str, args: &[String], parts: &[String]) -> String {
    let rendered_args = if args.is_empty() {
        String::new()
    } else {
        format!("({})", args.join(" "))
    };
    format!("{root}{rendered_args}{{{}}}", parts.join(" "))
}
