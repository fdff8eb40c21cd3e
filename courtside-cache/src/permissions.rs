//! Hierarchical permission checks.
//!
//! Permissions are dot-separated paths (`tournament.match.report`). A
//! held permission grants a required one when they match segment by
//! segment, or when the held permission ends in a `*` wildcard covering
//! the remaining segments.

use crate::entity::Entity;
use std::sync::Arc;

/// Whether one held permission string grants the required one.
///
/// Rules, evaluated left to right over the required segments:
/// - a held `*` in its final position grants everything from there on;
/// - any other mismatch denies;
/// - a held permission shorter than the required one (without a trailing
///   `*`) denies;
/// - a held permission longer than the required one denies (holding
///   `a.b.c` does not grant `a.b`).
#[must_use]
pub fn permission_matches(held: &str, required: &str) -> bool {
    let held: Vec<&str> = held.split('.').collect();
    let required: Vec<&str> = required.split('.').collect();

    for (i, segment) in required.iter().enumerate() {
        match held.get(i) {
            Some(&"*") if i == held.len() - 1 => return true,
            Some(h) if h == segment => {}
            _ => return false,
        }
    }
    held.len() == required.len()
}

/// Whether a player's role currently grants `required`.
///
/// Walks `player → role → permissions` over in-memory state only: an
/// unloaded role or permissions page yields `false` now and the caller
/// re-checks after data arrives.
#[must_use]
pub fn has_permission(player: &Arc<Entity>, required: &str) -> bool {
    let Some(role) = player.relation("role") else {
        return false;
    };
    let Some(permissions) = role.page("permissions") else {
        return false;
    };
    permissions.any(|permission| {
        permission
            .get_str("name")
            .is_some_and(|held| permission_matches(&held, required))
    })
}
