use courtside_cache::{Cache, CacheConfig, CacheError};
use courtside_schema::{EntityType, Registry, SchemaError};
use courtside_transport::Transport;
use courtside_transport::mock::MockTransport;
use courtside_types::Identity;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn registry() -> Arc<Registry> {
    let mut registry = Registry::new();
    registry
        .register(
            EntityType::keyed("Team")
                .string("name")
                .relation("captain", "Player")
                .relation_list("members", "Player"),
        )
        .unwrap();
    registry
        .register(EntityType::keyed("Player").string("name"))
        .unwrap();
    registry
        .register(
            EntityType::view("TeamMembership", ["player_id", "team_id"])
                .number("player_id")
                .number("team_id")
                .string("status"),
        )
        .unwrap();
    registry.validate().unwrap();
    Arc::new(registry)
}

fn engine() -> (Arc<Cache>, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::new());
    let cache = Cache::new(
        registry(),
        Arc::clone(&transport) as Arc<dyn Transport>,
        CacheConfig::default(),
    )
    .unwrap();
    (cache, transport)
}

fn membership_identity() -> Identity {
    Identity::view([("player_id", 3), ("team_id", 7)])
}

// ── Keyed instances ──────────────────────────────────────────────

#[tokio::test]
async fn same_id_yields_the_same_instance() {
    let (cache, _transport) = engine();
    let a = cache.get_or_create_deferred("Team", 7).unwrap();
    let b = cache.get_or_create_deferred("Team", 7).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn hits_trigger_no_load() {
    let (cache, transport) = engine();
    let a = cache.get_or_create_deferred("Team", 7).unwrap();
    // Non-deferred lookup of an existing instance must not re-fetch.
    let b = cache.get_or_create("Team", 7).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(transport.sent_requests().is_empty());
}

#[tokio::test]
async fn type_names_are_case_insensitive() {
    let (cache, _transport) = engine();
    let a = cache.get_or_create_deferred("Team", 7).unwrap();
    let b = cache.get_or_create_deferred("team", 7).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[tokio::test]
async fn distinct_ids_get_distinct_instances() {
    let (cache, _transport) = engine();
    let a = cache.get_or_create_deferred("Team", 7).unwrap();
    let b = cache.get_or_create_deferred("Team", 8).unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn get_never_constructs() {
    let (cache, _transport) = engine();
    assert!(cache.get("Team", 1).is_none());
    assert!(cache.is_empty());
}

#[tokio::test]
async fn miss_dispatches_a_background_load() {
    let (cache, transport) = engine();
    transport.respond("team", json!({"name": "Alpha"}));

    let team = cache.get_or_create("Team", 7).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(team.is_ready());
    assert_eq!(team.get_str("name").as_deref(), Some("Alpha"));
    assert_eq!(transport.request_count("team"), 1);
}

// ── Views ────────────────────────────────────────────────────────

#[tokio::test]
async fn views_are_never_deduplicated() {
    let (cache, _transport) = engine();
    let a = cache
        .create_view_deferred("TeamMembership", membership_identity())
        .unwrap();
    let b = cache
        .create_view_deferred("TeamMembership", membership_identity())
        .unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn views_require_their_composite_keys() {
    let (cache, _transport) = engine();
    let err = cache
        .create_view_deferred("TeamMembership", Identity::view([("player_id", 3)]))
        .unwrap_err();
    assert!(matches!(err, CacheError::IdentityMismatch { .. }));
}

#[tokio::test]
async fn views_reject_scalar_identities() {
    let (cache, _transport) = engine();
    let err = cache
        .create_view_deferred("TeamMembership", Identity::Key(3))
        .unwrap_err();
    assert!(matches!(err, CacheError::IdentityMismatch { .. }));
}

#[tokio::test]
async fn keyed_factory_rejects_view_types() {
    let (cache, _transport) = engine();
    let err = cache.get_or_create_deferred("TeamMembership", 1).unwrap_err();
    assert!(matches!(err, CacheError::IdentityMismatch { .. }));
}

#[tokio::test]
async fn unknown_types_surface_schema_errors() {
    let (cache, _transport) = engine();
    let err = cache.get_or_create_deferred("Ghost", 1).unwrap_err();
    assert!(matches!(
        err,
        CacheError::Schema(SchemaError::UnknownType(name)) if name == "ghost"
    ));
}

// ── Retention ────────────────────────────────────────────────────

#[tokio::test]
async fn evicted_instances_detach() {
    let (cache, _transport) = engine();
    let team = cache.get_or_create_deferred("Team", 7).unwrap();

    let removed = cache.evict("Team", 7).unwrap();
    assert!(Arc::ptr_eq(&removed, &team));
    assert!(cache.get("Team", 7).is_none());

    let err = team.load().await.unwrap_err();
    assert!(matches!(err, CacheError::Detached(_)));
}

#[tokio::test]
async fn clear_empties_the_map() {
    let (cache, _transport) = engine();
    cache.get_or_create_deferred("Team", 1).unwrap();
    cache.get_or_create_deferred("Player", 2).unwrap();
    cache.clear();
    assert!(cache.is_empty());
}

#[tokio::test]
async fn rebuilding_after_eviction_yields_a_new_instance() {
    let (cache, _transport) = engine();
    let old = cache.get_or_create_deferred("Team", 7).unwrap();
    cache.evict("Team", 7);
    let new = cache.get_or_create_deferred("Team", 7).unwrap();
    assert!(!Arc::ptr_eq(&old, &new));
}
