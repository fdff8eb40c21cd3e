use courtside_cache::{Cache, CacheConfig, CacheError};
use courtside_schema::{EntityType, Registry};
use courtside_transport::mock::MockTransport;
use courtside_transport::{Transport, TransportError};
use serde_json::{Value, json};
use std::sync::Arc;

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
        .register(
            EntityType::keyed("Player")
                .string("name")
                .relation("role", "Role"),
        )
        .unwrap();
    registry
        .register(EntityType::keyed("Role").string("name"))
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

// ── Applying responses ───────────────────────────────────────────

#[tokio::test]
async fn load_populates_scalars_relations_and_pages() {
    let (cache, transport) = engine();
    transport.respond(
        "team",
        json!({
            "name": "Court Kings",
            "captain_id": 3,
            "members": {
                "items": [{"id": 3, "name": "Ana", "role_id": 5}],
                "count": 1
            }
        }),
    );
    transport.respond("player", json!({"name": "Ana", "role_id": 5}));
    transport.respond("role", json!({"name": "Captain"}));

    let team = cache.get_or_create_deferred("Team", 7).unwrap();
    team.load().await.unwrap();

    assert!(team.is_ready());
    assert_eq!(team.get_str("name").as_deref(), Some("Court Kings"));

    let captain = team.relation("captain").unwrap();
    assert_eq!(captain.identity().as_key(), Some(3));

    let members = team.page("members").unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members.count(), Some(1));
    // The inline member and the captain foreign key resolve to the same
    // live instance.
    assert!(Arc::ptr_eq(&members.items()[0], &captain));
    assert_eq!(members.items()[0].get_str("name").as_deref(), Some("Ana"));
}

#[tokio::test]
async fn inline_page_items_need_no_extra_round_trip() {
    let (cache, transport) = engine();
    transport.respond(
        "team",
        json!({
            "members": {
                "items": [{"id": 3, "name": "Ana", "role_id": 5}],
                "count": 1
            }
        }),
    );
    transport.respond("role", json!({"name": "Captain"}));

    let team = cache.get_or_create_deferred("Team", 7).unwrap();
    team.load().await.unwrap();

    let member = &team.page("members").unwrap().items()[0];
    assert!(member.is_ready());
    assert_eq!(member.get_str("name").as_deref(), Some("Ana"));
    assert_eq!(transport.request_count("player"), 0);
}

#[tokio::test]
async fn bare_id_page_items_resolve_through_the_map() {
    let (cache, transport) = engine();
    transport.respond(
        "team",
        json!({"members": {"items": [3, 4], "count": 2}}),
    );
    transport.respond("player", json!({"name": "someone"}));
    transport.respond("role", json!({}));

    let team = cache.get_or_create_deferred("Team", 7).unwrap();
    team.load().await.unwrap();

    let members = team.page("members").unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members.items()[0].identity().as_key(), Some(3));
    assert_eq!(members.items()[1].identity().as_key(), Some(4));
    assert!(Arc::ptr_eq(
        &members.items()[0],
        &cache.get("Player", 3).unwrap()
    ));
}

#[tokio::test]
async fn numeric_string_foreign_keys_are_accepted() {
    let (cache, transport) = engine();
    transport.respond("team", json!({"captain_id": "3"}));
    transport.respond("player", json!({}));
    transport.respond("role", json!({}));

    let team = cache.get_or_create_deferred("Team", 7).unwrap();
    team.load().await.unwrap();

    let captain = team.relation("captain").unwrap();
    assert_eq!(captain.identity().as_key(), Some(3));
}

#[tokio::test]
async fn absent_fields_become_null_but_pages_survive() {
    let (cache, transport) = engine();
    transport.respond("team", json!({}));

    let team = cache.get_or_create_deferred("Team", 7).unwrap();
    let page_before = team.page("members").unwrap();
    team.load().await.unwrap();

    assert!(team.get_str("name").is_none());
    assert!(team.field_value("name").is_some_and(|v| v.is_null()));
    assert!(team.relation("captain").is_none());

    // The page container is reference-stable across a payload that omits it.
    let page_after = team.page("members").unwrap();
    assert!(Arc::ptr_eq(&page_before, &page_after));
}

#[tokio::test]
async fn last_applied_response_wins() {
    let (cache, transport) = engine();
    transport.respond("team", json!({"name": "Old"}));

    let team = cache.get_or_create_deferred("Team", 7).unwrap();
    team.load().await.unwrap();
    assert_eq!(team.get_str("name").as_deref(), Some("Old"));

    transport.respond("team", json!({"name": "New"}));
    team.load().await.unwrap();
    assert_eq!(team.get_str("name").as_deref(), Some("New"));
}

// ── Failures ─────────────────────────────────────────────────────

#[tokio::test]
async fn missing_payload_is_an_error() {
    let (cache, _transport) = engine();
    let team = cache.get_or_create_deferred("Team", 7).unwrap();

    let err = team.load().await.unwrap_err();
    assert!(matches!(err, CacheError::MissingData(root) if root == "team"));
    assert!(!team.is_ready());
}

#[tokio::test]
async fn explicit_null_payload_is_an_error() {
    let (cache, transport) = engine();
    transport.respond("team", Value::Null);

    let team = cache.get_or_create_deferred("Team", 7).unwrap();
    let err = team.load().await.unwrap_err();
    assert!(matches!(err, CacheError::MissingData(_)));
}

#[tokio::test]
async fn transport_failures_propagate_without_clobbering_state() {
    let (cache, transport) = engine();
    transport.respond("team", json!({"name": "Alpha"}));

    let team = cache.get_or_create_deferred("Team", 7).unwrap();
    team.load().await.unwrap();

    transport.fail_next(TransportError::Network("connection reset".to_string()));
    let err = team.load().await.unwrap_err();
    assert!(matches!(
        err,
        CacheError::Transport(TransportError::Network(_))
    ));
    // The previously applied data survives the failed reload.
    assert_eq!(team.get_str("name").as_deref(), Some("Alpha"));
}
