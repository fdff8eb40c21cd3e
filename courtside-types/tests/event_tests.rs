use courtside_types::PushEvent;
use serde_json::json;

#[test]
fn update_event_wire_format() {
    let event = PushEvent::EntityUpdated {
        type_name: "Team".to_string(),
        id: 7,
    };
    assert_eq!(
        serde_json::to_value(&event).unwrap(),
        json!({
            "event": "EntityUpdated",
            "payload": {"type_name": "Team", "id": 7}
        })
    );
}

#[test]
fn created_event_wire_format() {
    let event = PushEvent::EntityCreated {
        type_name: "Match".to_string(),
        id: 12,
    };
    assert_eq!(
        serde_json::to_value(&event).unwrap(),
        json!({
            "event": "EntityCreated",
            "payload": {"type_name": "Match", "id": 12}
        })
    );
}

#[test]
fn events_round_trip() {
    let event = PushEvent::EntityUpdated {
        type_name: "Player".to_string(),
        id: 3,
    };
    let encoded = serde_json::to_string(&event).unwrap();
    let decoded: PushEvent = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, event);
}

#[test]
fn accessors_expose_target() {
    let event = PushEvent::EntityCreated {
        type_name: "Team".to_string(),
        id: 9,
    };
    assert_eq!(event.type_name(), "Team");
    assert_eq!(event.id(), 9);
}

#[test]
fn unknown_event_tag_fails_to_parse() {
    let raw = json!({"event": "EntityVaporized", "payload": {"type_name": "Team", "id": 1}});
    assert!(serde_json::from_value::<PushEvent>(raw).is_err());
}
