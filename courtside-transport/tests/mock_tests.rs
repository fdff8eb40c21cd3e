use courtside_transport::mock::{MockEventChannel, MockTransport, query_root};
use courtside_transport::{EventChannel, Transport, TransportError};
use courtside_types::PushEvent;
use pretty_assertions::assert_eq;
use serde_json::json;

// ── query_root ───────────────────────────────────────────────────

#[test]
fn query_root_stops_at_arguments() {
    assert_eq!(query_root("team(id: 7){name}"), "team");
}

#[test]
fn query_root_stops_at_selection() {
    assert_eq!(query_root("playerList{player_list{items count}}"), "playerList");
}

#[test]
fn query_root_of_bare_name() {
    assert_eq!(query_root("team"), "team");
}

// ── MockTransport ────────────────────────────────────────────────

#[tokio::test]
async fn canned_payload_is_wrapped_under_its_root() {
    let transport = MockTransport::new();
    transport.respond("team", json!({"name": "Alpha"}));

    let response = transport.send("team(id: 7){name}").await.unwrap();
    assert_eq!(response, json!({"team": {"name": "Alpha"}}));
}

#[tokio::test]
async fn unknown_root_yields_empty_response() {
    let transport = MockTransport::new();
    let response = transport.send("ghost(id: 1){name}").await.unwrap();
    assert_eq!(response, json!({}));
}

#[tokio::test]
async fn queued_failure_fires_once() {
    let transport = MockTransport::new();
    transport.respond("team", json!({}));
    transport.fail_next(TransportError::Timeout);

    assert!(matches!(
        transport.send("team{name}").await,
        Err(TransportError::Timeout)
    ));
    assert!(transport.send("team{name}").await.is_ok());
}

#[tokio::test]
async fn sent_requests_are_logged_in_order() {
    let transport = MockTransport::new();
    transport.send("team(id: 1){name}").await.unwrap();
    transport.send("player(id: 2){name}").await.unwrap();
    transport.send("team(id: 1){name}").await.unwrap();

    assert_eq!(
        transport.sent_requests(),
        vec![
            "team(id: 1){name}".to_string(),
            "player(id: 2){name}".to_string(),
            "team(id: 1){name}".to_string(),
        ]
    );
    assert_eq!(transport.request_count("team"), 2);
    assert_eq!(transport.request_count("player"), 1);
    assert_eq!(transport.request_count("ghost"), 0);
}

// ── MockEventChannel ─────────────────────────────────────────────

#[tokio::test]
async fn channel_delivers_events_in_order() {
    let (mut channel, sender) = MockEventChannel::pair();
    let first = PushEvent::EntityUpdated {
        type_name: "Team".to_string(),
        id: 7,
    };
    let second = PushEvent::EntityCreated {
        type_name: "Player".to_string(),
        id: 3,
    };
    sender.send(first.clone()).unwrap();
    sender.send(second.clone()).unwrap();

    assert_eq!(channel.recv().await, Some(first));
    assert_eq!(channel.recv().await, Some(second));
}

#[tokio::test]
async fn dropped_sender_closes_the_channel() {
    let (mut channel, sender) = MockEventChannel::pair();
    drop(sender);
    assert_eq!(channel.recv().await, None);
}
