use super::{Admission, Relay};
use crate::broker::TopicName;
use crate::client::{Outbox, Role};
use crate::utils::RelayError;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;

const TOKEN: &str = "random-generated-token-12345";

fn connect(relay: &mut Relay, name: Option<&str>) -> (Admission, mpsc::UnboundedReceiver<WsMessage>) {
    let (tx, rx) = mpsc::unbounded_channel::<WsMessage>();
    let admission = relay.open(name, Outbox::new(tx)).unwrap();
    (admission, rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<WsMessage>) -> Vec<Value> {
    let mut frames = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        match msg {
            WsMessage::Text(text) => frames.push(serde_json::from_str(&text).unwrap()),
            other => panic!("Expected a text message, got {other:?}"),
        }
    }
    frames
}

#[test]
fn test_user_admission_welcomes_and_subscribes() {
    let mut relay = Relay::new(TOKEN);
    let (alice, mut rx) = connect(&mut relay, Some("Alice"));

    assert_eq!(alice.role, Role::User);
    assert_eq!(relay.subscriptions(&alice.id), vec![TopicName::Users]);
    assert_eq!(
        drain(&mut rx),
        vec![json!({
            "type": "connection",
            "message": "Connected to WebSocket server",
            "clientId": alice.id,
            "clientName": "Alice"
        })]
    );
}

#[test]
fn test_admin_admission_subscribes_to_admin_only() {
    let mut relay = Relay::new(TOKEN);
    let (admin, mut rx) = connect(&mut relay, Some(TOKEN));

    assert_eq!(admin.role, Role::Admin);
    assert_eq!(admin.id, TOKEN);
    assert_eq!(relay.subscriptions(&admin.id), vec![TopicName::Admin]);

    let frames = drain(&mut rx);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["type"], "connection");
    assert_eq!(
        frames[1],
        json!({"type": "count_users_online", "data": {"count": 0, "users": []}})
    );
}

#[test]
fn test_admin_snapshot_lists_exactly_the_open_users() {
    let mut relay = Relay::new(TOKEN);
    let (alice, _rx_a) = connect(&mut relay, Some("Alice"));
    let (bob, _rx_b) = connect(&mut relay, Some("Bob"));
    let (carol, _rx_c) = connect(&mut relay, Some("Carol"));
    relay.close(&carol.id);

    let (_admin, mut rx_admin) = connect(&mut relay, Some(TOKEN));
    let frames = drain(&mut rx_admin);
    let snapshot = &frames[1];
    assert_eq!(snapshot["type"], "count_users_online");
    assert_eq!(snapshot["data"]["count"], 2);

    let users = snapshot["data"]["users"].as_array().unwrap();
    let mut seen: Vec<(String, String)> = users
        .iter()
        .map(|u| {
            assert!(u["connectedAt"].is_string());
            (
                u["clientId"].as_str().unwrap().to_string(),
                u["clientName"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    seen.sort_by(|a, b| a.1.cmp(&b.1));
    assert_eq!(
        seen,
        vec![(alice.id, "Alice".to_string()), (bob.id, "Bob".to_string())]
    );
}

#[test]
fn test_admin_is_notified_of_user_lifecycle() {
    let mut relay = Relay::new(TOKEN);
    let (_admin, mut rx_admin) = connect(&mut relay, Some(TOKEN));
    drain(&mut rx_admin);

    let (alice, mut rx_alice) = connect(&mut relay, Some("Alice"));
    let frames = drain(&mut rx_admin);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["type"], "user_connected");
    assert_eq!(frames[0]["clientId"], alice.id.as_str());
    assert_eq!(frames[0]["clientName"], "Alice");

    // users never see lifecycle events
    assert_eq!(drain(&mut rx_alice).len(), 1);

    assert!(relay.close(&alice.id));
    let frames = drain(&mut rx_admin);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["type"], "user_disconnected");
    assert_eq!(frames[0]["clientId"], alice.id.as_str());
    assert_eq!(frames[0]["clientName"], "Alice");
}

#[test]
fn test_close_is_idempotent() {
    let mut relay = Relay::new(TOKEN);
    let (_admin, mut rx_admin) = connect(&mut relay, Some(TOKEN));
    let (alice, _rx) = connect(&mut relay, Some("Alice"));
    drain(&mut rx_admin);

    assert!(relay.close(&alice.id));
    assert!(!relay.close(&alice.id));
    assert!(!relay.is_open(&alice.id));
    assert!(relay.subscriptions(&alice.id).is_empty());
    assert_eq!(drain(&mut rx_admin).len(), 1);
}

#[test]
fn test_admin_connect_is_silent_but_admin_disconnect_is_published() {
    let mut relay = Relay::new(TOKEN);
    let (alice, mut rx_alice) = connect(&mut relay, Some("Alice"));
    let (admin, _rx_admin) = connect(&mut relay, Some(TOKEN));
    drain(&mut rx_alice);

    assert!(relay.close(&admin.id));
    // published to the admin topic, which has no subscribers left
    assert!(drain(&mut rx_alice).is_empty());
    assert!(relay.is_open(&alice.id));
}

#[test]
fn test_second_admin_is_rejected() {
    let mut relay = Relay::new(TOKEN);
    let (_admin, _rx) = connect(&mut relay, Some(TOKEN));

    let (tx, _rx2) = mpsc::unbounded_channel::<WsMessage>();
    let err = relay.open(Some(TOKEN), Outbox::new(tx)).unwrap_err();
    assert!(matches!(err, RelayError::DuplicateId(_)));
    assert_eq!(relay.registry().len(), 1);
}

#[test]
fn test_ping_is_answered_only_to_sender() {
    let mut relay = Relay::new(TOKEN);
    let (alice, mut rx_alice) = connect(&mut relay, Some("Alice"));
    let (_bob, mut rx_bob) = connect(&mut relay, Some("Bob"));
    let (_admin, mut rx_admin) = connect(&mut relay, Some(TOKEN));
    drain(&mut rx_alice);
    drain(&mut rx_bob);
    drain(&mut rx_admin);

    relay.handle_text(&alice.id, r#"{"type":"ping"}"#);

    assert_eq!(drain(&mut rx_alice), vec![json!({"type": "pong"})]);
    assert!(drain(&mut rx_bob).is_empty());
    assert!(drain(&mut rx_admin).is_empty());
}

#[test]
fn test_pick_number_reaches_other_users_verbatim() {
    let mut relay = Relay::new(TOKEN);
    let (alice, mut rx_alice) = connect(&mut relay, Some("Alice"));
    let (_bob, mut rx_bob) = connect(&mut relay, Some("Bob"));
    let (_carol, mut rx_carol) = connect(&mut relay, Some("Carol"));
    let (_admin, mut rx_admin) = connect(&mut relay, Some(TOKEN));
    for rx in [&mut rx_alice, &mut rx_bob, &mut rx_carol, &mut rx_admin] {
        drain(rx);
    }

    let payload = json!({"number": 7, "meta": [1, "two", null, {"deep": true}]});
    relay.handle_text(
        &alice.id,
        &json!({"type": "pick_number", "data": payload}).to_string(),
    );

    let expected = vec![json!({"type": "pick_number", "data": payload})];
    assert_eq!(drain(&mut rx_bob), expected);
    assert_eq!(drain(&mut rx_carol), expected);
    assert!(drain(&mut rx_alice).is_empty());
    assert!(drain(&mut rx_admin).is_empty());
}

#[test]
fn test_reset_reaches_all_users_but_not_admin() {
    let mut relay = Relay::new(TOKEN);
    let (alice, mut rx_alice) = connect(&mut relay, Some("Alice"));
    let (_bob, mut rx_bob) = connect(&mut relay, Some("Bob"));
    let (admin, mut rx_admin) = connect(&mut relay, Some(TOKEN));
    for rx in [&mut rx_alice, &mut rx_bob, &mut rx_admin] {
        drain(rx);
    }

    relay.handle_text(&admin.id, r#"{"type":"reset","data":{"ignored":true}}"#);
    assert_eq!(drain(&mut rx_alice), vec![json!({"type": "reset"})]);
    assert_eq!(drain(&mut rx_bob), vec![json!({"type": "reset"})]);
    assert!(drain(&mut rx_admin).is_empty());

    relay.handle_text(&alice.id, r#"{"type":"reset"}"#);
    assert_eq!(drain(&mut rx_alice), vec![json!({"type": "reset"})]);
    assert_eq!(drain(&mut rx_bob), vec![json!({"type": "reset"})]);
}

#[test]
fn test_malformed_frames_get_one_error_and_keep_connection_open() {
    let mut relay = Relay::new(TOKEN);
    let (alice, mut rx_alice) = connect(&mut relay, Some("Alice"));
    let (_bob, mut rx_bob) = connect(&mut relay, Some("Bob"));
    drain(&mut rx_alice);
    drain(&mut rx_bob);

    for frame in ["not json", "{", r#"{"data":1}"#, r#"{"type":42}"#, "null"] {
        relay.handle_text(&alice.id, frame);
        assert_eq!(
            drain(&mut rx_alice),
            vec![json!({"type": "error", "message": "Invalid message format"})],
            "{frame}"
        );
        assert!(relay.is_open(&alice.id));
    }
    relay.handle_bytes(&alice.id, &[0xff, 0x00]);
    assert_eq!(drain(&mut rx_alice).len(), 1);

    assert!(drain(&mut rx_bob).is_empty());
    assert_eq!(relay.subscriptions(&alice.id), vec![TopicName::Users]);
}

#[test]
fn test_unknown_type_is_ignored() {
    let mut relay = Relay::new(TOKEN);
    let (alice, mut rx_alice) = connect(&mut relay, Some("Alice"));
    let (_bob, mut rx_bob) = connect(&mut relay, Some("Bob"));
    drain(&mut rx_alice);
    drain(&mut rx_bob);

    relay.handle_text(&alice.id, r#"{"type":"dance","data":1}"#);

    assert!(drain(&mut rx_alice).is_empty());
    assert!(drain(&mut rx_bob).is_empty());
    assert!(relay.is_open(&alice.id));
}

#[test]
fn test_frames_after_close_are_dropped() {
    let mut relay = Relay::new(TOKEN);
    let (alice, _rx_alice) = connect(&mut relay, Some("Alice"));
    let (_bob, mut rx_bob) = connect(&mut relay, Some("Bob"));
    drain(&mut rx_bob);

    relay.close(&alice.id);
    relay.handle_text(&alice.id, r#"{"type":"reset"}"#);
    assert!(drain(&mut rx_bob).is_empty());
}

#[test]
fn test_fanout_survives_a_vanished_subscriber() {
    let mut relay = Relay::new(TOKEN);
    let (alice, mut rx_alice) = connect(&mut relay, Some("Alice"));
    let (_bob, rx_bob) = connect(&mut relay, Some("Bob"));
    let (_carol, mut rx_carol) = connect(&mut relay, Some("Carol"));
    drain(&mut rx_alice);
    drain(&mut rx_carol);
    drop(rx_bob);

    relay.handle_text(&alice.id, r#"{"type":"pick_number","data":3}"#);
    assert_eq!(
        drain(&mut rx_carol),
        vec![json!({"type": "pick_number", "data": 3})]
    );
}

#[test]
fn test_every_open_connection_has_exactly_its_role_topic() {
    let mut relay = Relay::new(TOKEN);
    let mut receivers = Vec::new();
    for name in [Some("Alice"), None, Some(""), Some(TOKEN), Some("Bob")] {
        receivers.push(connect(&mut relay, name));
    }

    for (admission, _) in &receivers {
        assert_eq!(relay.subscriptions(&admission.id), vec![admission.role.topic()]);
    }
    assert_eq!(relay.snapshot().count, 4);
}
