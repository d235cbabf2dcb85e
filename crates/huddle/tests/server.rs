//! Integration tests for the Huddle server, handler, and full connection
//! flow over real WebSocket clients.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use huddle::prelude::*;
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns its address and
/// coordinator.
async fn start_server_with(builder: HuddleServerBuilder) -> (String, Arc<SessionCoordinator>) {
    let server = builder
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let coordinator = server.coordinator();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    (addr, coordinator)
}

async fn start_server() -> (String, Arc<SessionCoordinator>) {
    start_server_with(HuddleServerBuilder::new()).await
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

/// Connects and consumes the `sessionStarted` event, returning the issued
/// participant id.
async fn connect_session(addr: &str) -> (ClientWs, String) {
    let mut ws = connect(addr).await;
    let started = recv_json(&mut ws).await;
    assert_eq!(started["type"], "sessionStarted");
    let id = started["participantId"]
        .as_str()
        .expect("participantId should be a string")
        .to_owned();
    (ws, id)
}

async fn send_json(ws: &mut ClientWs, value: Value) {
    ws.send(Message::text(value.to_string()))
        .await
        .expect("send");
}

/// Receives the next text frame as JSON, skipping control frames.
async fn recv_json(ws: &mut ClientWs) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .expect("recv");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("event should be JSON");
        }
    }
}

async fn recv_n(ws: &mut ClientWs, n: usize) -> Vec<Value> {
    let mut events = Vec::with_capacity(n);
    for _ in 0..n {
        events.push(recv_json(ws).await);
    }
    events
}

/// Asserts nothing else arrives within a short window.
async fn assert_quiet(ws: &mut ClientWs) {
    let next = tokio::time::timeout(Duration::from_millis(100), ws.next()).await;
    assert!(next.is_err(), "unexpected frame: {next:?}");
}

fn find<'a>(events: &'a [Value], kind: &str) -> &'a Value {
    events
        .iter()
        .find(|e| e["type"] == kind)
        .unwrap_or_else(|| panic!("no {kind} event in {events:#?}"))
}

async fn join(ws: &mut ClientWs, room: &str, name: &str, role: &str) {
    send_json(
        ws,
        json!({"type": "joinRoom", "roomId": room, "name": name, "role": role}),
    )
    .await;
}

// =========================================================================
// Session start
// =========================================================================

#[tokio::test]
async fn test_session_started_is_first_event() {
    let (addr, _) = start_server().await;
    let (_ws, id) = connect_session(&addr).await;

    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn test_each_connection_gets_its_own_id() {
    let (addr, _) = start_server().await;
    let (_ws1, id1) = connect_session(&addr).await;
    let (_ws2, id2) = connect_session(&addr).await;
    assert_ne!(id1, id2);
}

// =========================================================================
// Room flow
// =========================================================================

#[tokio::test]
async fn test_join_receives_presence_view_and_info() {
    let (addr, _) = start_server().await;
    let (mut ws, id) = connect_session(&addr).await;

    join(&mut ws, "r-1", "Ann", "PLAYER").await;
    let events = recv_n(&mut ws, 3).await;

    let joined = find(&events, "participantJoinedRoom");
    assert_eq!(joined["roomId"], "r-1");
    assert_eq!(joined["participantId"], id.as_str());
    assert_eq!(joined["name"], "Ann");
    assert_eq!(joined["role"], "PLAYER");

    let view = find(&events, "roomSelectionChanged");
    assert_eq!(view["visible"], false);
    assert_eq!(view["selections"], json!({ id.clone(): null }));

    let info = find(&events, "roomInfoChanged");
    assert_eq!(info["name"], Value::Null);
    assert_eq!(info["options"]["½"], 0.5);
    assert_eq!(info["options"]["☕"], Value::Null);
    assert_eq!(info["options"].as_object().unwrap().len(), 11);
}

#[tokio::test]
async fn test_join_without_room_id_opens_fresh_room() {
    let (addr, _) = start_server().await;
    let (mut ws, _) = connect_session(&addr).await;

    send_json(&mut ws, json!({"type": "joinRoom", "name": "Ann"})).await;
    let events = recv_n(&mut ws, 3).await;

    let joined = find(&events, "participantJoinedRoom");
    assert_eq!(joined["roomId"].as_str().unwrap().len(), 32);
    assert_eq!(joined["role"], "PLAYER");
}

#[tokio::test]
async fn test_selection_is_redacted_until_reveal() {
    let (addr, _) = start_server().await;
    let (mut ann, ann_id) = connect_session(&addr).await;
    let (mut bob, bob_id) = connect_session(&addr).await;

    join(&mut ann, "r-1", "Ann", "PLAYER").await;
    recv_n(&mut ann, 3).await;
    join(&mut bob, "r-1", "Bob", "PLAYER").await;
    recv_n(&mut ann, 2).await;
    recv_n(&mut bob, 4).await;

    send_json(
        &mut ann,
        json!({"type": "updateSelection", "roomId": "r-1", "selection": "5"}),
    )
    .await;
    let own = recv_json(&mut ann).await;
    let other = recv_json(&mut bob).await;
    assert_eq!(
        own["selections"],
        json!({ ann_id.clone(): "5", bob_id.clone(): null })
    );
    assert_eq!(
        other["selections"],
        json!({ ann_id.clone(): "", bob_id.clone(): null })
    );

    // `visible` defaults to true.
    send_json(&mut bob, json!({"type": "revealRoom", "roomId": "r-1"})).await;
    let revealed = recv_json(&mut bob).await;
    assert_eq!(revealed["visible"], true);
    assert_eq!(
        revealed["selections"],
        json!({ ann_id.clone(): "5", bob_id.clone(): null })
    );
    recv_json(&mut ann).await;

    send_json(&mut ann, json!({"type": "resetRoom", "roomId": "r-1"})).await;
    let reset = recv_json(&mut bob).await;
    assert_eq!(reset["visible"], false);
    assert_eq!(
        reset["selections"],
        json!({ ann_id: null, bob_id: null })
    );
}

#[tokio::test]
async fn test_update_room_info_with_new_deck() {
    let (addr, _) = start_server().await;
    let (mut ws, id) = connect_session(&addr).await;
    join(&mut ws, "r-1", "Ann", "PLAYER").await;
    recv_n(&mut ws, 3).await;

    send_json(
        &mut ws,
        json!({
            "type": "updateRoomInfo",
            "roomId": "r-1",
            "name": "Sprint 7",
            "options": {"S": 1.0, "M": 2.0, "L": 3.0}
        }),
    )
    .await;
    let events = recv_n(&mut ws, 2).await;

    let info = find(&events, "roomInfoChanged");
    assert_eq!(info["name"], "Sprint 7");
    assert_eq!(info["options"], json!({"S": 1.0, "M": 2.0, "L": 3.0}));
    let view = find(&events, "roomSelectionChanged");
    assert_eq!(view["selections"], json!({ id: null }));
}

#[tokio::test]
async fn test_kick_reaches_target() {
    let (addr, _) = start_server().await;
    let (mut ann, ann_id) = connect_session(&addr).await;
    let (mut bob, bob_id) = connect_session(&addr).await;
    join(&mut ann, "r-1", "Ann", "PLAYER").await;
    recv_n(&mut ann, 3).await;
    join(&mut bob, "r-1", "Bob", "PLAYER").await;
    recv_n(&mut ann, 2).await;
    recv_n(&mut bob, 4).await;

    send_json(
        &mut ann,
        json!({"type": "kickParticipant", "roomId": "r-1", "participantId": bob_id}),
    )
    .await;

    let kicked = recv_json(&mut bob).await;
    assert_eq!(kicked["type"], "participantKicked");
    assert_eq!(kicked["participantId"], bob_id.as_str());
    assert_eq!(kicked["initiatorParticipantId"], ann_id.as_str());

    let events = recv_n(&mut ann, 2).await;
    find(&events, "participantKicked");
    assert_eq!(
        find(&events, "roomSelectionChanged")["selections"],
        json!({ ann_id: null })
    );
}

// =========================================================================
// Errors
// =========================================================================

#[tokio::test]
async fn test_malformed_frame_gets_error_and_connection_survives() {
    let (addr, _) = start_server().await;
    let (mut ws, _) = connect_session(&addr).await;

    ws.send(Message::text("not json".to_string()))
        .await
        .expect("send");
    let error = recv_json(&mut ws).await;
    assert_eq!(error["type"], "error");
    assert!(error["message"].as_str().unwrap().starts_with("decode failed"));

    // Unknown request types are malformed too.
    send_json(&mut ws, json!({"type": "updatePlayerInfo", "roomId": "r-1"})).await;
    assert_eq!(recv_json(&mut ws).await["type"], "error");

    join(&mut ws, "r-1", "Ann", "PLAYER").await;
    let events = recv_n(&mut ws, 3).await;
    find(&events, "roomInfoChanged");
}

#[tokio::test]
async fn test_spectator_selection_error_goes_to_sender_only() {
    let (addr, _) = start_server().await;
    let (mut ann, _) = connect_session(&addr).await;
    let (mut eve, _) = connect_session(&addr).await;
    join(&mut ann, "r-1", "Ann", "PLAYER").await;
    recv_n(&mut ann, 3).await;
    join(&mut eve, "r-1", "Eve", "SPECTATOR").await;
    recv_n(&mut ann, 2).await;
    recv_n(&mut eve, 4).await;

    send_json(
        &mut eve,
        json!({"type": "updateSelection", "roomId": "r-1", "selection": "3"}),
    )
    .await;

    let error = recv_json(&mut eve).await;
    assert_eq!(
        error,
        json!({"type": "error", "message": "Only players may change their selection"})
    );
    assert_quiet(&mut ann).await;
}

#[tokio::test]
async fn test_requests_for_missing_room_are_silent() {
    let (addr, _) = start_server().await;
    let (mut ws, _) = connect_session(&addr).await;

    send_json(&mut ws, json!({"type": "resetRoom", "roomId": "ghost"})).await;
    send_json(&mut ws, json!({"type": "leaveRoom", "roomId": "ghost"})).await;
    send_json(
        &mut ws,
        json!({"type": "updateSelection", "roomId": "ghost", "selection": "1"}),
    )
    .await;

    assert_quiet(&mut ws).await;
}

// =========================================================================
// Cleanup
// =========================================================================

#[tokio::test]
async fn test_disconnect_removes_participant_from_rooms() {
    let (addr, coordinator) = start_server().await;
    let (mut ann, ann_id) = connect_session(&addr).await;
    let (mut bob, bob_id) = connect_session(&addr).await;
    join(&mut ann, "r-1", "Ann", "PLAYER").await;
    recv_n(&mut ann, 3).await;
    join(&mut bob, "r-1", "Bob", "PLAYER").await;
    recv_n(&mut ann, 2).await;
    recv_n(&mut bob, 4).await;

    ann.close(None).await.expect("close");
    drop(ann);

    let events = recv_n(&mut bob, 2).await;
    assert_eq!(
        find(&events, "participantLeftRoom")["participantId"],
        ann_id.as_str()
    );
    assert_eq!(
        find(&events, "roomSelectionChanged")["selections"],
        json!({ bob_id: null })
    );

    drop(bob);
    let mut rooms = usize::MAX;
    for _ in 0..50 {
        rooms = coordinator.stats().await.rooms;
        if rooms == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(rooms, 0);
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let (addr, _) = start_server_with(
        HuddleServerBuilder::new().idle_timeout(Some(Duration::from_millis(100))),
    )
    .await;
    let (mut ws, _) = connect_session(&addr).await;

    let result = tokio::time::timeout(Duration::from_secs(2), ws.next()).await;
    match result {
        Ok(Some(Ok(Message::Close(_)))) | Ok(None) | Ok(Some(Err(_))) => {}
        other => panic!("expected close, got {other:?}"),
    }
}
