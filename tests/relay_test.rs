// Exercises the relay coordinator and broadcaster directly, with
// channel-backed connections standing in for real sockets.

use serde_json::{json, Value};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};
use warp::ws::Message;

use signal_relay::core::connection::Connection;
use signal_relay::core::message::ServerEvent;
use signal_relay::core::server::RelayServer;

// Register a fake peer and keep the receiving half of its channel
async fn connect_peer(relay: &RelayServer) -> (String, UnboundedReceiver<Message>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut connection = Connection::new(tx);
    connection.open();
    let id = connection.id.clone();
    relay.register(connection).await;
    (id, rx)
}

// Pop the next delivered event, or None if nothing was delivered
fn next_event(rx: &mut UnboundedReceiver<Message>) -> Option<Value> {
    match rx.try_recv() {
        Ok(msg) => Some(
            serde_json::from_str(msg.to_str().expect("expected a text frame"))
                .expect("expected valid JSON"),
        ),
        Err(TryRecvError::Empty) => None,
        Err(TryRecvError::Disconnected) => panic!("relay dropped the sender"),
    }
}

fn join_event() -> Value {
    json!({"type": "join", "message": "A user has joined the room."})
}

fn leave_event() -> Value {
    json!({"type": "leave", "message": "A user has left the room"})
}

#[tokio::test]
async fn test_join_announced_to_others_not_joiner() {
    let relay = RelayServer::new();
    let (a, mut a_rx) = connect_peer(&relay).await;
    let (b, mut b_rx) = connect_peer(&relay).await;

    relay.join_room(&a, "r1").await;
    // First join targets an empty room, so nobody hears about it
    assert_eq!(next_event(&mut a_rx), None);

    relay.join_room(&b, "r1").await;
    assert_eq!(next_event(&mut a_rx), Some(join_event()));
    assert_eq!(next_event(&mut b_rx), None);
}

#[tokio::test]
async fn test_duplicate_join_not_reannounced() {
    let relay = RelayServer::new();
    let (a, mut a_rx) = connect_peer(&relay).await;
    let (b, _b_rx) = connect_peer(&relay).await;

    relay.join_room(&a, "r1").await;
    relay.join_room(&b, "r1").await;
    assert_eq!(next_event(&mut a_rx), Some(join_event()));

    relay.join_room(&b, "r1").await;
    assert_eq!(next_event(&mut a_rx), None);
    assert_eq!(relay.room_members("r1").await.len(), 2);
}

#[tokio::test]
async fn test_data_excludes_sender_and_reaches_each_member_once() {
    let relay = RelayServer::new();
    let (a, mut a_rx) = connect_peer(&relay).await;
    let (b, mut b_rx) = connect_peer(&relay).await;
    let (c, mut c_rx) = connect_peer(&relay).await;

    relay.join_room(&a, "r1").await;
    relay.join_room(&b, "r1").await;
    relay.join_room(&c, "r1").await;

    // Drain the join notices
    while next_event(&mut a_rx).is_some() {}
    while next_event(&mut b_rx).is_some() {}
    while next_event(&mut c_rx).is_some() {}

    let payload = json!({"sdp": "v=0\r\no=- 0 0 IN IP4 127.0.0.1"});
    relay.relay_data(&a, "r1", payload.clone()).await;

    let expected = json!({"type": "data", "data": payload});
    assert_eq!(next_event(&mut b_rx), Some(expected.clone()));
    assert_eq!(next_event(&mut b_rx), None);
    assert_eq!(next_event(&mut c_rx), Some(expected));
    assert_eq!(next_event(&mut c_rx), None);
    assert_eq!(next_event(&mut a_rx), None);
}

#[tokio::test]
async fn test_data_does_not_create_rooms() {
    let relay = RelayServer::new();
    let (a, mut a_rx) = connect_peer(&relay).await;

    relay.relay_data(&a, "nonexistent", json!({})).await;

    assert!(!relay.has_room("nonexistent").await);
    assert_eq!(next_event(&mut a_rx), None);
}

#[tokio::test]
async fn test_leave_notifies_remaining_members() {
    let relay = RelayServer::new();
    let (a, mut a_rx) = connect_peer(&relay).await;
    let (b, mut b_rx) = connect_peer(&relay).await;

    relay.join_room(&a, "r1").await;
    relay.join_room(&b, "r1").await;
    while next_event(&mut a_rx).is_some() {}

    relay.leave_room(&b, "r1").await;

    assert_eq!(next_event(&mut a_rx), Some(leave_event()));
    assert_eq!(next_event(&mut b_rx), None);
    assert_eq!(relay.room_members("r1").await, vec![a]);
}

#[tokio::test]
async fn test_leave_without_membership_is_silent() {
    let relay = RelayServer::new();
    let (a, mut a_rx) = connect_peer(&relay).await;
    let (b, _b_rx) = connect_peer(&relay).await;

    relay.join_room(&a, "r1").await;
    relay.leave_room(&b, "r1").await;

    assert_eq!(next_event(&mut a_rx), None);
    assert_eq!(relay.room_members("r1").await.len(), 1);
}

#[tokio::test]
async fn test_teardown_vacates_all_rooms_and_notifies_each_once() {
    let relay = RelayServer::new();
    let (a, mut a_rx) = connect_peer(&relay).await;
    let (b, mut b_rx) = connect_peer(&relay).await;
    let (c, mut c_rx) = connect_peer(&relay).await;

    relay.join_room(&a, "r1").await;
    relay.join_room(&a, "r2").await;
    relay.join_room(&b, "r1").await;
    relay.join_room(&c, "r2").await;
    while next_event(&mut a_rx).is_some() {}
    while next_event(&mut b_rx).is_some() {}
    while next_event(&mut c_rx).is_some() {}

    relay.teardown(&a).await;

    assert_eq!(next_event(&mut b_rx), Some(leave_event()));
    assert_eq!(next_event(&mut b_rx), None);
    assert_eq!(next_event(&mut c_rx), Some(leave_event()));
    assert_eq!(next_event(&mut c_rx), None);

    assert_eq!(relay.room_members("r1").await, vec![b.clone()]);
    assert_eq!(relay.room_members("r2").await, vec![c.clone()]);
    assert_eq!(relay.connection_count().await, 2);

    // A second teardown must not double-notify
    relay.teardown(&a).await;
    assert_eq!(next_event(&mut b_rx), None);
    assert_eq!(next_event(&mut c_rx), None);
}

#[tokio::test]
async fn test_teardown_of_last_member_drops_room() {
    let relay = RelayServer::new();
    let (a, _a_rx) = connect_peer(&relay).await;

    relay.join_room(&a, "r1").await;
    relay.teardown(&a).await;

    assert!(!relay.has_room("r1").await);
    assert_eq!(relay.connection_count().await, 0);
}

#[tokio::test]
async fn test_delivery_failure_does_not_abort_fanout() {
    let relay = RelayServer::new();
    let (a, _a_rx) = connect_peer(&relay).await;
    let (b, b_rx) = connect_peer(&relay).await;
    let (c, mut c_rx) = connect_peer(&relay).await;

    relay.join_room(&a, "r1").await;
    relay.join_room(&b, "r1").await;
    relay.join_room(&c, "r1").await;
    while next_event(&mut c_rx).is_some() {}

    // b's writer is gone, as if its socket died mid-broadcast
    drop(b_rx);

    let delivered = relay
        .broadcast_to_room("r1", &ServerEvent::data(json!({"n": 1})), Some(&a))
        .await;

    // c was still reached, and the failure never surfaced to the sender
    assert_eq!(delivered, 1);
    assert_eq!(
        next_event(&mut c_rx),
        Some(json!({"type": "data", "data": {"n": 1}}))
    );

    // The broadcaster never mutates membership; b's own teardown does
    assert_eq!(relay.room_members("r1").await.len(), 3);
    relay.teardown(&b).await;
    assert_eq!(relay.room_members("r1").await.len(), 2);
}
