//! Drives the WebSocket gateway against a real listening server.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use cowatch_collab::Collab;
use cowatch_server::{create_app, Db};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> (SocketAddr, Arc<Collab<Db>>) {
    let collab = Arc::new(Collab::new(Db::default()));
    let app = create_app(collab.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, collab)
}

async fn connect(addr: SocketAddr, room_id: i64) -> Socket {
    let (socket, _) = connect_async(format!("ws://{addr}/v1/rooms/{room_id}/gateway"))
        .await
        .expect("connects");

    socket
}

/// The join happens in the upgraded connection's task, so give it a moment
async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("condition never became true");
}

async fn next_json(socket: &mut Socket) -> Value {
    let message = socket
        .next()
        .await
        .expect("connection is open")
        .expect("frame is received");

    serde_json::from_str(message.to_text().expect("frame is text")).expect("frame is json")
}

#[tokio::test]
async fn users_can_create_a_room_and_watch_together() {
    let (addr, collab) = start_server().await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    // Alice registers, logs in, and creates a room
    client
        .post(format!("{base}/v1/register"))
        .json(&json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "correct horse",
        }))
        .send()
        .await
        .unwrap();

    let login: Value = client
        .post(format!("{base}/v1/login"))
        .json(&json!({ "username": "alice", "password": "correct horse" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let alice_token = login["token"].as_str().unwrap();

    let room: Value = client
        .post(format!("{base}/v1/rooms"))
        .bearer_auth(alice_token)
        .json(&json!({ "name": "Movie Night" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let code = room["invite_code"].as_str().unwrap();
    assert_eq!(code.len(), 8);

    // Bob registers and resolves the invite code to the same room
    let bob: Value = client
        .post(format!("{base}/v1/register"))
        .json(&json!({
            "username": "bob",
            "email": "bob@example.com",
            "password": "correct horse",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let resolved: Value = client
        .post(format!("{base}/v1/rooms/join"))
        .bearer_auth(bob["token"].as_str().unwrap())
        .json(&json!({ "invite_code": code }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resolved["id"], room["id"]);

    // Both join the relay for that room
    let room_id = room["id"].as_i64().unwrap();
    let mut alice_ws = connect(addr, room_id).await;
    let mut bob_ws = connect(addr, room_id).await;
    wait_until(|| collab.relay.member_count(room_id as i32) == 2).await;

    // Alice starts playback and both ends see the exact payload
    let sent = json!({ "type": "playback", "action": "PLAY", "time": 12.5 });
    alice_ws
        .send(Message::Text(sent.to_string()))
        .await
        .unwrap();

    assert_eq!(next_json(&mut bob_ws).await, sent);
    assert_eq!(next_json(&mut alice_ws).await, sent);
}

#[tokio::test]
async fn malformed_frames_are_dropped_without_disconnecting() {
    let (addr, collab) = start_server().await;

    let mut a = connect(addr, 7).await;
    let mut b = connect(addr, 7).await;
    wait_until(|| collab.relay.member_count(7) == 2).await;

    a.send(Message::Text("not even json".to_string()))
        .await
        .unwrap();
    a.send(Message::Text(
        json!({ "type": "chat", "message": "still here" }).to_string(),
    ))
    .await
    .unwrap();

    // The only thing broadcast is the valid frame, and nobody disconnected
    let received = next_json(&mut b).await;
    assert_eq!(received["type"], json!("chat"));
    assert_eq!(received["message"], json!("still here"));
    assert_eq!(collab.relay.member_count(7), 2);
}

#[tokio::test]
async fn events_stay_inside_their_room() {
    let (addr, collab) = start_server().await;

    let mut a = connect(addr, 1).await;
    let mut b = connect(addr, 2).await;
    wait_until(|| collab.relay.member_count(1) == 1 && collab.relay.member_count(2) == 1).await;

    a.send(Message::Text(
        json!({ "type": "chat", "message": "room one only" }).to_string(),
    ))
    .await
    .unwrap();

    // a gets its own echo, b must see nothing
    assert_eq!(next_json(&mut a).await["message"], json!("room one only"));

    let nothing = tokio::time::timeout(Duration::from_millis(200), b.next()).await;
    assert!(nothing.is_err());
}

#[tokio::test]
async fn disconnecting_evicts_the_empty_room() {
    let (addr, collab) = start_server().await;

    let socket = connect(addr, 9).await;
    wait_until(|| collab.relay.member_count(9) == 1).await;

    drop(socket);
    wait_until(|| !collab.relay.is_active(9)).await;
}
