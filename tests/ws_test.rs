//! Integration tests for WebSocket event delivery: topic subscription,
//! room event fan-out, ping/pong, and cleanup on disconnect.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use syncroom_server::config::SpotifyConfig;
use syncroom_server::rooms::model::PlaybackSnapshot;
use syncroom_server::rooms::registry::RoomRegistry;
use syncroom_server::spotify::{PlaybackProvider, ProviderError};
use syncroom_server::users::UserRegistry;
use syncroom_server::ws::broadcast::WsFanout;

struct StubProvider;

#[async_trait]
impl PlaybackProvider for StubProvider {
    async fn current_playback(
        &self,
        _credential: &str,
    ) -> Result<Option<PlaybackSnapshot>, ProviderError> {
        Ok(Some(PlaybackSnapshot {
            track_id: Some("track-1".to_string()),
            track_name: Some("Test Track".to_string()),
            artists: vec!["Test Artist".to_string()],
            uri: Some("spotify:track:track-1".to_string()),
            is_playing: true,
            position_ms: 1_000,
        }))
    }
}

type WsRead = futures_util::stream::SplitStream<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
>;

/// Helper: start the server on a random port and return (base_url, addr).
async fn start_test_server() -> (String, SocketAddr) {
    let topics = syncroom_server::ws::new_topic_registry();
    let state = syncroom_server::state::AppState {
        rooms: Arc::new(RoomRegistry::new()),
        users: Arc::new(UserRegistry::new()),
        topics: topics.clone(),
        events: Arc::new(WsFanout::new(topics)),
        provider: Arc::new(StubProvider),
        spotify: SpotifyConfig::default(),
    };

    let app = syncroom_server::routes::build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), addr)
}

/// Create a room with a credentialed host and return its id.
async fn create_room(base_url: &str) -> String {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/api/rooms", base_url))
        .json(&json!({
            "user_id": "host",
            "display_name": "Alice",
            "credential": "host-token",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    body["room_id"].as_str().unwrap().to_string()
}

/// Read the next text frame as JSON, failing after a 2s timeout.
async fn next_event(read: &mut WsRead) -> serde_json::Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), read.next())
            .await
            .expect("Expected event within timeout")
            .expect("Stream ended")
            .expect("WebSocket error");
        match msg {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("Expected text frame, got: {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_subscriber_receives_join_event() {
    let (base_url, addr) = start_test_server().await;
    let room_id = create_room(&base_url).await;

    let ws_url = format!("ws://{}/ws?room_id={}", addr, room_id);
    let (ws_stream, _) = tokio_tungstenite::connect_async(&ws_url)
        .await
        .expect("Failed to connect to WebSocket");
    let (mut _write, mut read) = ws_stream.split();

    let client = reqwest::Client::new();
    client
        .post(format!("{}/api/rooms/{}/join", base_url, room_id))
        .json(&json!({ "user_id": "u2", "display_name": "Bob" }))
        .send()
        .await
        .unwrap();

    let event = next_event(&mut read).await;
    assert_eq!(event["type"].as_str().unwrap(), "user_joined");
    assert_eq!(event["user"]["user_id"].as_str().unwrap(), "u2");
    assert_eq!(event["room"]["members"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_subscribe_frame_attaches_to_topic() {
    let (base_url, addr) = start_test_server().await;
    let room_id = create_room(&base_url).await;

    // Connect without an initial room, then subscribe with a frame
    let ws_url = format!("ws://{}/ws", addr);
    let (ws_stream, _) = tokio_tungstenite::connect_async(&ws_url)
        .await
        .expect("Failed to connect to WebSocket");
    let (mut write, mut read) = ws_stream.split();

    write
        .send(Message::Text(
            json!({ "type": "subscribe", "room_id": room_id }).to_string().into(),
        ))
        .await
        .unwrap();
    // Give the actor a moment to register the subscription
    tokio::time::sleep(Duration::from_millis(100)).await;

    let client = reqwest::Client::new();
    client
        .post(format!("{}/api/rooms/{}/join", base_url, room_id))
        .json(&json!({ "user_id": "u2" }))
        .send()
        .await
        .unwrap();

    let event = next_event(&mut read).await;
    assert_eq!(event["type"].as_str().unwrap(), "user_joined");
}

#[tokio::test]
async fn test_unsubscribe_stops_delivery() {
    let (base_url, addr) = start_test_server().await;
    let room_id = create_room(&base_url).await;

    let ws_url = format!("ws://{}/ws?room_id={}", addr, room_id);
    let (ws_stream, _) = tokio_tungstenite::connect_async(&ws_url)
        .await
        .expect("Failed to connect to WebSocket");
    let (mut write, mut read) = ws_stream.split();

    write
        .send(Message::Text(
            json!({ "type": "unsubscribe", "room_id": room_id }).to_string().into(),
        ))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let client = reqwest::Client::new();
    client
        .post(format!("{}/api/rooms/{}/join", base_url, room_id))
        .json(&json!({ "user_id": "u2" }))
        .send()
        .await
        .unwrap();

    let result = tokio::time::timeout(Duration::from_millis(500), read.next()).await;
    assert!(result.is_err(), "Expected no event after unsubscribe");
}

#[tokio::test]
async fn test_full_sync_event_sequence() {
    let (base_url, addr) = start_test_server().await;
    let room_id = create_room(&base_url).await;

    let ws_url = format!("ws://{}/ws?room_id={}", addr, room_id);
    let (ws_stream, _) = tokio_tungstenite::connect_async(&ws_url)
        .await
        .expect("Failed to connect to WebSocket");
    let (mut _write, mut read) = ws_stream.split();

    let client = reqwest::Client::new();
    client
        .post(format!("{}/api/rooms/{}/join", base_url, room_id))
        .json(&json!({ "user_id": "u2" }))
        .send()
        .await
        .unwrap();
    client
        .post(format!("{}/api/rooms/{}/sync", base_url, room_id))
        .send()
        .await
        .unwrap();
    client
        .post(format!("{}/api/rooms/{}/ready", base_url, room_id))
        .json(&json!({ "user_id": "u2" }))
        .send()
        .await
        .unwrap();

    let event = next_event(&mut read).await;
    assert_eq!(event["type"].as_str().unwrap(), "user_joined");

    let event = next_event(&mut read).await;
    assert_eq!(event["type"].as_str().unwrap(), "sync_requested");
    assert_eq!(event["playback"]["track_id"].as_str().unwrap(), "track-1");
    assert_eq!(event["room"]["sync_in_progress"], true);

    let event = next_event(&mut read).await;
    assert_eq!(event["type"].as_str().unwrap(), "all_ready");
    assert_eq!(event["playback"]["track_id"].as_str().unwrap(), "track-1");
    assert_eq!(event["room"]["sync_in_progress"], false);
}

#[tokio::test]
async fn test_room_deleted_event() {
    let (base_url, addr) = start_test_server().await;
    let room_id = create_room(&base_url).await;

    let ws_url = format!("ws://{}/ws?room_id={}", addr, room_id);
    let (ws_stream, _) = tokio_tungstenite::connect_async(&ws_url)
        .await
        .expect("Failed to connect to WebSocket");
    let (mut _write, mut read) = ws_stream.split();

    let client = reqwest::Client::new();
    client
        .post(format!("{}/api/rooms/{}/leave", base_url, room_id))
        .json(&json!({ "user_id": "host" }))
        .send()
        .await
        .unwrap();

    let event = next_event(&mut read).await;
    assert_eq!(event["type"].as_str().unwrap(), "room_deleted");
    assert_eq!(event["room_id"].as_str().unwrap(), room_id);
}

#[tokio::test]
async fn test_ws_ping_pong() {
    let (_base_url, addr) = start_test_server().await;

    let ws_url = format!("ws://{}/ws", addr);
    let (ws_stream, _) = tokio_tungstenite::connect_async(&ws_url)
        .await
        .expect("Failed to connect");
    let (mut write, mut read) = ws_stream.split();

    write
        .send(Message::Ping(vec![42, 43, 44].into()))
        .await
        .expect("Failed to send ping");

    let msg = tokio::time::timeout(Duration::from_secs(2), read.next())
        .await
        .expect("Expected pong within timeout");

    match msg {
        Some(Ok(Message::Pong(data))) => {
            assert_eq!(data.as_ref(), &[42, 43, 44], "Pong data should match ping");
        }
        other => panic!("Expected Pong message, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_disconnect_does_not_remove_membership() {
    let (base_url, addr) = start_test_server().await;
    let room_id = create_room(&base_url).await;

    let client = reqwest::Client::new();
    client
        .post(format!("{}/api/rooms/{}/join", base_url, room_id))
        .json(&json!({ "user_id": "u2" }))
        .send()
        .await
        .unwrap();

    // Connect as the joiner, then drop the connection
    {
        let ws_url = format!("ws://{}/ws?room_id={}", addr, room_id);
        let (ws_stream, _) = tokio_tungstenite::connect_async(&ws_url)
            .await
            .expect("Failed to connect");
        let (mut write, _read) = ws_stream.split();
        write.send(Message::Close(None)).await.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Membership is unchanged; dropping a socket is not a leave
    let room: serde_json::Value = reqwest::get(format!("{}/api/rooms/{}", base_url, room_id))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(room["members"].as_array().unwrap().len(), 2);
}
