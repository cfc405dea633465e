use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};

use crate::state::AppState;
use crate::ws::ConnectionSender;

/// Ping interval: server sends WebSocket ping every 30 seconds.
/// Prevents connection leaks from abrupt disconnects.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Pong timeout: if pong not received within 10 seconds after ping, close.
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Control frames a client sends to manage its topic subscriptions.
/// Everything the server pushes is a `RoomEvent`; the client never receives a
/// reply to these frames, it just starts (or stops) receiving the topic.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    Subscribe { room_id: String },
    Unsubscribe { room_id: String },
}

/// Run the actor-per-connection pattern for a WebSocket.
///
/// Splits the WebSocket into reader and writer halves:
/// - Writer task: owns the sink, forwards messages from an mpsc channel
/// - Reader task: processes incoming frames, maintains topic subscriptions
///
/// The mpsc channel allows the room fan-out to push events to this client
/// by cloning the sender.
pub async fn run_connection(socket: WebSocket, state: AppState, initial_room: Option<String>) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    // Track which topics this connection holds, so cleanup can unsubscribe
    // them all without a registry scan.
    let mut subscribed: Vec<String> = Vec::new();

    if let Some(room_id) = initial_room {
        subscribe(&state, &room_id, tx.clone());
        subscribed.push(room_id);
    }

    tracing::info!(topics = subscribed.len(), "WebSocket actor started");

    // Spawn writer task: forwards mpsc messages to WebSocket sink
    let writer_handle = tokio::spawn(writer_task(ws_sender, rx));

    // Track pong reception
    let (pong_tx, mut pong_rx) = mpsc::unbounded_channel::<()>();

    // Spawn ping task: sends periodic pings and monitors pong responses
    let ping_tx = tx.clone();
    let ping_handle = tokio::spawn(async move {
        let mut ping_timer = interval(PING_INTERVAL);
        // Skip the first immediate tick
        ping_timer.tick().await;

        loop {
            ping_timer.tick().await;

            if ping_tx.send(Message::Ping(vec![1, 2, 3, 4].into())).is_err() {
                // Writer task has died, connection is gone
                break;
            }

            match timeout(PONG_TIMEOUT, pong_rx.recv()).await {
                Ok(Some(())) => {
                    // Pong received, continue
                }
                _ => {
                    tracing::warn!("Pong timeout, closing connection");
                    let _ = ping_tx.send(Message::Close(Some(CloseFrame {
                        code: 1001,
                        reason: "Pong timeout".into(),
                    })));
                    break;
                }
            }
        }
    });

    // Reader loop: process incoming WebSocket frames
    loop {
        match ws_receiver.next().await {
            Some(Ok(msg)) => match msg {
                Message::Text(text) => match serde_json::from_str::<ClientFrame>(&text) {
                    Ok(ClientFrame::Subscribe { room_id }) => {
                        if !subscribed.contains(&room_id) {
                            subscribe(&state, &room_id, tx.clone());
                            subscribed.push(room_id);
                        }
                    }
                    Ok(ClientFrame::Unsubscribe { room_id }) => {
                        if let Some(idx) = subscribed.iter().position(|r| r == &room_id) {
                            subscribed.swap_remove(idx);
                            unsubscribe(&state, &room_id, &tx);
                        }
                    }
                    Err(e) => {
                        tracing::debug!(
                            error = %e,
                            "Unparseable client frame: {}",
                            text.chars().take(100).collect::<String>()
                        );
                    }
                },
                Message::Binary(_) => {
                    // Protocol is JSON text frames; binary is ignored
                    tracing::debug!("Received binary frame (expected text)");
                }
                Message::Pong(_) => {
                    // Pong received, notify the ping task
                    let _ = pong_tx.send(());
                }
                Message::Ping(data) => {
                    // Respond to client pings with pong
                    let _ = tx.send(Message::Pong(data));
                }
                Message::Close(frame) => {
                    tracing::info!(reason = ?frame, "Client initiated close");
                    break;
                }
            },
            Some(Err(e)) => {
                tracing::warn!(error = %e, "WebSocket receive error");
                break;
            }
            None => {
                // Stream ended, client disconnected
                tracing::info!("WebSocket stream ended");
                break;
            }
        }
    }

    // Cleanup: abort writer and ping tasks
    writer_handle.abort();
    ping_handle.abort();

    // Dropping the topic subscriptions only stops event delivery; room
    // membership is an explicit leave command, never a side effect of a
    // transport disconnect.
    for room_id in &subscribed {
        unsubscribe(&state, room_id, &tx);
    }

    tracing::info!("WebSocket actor stopped");
}

/// Writer task: receives messages from mpsc channel and forwards them to the WebSocket sink.
async fn writer_task(
    mut ws_sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        if ws_sender.send(msg).await.is_err() {
            // WebSocket send failed, connection is broken
            break;
        }
    }
}

/// Register a connection sender under a room topic.
fn subscribe(state: &AppState, room_id: &str, tx: ConnectionSender) {
    state
        .topics
        .entry(room_id.to_string())
        .or_default()
        .push(tx);

    let subscriber_count = state.topics.get(room_id).map(|v| v.len()).unwrap_or(0);
    tracing::debug!(
        room_id = %room_id,
        subscribers = subscriber_count,
        "Topic subscribed"
    );
}

/// Remove this connection's sender from a room topic, sweeping any other
/// senders whose actors have already exited.
fn unsubscribe(state: &AppState, room_id: &str, tx: &ConnectionSender) {
    let mut remove_topic = false;

    if let Some(mut connections) = state.topics.get_mut(room_id) {
        connections.retain(|sender| !sender.same_channel(tx) && !sender.is_closed());
        if connections.is_empty() {
            remove_topic = true;
        }
    }

    if remove_topic {
        state.topics.remove(room_id);
    }

    tracing::debug!(room_id = %room_id, "Topic unsubscribed");
}
