use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use chrono::Utc;
use dm_core::BroadcastEvent;
use dm_pipeline::ChannelBroadcaster;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tracing::{debug, warn};

use crate::AppState;

const HEARTBEAT: Duration = Duration::from_secs(30);

/// GET /realtime/ws/disasters
pub async fn disaster_feed(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let events = state.broadcaster.subscribe();
    let broadcaster = state.broadcaster.clone();
    ws.on_upgrade(move |socket| relay(socket, events, broadcaster))
}

/// Forward broadcast events to one client until either side goes away.
async fn relay(socket: WebSocket, mut events: Receiver<BroadcastEvent>, broadcaster: ChannelBroadcaster) {
    let (mut sender, mut incoming) = socket.split();

    let hello = json!({
        "type": "connected",
        "message": "Connected to disaster realtime feed",
        "timestamp": Utc::now(),
    });
    if sender.send(Message::Text(hello.to_string())).await.is_err() {
        return;
    }
    debug!("🔌 Realtime client connected ({} listening)", broadcaster.subscriber_count());

    let mut heartbeat = tokio::time::interval(HEARTBEAT);
    heartbeat.tick().await;

    loop {
        let outgoing = tokio::select! {
            event = events.recv() => match event {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Could not encode event for {}: {}", event.data.url, e);
                        continue;
                    }
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Realtime client lagged, {} events dropped", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
            message = incoming.next() => match message {
                Some(Ok(Message::Text(text))) if text == "ping" => json!({ "type": "pong" }).to_string(),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => continue,
            },
            _ = heartbeat.tick() => json!({
                "type": "heartbeat",
                "timestamp": Utc::now(),
                "connections": broadcaster.subscriber_count(),
            })
            .to_string(),
        };

        if sender.send(Message::Text(outgoing)).await.is_err() {
            break;
        }
    }
    debug!("🔌 Realtime client disconnected");
}
