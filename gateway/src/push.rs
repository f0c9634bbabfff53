//! Real-time push channel.
//!
//! Thin publish/subscribe wrapper over `tokio::sync::broadcast`: one global
//! channel for threat events, plus a private room per recipient for targeted
//! alert delivery. Delivery is at-most-once, best-effort - a lagged or
//! disconnected client misses events and reconciles over REST.
//!
//! The hub is passed into the orchestrator and the fan-out explicitly;
//! nothing in the pipeline reaches for a global handle.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use coastal_domain::{AlertRecord, ThreatRecord};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::routes::AppState;

/// Broadcast buffer for the global channel.
const GLOBAL_CHANNEL_CAPACITY: usize = 256;

/// Buffer for each per-recipient room.
const ROOM_CHANNEL_CAPACITY: usize = 64;

/// Events pushed to connected clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PushEvent {
    NewThreat { threat: ThreatRecord },
    ThreatUpdated { threat: ThreatRecord },
    NewAlert { alert: AlertRecord },
    SystemStatus { message: String, timestamp: DateTime<Utc> },
}

/// Publish/subscribe hub with a global stream and per-recipient rooms.
pub struct PushHub {
    global_tx: broadcast::Sender<PushEvent>,
    rooms: RwLock<HashMap<Uuid, broadcast::Sender<PushEvent>>>,
}

impl PushHub {
    pub fn new() -> Self {
        let (global_tx, _) = broadcast::channel(GLOBAL_CHANNEL_CAPACITY);
        Self {
            global_tx,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe to the global stream.
    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.global_tx.subscribe()
    }

    /// Join a recipient's private room, creating it on first use.
    pub async fn subscribe_recipient(&self, recipient_id: Uuid) -> broadcast::Receiver<PushEvent> {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(recipient_id)
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Broadcast to every connected client. A send error only means nobody
    /// is listening, which is fine for best-effort push.
    pub fn broadcast(&self, event: PushEvent) {
        let _ = self.global_tx.send(event);
    }

    /// Deliver to one recipient's room, if anyone ever joined it.
    pub async fn send_to(&self, recipient_id: Uuid, event: PushEvent) {
        let rooms = self.rooms.read().await;
        if let Some(tx) = rooms.get(&recipient_id) {
            let _ = tx.send(event);
        }
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

impl Default for PushHub {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// WebSocket endpoint
// ============================================================================

#[derive(Deserialize)]
pub struct WsQuery {
    /// Joins this recipient's private room in addition to the global stream.
    pub recipient_id: Option<Uuid>,
}

/// GET /ws - upgrade and stream push events as JSON text frames.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| client_session(socket, state.push, query.recipient_id))
}

async fn client_session(socket: WebSocket, hub: Arc<PushHub>, recipient_id: Option<Uuid>) {
    let (mut sink, mut stream): (SplitSink<WebSocket, Message>, SplitStream<WebSocket>) =
        socket.split();

    let mut global_rx = hub.subscribe();

    // Clients without a recipient identity still get the global stream; give
    // them an empty room receiver so the select loop stays uniform.
    let mut room_rx = match recipient_id {
        Some(id) => {
            debug!(recipient = %id, "client joined private room");
            hub.subscribe_recipient(id).await
        }
        None => broadcast::channel(1).0.subscribe(),
    };

    loop {
        tokio::select! {
            event = global_rx.recv() => {
                if !forward(&mut sink, event).await {
                    break;
                }
            }
            event = room_rx.recv() => {
                if !forward(&mut sink, event).await {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    // Inbound frames are ignored; the socket is push-only.
                    Some(Ok(_)) => {}
                }
            }
        }
    }
    debug!("client session ended");
}

/// Returns false when the session should end.
async fn forward(
    sink: &mut SplitSink<WebSocket, Message>,
    event: std::result::Result<PushEvent, broadcast::error::RecvError>,
) -> bool {
    match event {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json) => sink.send(Message::Text(json)).await.is_ok(),
            Err(e) => {
                warn!(error = %e, "failed to serialize push event");
                true
            }
        },
        // At-most-once: a slow client just skips what it missed.
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
            warn!(skipped, "push subscriber lagged, events dropped");
            true
        }
        Err(broadcast::error::RecvError::Closed) => false,
    }
}
