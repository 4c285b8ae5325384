//! WebSocket endpoint
//!
//! `GET /ws` upgrades to a socket that receives every listing event as a
//! JSON text frame. The server greets each connection with a `welcome`
//! event and greets again when the client sends `join`.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;
use voluntar_core::domain::event::ListingEvent;

use crate::state::AppState;

/// GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4().to_string();
    let mut events = state.events.subscribe();
    let (mut sender, mut receiver) = socket.split();

    tracing::info!(
        "Socket connected: {} ({} subscriber(s))",
        connection_id,
        state.events.subscriber_count()
    );

    if send_event(&mut sender, &welcome(&connection_id)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if is_join(text.as_str()) {
                        tracing::debug!("Socket {} joined", connection_id);
                        if send_event(&mut sender, &welcome(&connection_id)).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("Socket {} errored: {}", connection_id, e);
                    break;
                }
            },
            received = events.recv() => match forward(received, &connection_id) {
                Forward::Send(event) => {
                    if send_event(&mut sender, &event).await.is_err() {
                        break;
                    }
                }
                Forward::Skip => {}
                Forward::Stop => break,
            },
        }
    }

    tracing::info!("Socket disconnected: {}", connection_id);
}

/// What the socket loop does with one result from the event channel
#[derive(Debug, PartialEq)]
enum Forward {
    Send(ListingEvent),
    /// The subscriber fell behind; keep going with the next event
    Skip,
    Stop,
}

fn forward(received: Result<ListingEvent, RecvError>, connection_id: &str) -> Forward {
    match received {
        Ok(event) => Forward::Send(event),
        Err(RecvError::Lagged(skipped)) => {
            tracing::warn!(
                "Socket {} lagged behind, skipped {} event(s)",
                connection_id,
                skipped
            );
            Forward::Skip
        }
        Err(RecvError::Closed) => Forward::Stop,
    }
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &ListingEvent,
) -> Result<(), axum::Error> {
    let payload = match serde_json::to_string(event) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!("Failed to encode {}: {}", event.name(), e);
            return Ok(());
        }
    };

    sender.send(Message::Text(payload.into())).await
}

fn welcome(connection_id: &str) -> ListingEvent {
    ListingEvent::Welcome {
        message: "connected to the volunteering listings server".to_string(),
        connection_id: connection_id.to_string(),
    }
}

/// Accepts either a bare `join` or `{"event": "join", ...}`
fn is_join(text: &str) -> bool {
    let text = text.trim();
    if text.eq_ignore_ascii_case("join") {
        return true;
    }

    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|value| value.get("event").and_then(|e| e.as_str()).map(|e| e == "join"))
        .unwrap_or(false)
}
