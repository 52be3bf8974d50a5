//! Realtime Channel
//!
//! One WebSocket per connection, JSON text frames both ways. Inbound events
//! are `join`, `checkMerchantStatus` and `sendFile`; outbound events are
//! `merchantStatus`, `receiveFile` and `error` (see
//! [`crate::session::OutboundEvent`]).
//!
//! Malformed inbound events are dropped with a logged warning; relay
//! failures are reported to the originating connection only, never to the
//! room.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc::{self, UnboundedSender};
use uuid::Uuid;

use super::SharedAppState;
use crate::session::{MerchantStatus, OutboundEvent};

/// Inbound realtime event
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
enum InboundEvent {
    /// Subscribe this connection to the resolved identity's room
    Join,
    /// Ask whether the merchant's room currently has members
    CheckMerchantStatus,
    /// Relay a file to the merchant's room
    SendFile(SendFilePayload),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendFilePayload {
    file_name: String,
    file_data: String,
}

/// GET /ws
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedAppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SharedAppState) {
    let connection = Uuid::new_v4();
    let identity = state.resolver.resolve();
    tracing::debug!(connection = %connection, identity = %identity, "realtime connection opened");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundEvent>();

    // Forward outbound events to this client
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(j) => j,
                Err(_) => continue,
            };
            if sink.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                handle_event(&state, &identity, connection, &tx, &text).await;
            }
            Ok(Message::Close(_)) | Err(_) => break,
            // Pong is handled by axum; binary frames are not part of the protocol
            _ => {}
        }
    }

    state.presence.leave(&identity, &connection).await;
    send_task.abort();
    tracing::debug!(connection = %connection, identity = %identity, "realtime connection closed");
}

async fn handle_event(
    state: &SharedAppState,
    identity: &str,
    connection: Uuid,
    tx: &UnboundedSender<OutboundEvent>,
    text: &str,
) {
    let event: InboundEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(connection = %connection, error = %e, "dropping malformed realtime event");
            return;
        }
    };

    match event {
        InboundEvent::Join => {
            state.presence.join(identity, connection, tx.clone()).await;
        }
        InboundEvent::CheckMerchantStatus => {
            let status = if state.presence.is_online(identity).await {
                MerchantStatus::Online
            } else {
                MerchantStatus::Offline
            };
            let _ = tx.send(OutboundEvent::MerchantStatus(status));
        }
        InboundEvent::SendFile(payload) => {
            match state
                .relay
                .relay(identity, payload.file_name, payload.file_data)
                .await
            {
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(connection = %connection, error = %e, "failed to relay transfer");
                    let _ = tx.send(OutboundEvent::Error(
                        "failed to save file record".to_string(),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_event_decoding() {
        assert!(matches!(
            serde_json::from_str::<InboundEvent>(r#"{"event":"join"}"#),
            Ok(InboundEvent::Join)
        ));
        assert!(matches!(
            serde_json::from_str::<InboundEvent>(r#"{"event":"checkMerchantStatus"}"#),
            Ok(InboundEvent::CheckMerchantStatus)
        ));

        let event: InboundEvent = serde_json::from_str(
            r#"{"event":"sendFile","data":{"fileName":"a.txt","fileData":"YQ=="}}"#,
        )
        .unwrap();
        match event {
            InboundEvent::SendFile(payload) => {
                assert_eq!(payload.file_name, "a.txt");
                assert_eq!(payload.file_data, "YQ==");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_events_rejected() {
        // Unknown event name
        assert!(serde_json::from_str::<InboundEvent>(r#"{"event":"selfDestruct"}"#).is_err());
        // Missing required payload fields
        assert!(serde_json::from_str::<InboundEvent>(
            r#"{"event":"sendFile","data":{"fileName":"a.txt"}}"#
        )
        .is_err());
        // Not JSON at all
        assert!(serde_json::from_str::<InboundEvent>("sendFile").is_err());
    }
}
