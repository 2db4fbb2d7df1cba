use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
    Extension, Json,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::services::dispatcher::NotificationDispatcher;
use crate::services::tokens::SocketTokenStore;

pub struct RealtimeState {
    pub tokens: Arc<SocketTokenStore>,
    pub dispatcher: NotificationDispatcher,
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// GET /patients/socket-token. Issues a short-lived single-use token the
/// client hands back on the websocket handshake.
pub async fn issue_socket_token(
    State(state): State<Arc<RealtimeState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let token = state
        .tokens
        .issue(user.id)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to issue socket token: {e}")))?;

    Ok(Json(json!({ "token": token })))
}

/// GET /ws?token=... The token is the sole credential; a missing, expired, or
/// already-consumed token rejects the upgrade.
pub async fn ws_handler(
    State(state): State<Arc<RealtimeState>>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let token = query
        .token
        .ok_or_else(|| AppError::Auth("Missing auth token".to_string()))?;

    let patient_id = state
        .tokens
        .consume(&token)
        .await
        .ok_or_else(|| AppError::Auth("Invalid or expired token".to_string()))?;

    let dispatcher = state.dispatcher.clone();
    Ok(ws.on_upgrade(move |socket| patient_session(socket, dispatcher, patient_id)))
}

async fn patient_session(socket: WebSocket, dispatcher: NotificationDispatcher, patient_id: Uuid) {
    info!("Patient {patient_id} connected to realtime channel");

    let mut signals = dispatcher.subscribe(patient_id).await;
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            signal = signals.recv() => {
                match signal {
                    Ok(signal) => {
                        let payload = match serde_json::to_string(&signal) {
                            Ok(payload) => payload,
                            Err(e) => {
                                warn!("Failed to serialize signal for patient {patient_id}: {e}");
                                continue;
                            }
                        };
                        if sink.send(Message::Text(payload.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        // Receiver fell behind; the client re-fetches on the
                        // next lifecycle signal anyway.
                        debug!("Patient {patient_id} channel lagged by {n} signals");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            message = stream.next() => {
                match message {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Inbound frames carry no meaning on this channel.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    info!("Patient {patient_id} disconnected from realtime channel");
    dispatcher.prune(patient_id).await;
}
