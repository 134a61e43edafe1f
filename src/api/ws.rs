use std::sync::Arc;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::api::gateway::ConnectionSession;
use crate::api::middleware::bearer_token;
use crate::domain::entities::Identity;
use crate::domain::events::ServerEvent;
use crate::infrastructure::app_state::AppState;
use crate::infrastructure::services::Outbox;

#[derive(Deserialize)]
pub struct WsParams {
    token: Option<String>,
}

/// GET /ws - authenticate, then upgrade to the party protocol
///
/// Authentication is checked before the upgrade itself, so unauthenticated
/// requests get a 401 and never a socket.
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, Response> {
    let token = bearer_token(&headers)
        .map(str::to_string)
        .or(params.token)
        .ok_or_else(|| StatusCode::UNAUTHORIZED.into_response())?;

    let claims = state.jwt_service.verify(&token).map_err(|e| {
        tracing::debug!("Rejected websocket upgrade: {}", e);
        StatusCode::UNAUTHORIZED.into_response()
    })?;

    let ws = ws.map_err(IntoResponse::into_response)?;
    let identity = claims.identity();
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, identity)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, identity: Identity) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let outbox = Outbox::new(state.settings.outbox_capacity);

    let mut session = ConnectionSession::new(state, identity.clone(), outbox.clone());
    let connection_id = session.connection_id();
    tracing::info!(connection_id = %connection_id, user_id = %identity.user_id, "Client connected");

    // Writer: drain the outbox into the socket until it closes
    let writer_outbox = outbox.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = writer_outbox.next().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize {}: {}", event.event_type(), e);
                }
            }
        }
        let _ = ws_sender.send(Message::Close(None)).await;
    });

    loop {
        tokio::select! {
            frame = ws_receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => session.handle_text(&text).await,
                Some(Ok(Message::Binary(_))) => {
                    outbox.push(ServerEvent::error(
                        "InvalidCommand",
                        "Binary frames are not supported",
                    ));
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                    // Axum answers pings itself
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::warn!(connection_id = %connection_id, "WebSocket error: {}", e);
                    break;
                }
            },
            _ = &mut send_task => {
                tracing::warn!(connection_id = %connection_id, "Outbound side closed, dropping connection");
                break;
            }
        }
    }

    session.on_transport_closed().await;
    outbox.close();
    send_task.abort();

    tracing::info!(connection_id = %connection_id, user_id = %identity.user_id, "Client disconnected");
}
