// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The HTTP/WebSocket transport: content-negotiated JSON/binary RPC over
//! `POST /rpc`, a `GET /ws` event stream, and `GET /healthz`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;

use mediator_core::{Clock, Event, MediatorError, SessionId};

use crate::process::Mediator;
use crate::rpc::{self, RpcRequest};

const BINARY_CONTENT_TYPE: &str = "application/octet-stream";
/// First frame of a WebSocket connection (the session id) must arrive
/// within this many bytes or the connection is refused.
const HANDSHAKE_FRAME_LIMIT: usize = 1024;

#[derive(Clone)]
struct AppState<C: Clock + Clone> {
    mediator: Arc<Mediator<C>>,
}

/// Builds the router. `mediator` is shared with the event loop and the
/// abandonment sweep that the caller spawns alongside this server.
pub fn router<C: Clock + Clone + Send + Sync + 'static>(mediator: Arc<Mediator<C>>) -> Router {
    Router::new()
        .route("/rpc", post(rpc_handler::<C>))
        .route("/ws", get(ws_handler::<C>))
        .route("/healthz", get(healthz))
        .with_state(AppState { mediator })
}

/// Serves `router` on `addr` until `shutdown` resolves.
pub async fn serve(
    addr: std::net::SocketAddr,
    app: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "mediator transport listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn healthz() -> &'static str {
    "ok"
}

/// Errors that escape request handling and need a status code and body.
/// A `MediatorError` maps through its own taxonomy; anything else (body too
/// large, undecodable content) is a plain 400 with no `error` key, per the
/// wire contract's distinction between "well-formed but rejected" and
/// "not a request at all".
enum TransportError {
    Mediator(MediatorError),
    Malformed(String),
}

impl From<MediatorError> for TransportError {
    fn from(e: MediatorError) -> Self {
        TransportError::Mediator(e)
    }
}

impl IntoResponse for TransportError {
    fn into_response(self) -> Response {
        match self {
            TransportError::Mediator(e) => {
                let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                tracing::warn!(kind = e.kind(), error = %e, "rpc request failed");
                (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
            }
            TransportError::Malformed(msg) => {
                tracing::warn!(error = %msg, "malformed rpc request body");
                (StatusCode::BAD_REQUEST, msg).into_response()
            }
        }
    }
}

/// `POST /rpc`: negotiates JSON vs. `application/octet-stream` (bincode) by
/// `Content-Type`, and answers in kind.
async fn rpc_handler<C: Clock + Clone + Send + Sync + 'static>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, TransportError> {
    let binary = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with(BINARY_CONTENT_TYPE))
        .unwrap_or(false);

    let req: RpcRequest = if binary {
        bincode::deserialize(&body)
            .map_err(|e| TransportError::Malformed(format!("invalid binary request: {e}")))?
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| TransportError::Malformed(format!("invalid json request: {e}")))?
    };

    let now_ms = state.mediator.clock_now_ms();
    let ok = rpc::dispatch(&state.mediator, req, now_ms).await?;

    if binary {
        let bytes = bincode::serialize(&ok)
            .map_err(|e| TransportError::Malformed(format!("failed to encode response: {e}")))?;
        Ok(([(header::CONTENT_TYPE, BINARY_CONTENT_TYPE)], bytes).into_response())
    } else {
        Ok(Json(ok).into_response())
    }
}

async fn ws_handler<C: Clock + Clone + Send + Sync + 'static>(
    State(state): State<AppState<C>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.max_message_size(HANDSHAKE_FRAME_LIMIT)
        .on_upgrade(move |socket| handle_socket(socket, state.mediator))
}

/// One event-subscription socket's lifetime: the first text frame binds the
/// socket to a live session id, then every outbound event for that session
/// is pushed as a JSON text frame and must be acknowledged with a literal
/// `"OK"` text frame before the next one is sent.
async fn handle_socket<C: Clock + Clone + Send + Sync + 'static>(
    mut socket: WebSocket,
    mediator: Arc<Mediator<C>>,
) {
    let session_id = match socket.recv().await {
        Some(Ok(Message::Text(text))) => SessionId::new(text),
        Some(Ok(Message::Close(_))) | None => return,
        Some(Ok(_)) => {
            let _ = socket
                .send(Message::Close(Some(axum::extract::ws::CloseFrame {
                    code: axum::extract::ws::close_code::INVALID,
                    reason: "first frame must be the session id".into(),
                })))
                .await;
            return;
        }
        Some(Err(e)) => {
            tracing::warn!(error = %e, "websocket handshake read failed");
            return;
        }
    };

    tracing::debug!(%session_id, "websocket bound to session");

    loop {
        let event = loop {
            if let Some(event) = mediator.handler.lock().dequeue_outbound(&session_id) {
                break Some(event);
            }
            tokio::select! {
                _ = mediator.session_wake.notified() => continue,
                frame = socket.recv() => {
                    match frame {
                        Some(Ok(Message::Close(_))) | None => return,
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            tracing::warn!(%session_id, error = %e, "websocket read failed");
                            return;
                        }
                    }
                }
            }
        };
        let Some(event) = event else { return };

        if !push_event(&mut socket, &mediator, &session_id, event).await {
            return;
        }
    }
}

async fn push_event<C: Clock + Clone + Send + Sync + 'static>(
    socket: &mut WebSocket,
    mediator: &Arc<Mediator<C>>,
    session_id: &SessionId,
    event: Event,
) -> bool {
    let payload = match serde_json::to_string(&event) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!(error = %e, "failed to encode outbound event");
            return true;
        }
    };
    if socket.send(Message::Text(payload)).await.is_err() {
        return false;
    }
    match socket.recv().await {
        Some(Ok(Message::Text(ack))) if ack == "OK" => {
            mediator
                .handler
                .lock()
                .record_ack(session_id, mediator.clock_now_ms());
            true
        }
        Some(Ok(Message::Close(_))) | None => false,
        Some(Ok(_)) => true,
        Some(Err(_)) => false,
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
