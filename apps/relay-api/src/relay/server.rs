//! WebSocket upgrade handler and per-connection tasks.
//!
//! Each accepted connection runs two tasks: a writer that drains the
//! handle's outbound queue into the socket, and the receive loop below,
//! which is the connection's only reader. The receive loop terminates
//! on stream closure, stream error, or the handle being closed (session
//! delete, process shutdown), and departure cleanup runs on every exit
//! path via a drop guard.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};

use crate::error::ApiError;
use crate::AppState;

use super::handle::{ConnectionDriver, ConnectionHandle, Outbound};
use super::registry::Registry;

/// Application close code sent when the session vanished between the
/// route check and the upgrade completing.
const CLOSE_SESSION_GONE: u16 = 4004;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws/{session_id}", get(ws_upgrade))
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    if state.registry.get_session(&session_id).is_none() {
        return Err(ApiError::not_found("Session not found"));
    }
    Ok(ws.on_upgrade(move |socket| handle_connection(socket, state, session_id)))
}

async fn handle_connection(mut socket: WebSocket, state: AppState, session_id: String) {
    let (handle, driver) = match state.registry.join(&session_id) {
        Ok(pair) => pair,
        Err(_) => {
            // Lost the race with a delete; reject the offered stream.
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: CLOSE_SESSION_GONE,
                    reason: "Session not found".into(),
                })))
                .await;
            return;
        }
    };

    tracing::info!(
        session_id = %session_id,
        participant_id = %handle.participant_id,
        "participant joined"
    );

    let (ws_tx, ws_rx) = socket.split();
    let ConnectionDriver { outbound, close } = driver;
    let writer = tokio::spawn(run_writer(ws_tx, outbound));

    // leave() must run exactly once per connection, on every exit path
    // out of the receive loop, panics included.
    let guard = DepartureGuard {
        registry: Arc::clone(&state.registry),
        participant_id: handle.participant_id.clone(),
    };

    run_receive(&state.registry, &handle, ws_rx, close).await;

    drop(guard);
    let _ = writer.await;
}

/// The sole consumer of the inbound stream. Every inbound frame is an
/// opaque capture payload relayed to the rest of the session. No idle
/// timeout: a silent connection stays registered until it closes.
async fn run_receive(
    registry: &Registry,
    handle: &ConnectionHandle,
    mut ws_rx: SplitStream<WebSocket>,
    mut close: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = close.changed() => break,
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    registry.relay(&handle.participant_id, text.to_string());
                }
                Some(Ok(Message::Binary(bytes))) => {
                    registry.relay(
                        &handle.participant_id,
                        String::from_utf8_lossy(&bytes).into_owned(),
                    );
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::debug!(
                        ?e,
                        participant_id = %handle.participant_id,
                        "ws read error"
                    );
                    break;
                }
            }
        }
    }
}

/// Drains the outbound queue into the socket. A write failure marks the
/// connection dead; cleanup follows from the receive loop terminating.
async fn run_writer(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    while let Some(frame) = outbound.recv().await {
        match frame {
            Outbound::Event(event) => {
                let Ok(json) = serde_json::to_string(&event) else {
                    continue;
                };
                if let Err(e) = ws_tx.send(Message::Text(json.into())).await {
                    tracing::debug!(?e, "ws write failed");
                    break;
                }
            }
            Outbound::Shutdown => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }
        }
    }
}

struct DepartureGuard {
    registry: Arc<Registry>,
    participant_id: String,
}

impl Drop for DepartureGuard {
    fn drop(&mut self) {
        self.registry.leave(&self.participant_id);
    }
}
