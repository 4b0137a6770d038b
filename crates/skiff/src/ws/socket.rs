// File: src/ws/socket.rs
// Purpose: Transport adapter pumping an upgraded axum WebSocket through the multiplexer

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};

use crate::app::App;
use crate::error::{HandlerException, EXCEPTION};

/// Accept a WebSocket upgrade and hand the socket to the multiplexer.
///
/// `path` is the request path of the handshake; it selects the ws route.
pub async fn ws_handler(ws: WebSocketUpgrade, app: Arc<App>, path: String) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app, path))
}

/// Drive one WebSocket connection: register the session, pump inbound
/// frames into the multiplexer, drain the session's outbound queue, and
/// guarantee the close notification on every exit path.
pub async fn handle_socket(socket: WebSocket, app: Arc<App>, path: String) {
    let (outbound_tx, mut outbound_rx) = tokio::sync::mpsc::unbounded_channel::<String>();

    let session = match app
        .ws_multiplexer()
        .handle_open(&path, app.ignore_trailing_slashes(), Some(outbound_tx))
    {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "rejecting websocket connection");
            let mut socket = socket;
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    let (mut sender, mut receiver) = socket.split();

    // Drain the session's outbound queue onto the wire. The queue closing
    // (session.close() or teardown) starts the close handshake.
    let mut send_task = tokio::spawn(async move {
        while let Some(text) = outbound_rx.recv().await {
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    // Feed inbound frames to the multiplexer.
    let recv_app = app.clone();
    let recv_session = session.clone();
    let mut recv_task = tokio::spawn(async move {
        let mux = recv_app.ws_multiplexer();
        while let Some(frame) = receiver.next().await {
            match frame {
                Ok(Message::Text(text)) => mux.handle_message(&recv_session, &text),
                Ok(Message::Close(_)) => break,
                // Binary/ping/pong frames are transport concerns, not
                // dispatch events.
                Ok(_) => continue,
                Err(e) => {
                    mux.handle_error(&recv_session, &HandlerException::new(&EXCEPTION, e));
                    break;
                }
            }
        }
    });

    // Wait for either direction to finish (client disconnect or error).
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    }

    // Idempotent: a no-op if a terminal error already closed the session.
    app.ws_multiplexer()
        .handle_close(&session, 1000, "connection closed");
    tracing::debug!(session = %session.id(), "websocket connection closed");
}
