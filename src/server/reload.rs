// src/server/reload.rs

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use crate::server::ServerState;

/// Websocket endpoint the injected client connects to.
pub const RELOAD_PATH: &str = "/__assetflow/reload";

/// Client side of the live-reload channel, injected before `</body>`.
pub const RELOAD_SCRIPT: &str = concat!(
    "<script>(function(){",
    "var p=location.protocol==='https:'?'wss://':'ws://';",
    "var s=new WebSocket(p+location.host+'/__assetflow/reload');",
    "s.onmessage=function(){location.reload();};",
    "})();</script>"
);

pub(crate) async fn reload_socket(
    ws: WebSocketUpgrade,
    State(state): State<ServerState>,
) -> Response {
    let rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| reload_client(socket, rx))
}

async fn reload_client(mut socket: WebSocket, mut rx: broadcast::Receiver<()>) {
    debug!("reload client connected");
    loop {
        tokio::select! {
            signal = rx.recv() => match signal {
                // A lagged receiver still owes the client one reload.
                Ok(()) | Err(RecvError::Lagged(_)) => {
                    if socket.send(Message::Text("reload".into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!("reload client disconnected");
}
