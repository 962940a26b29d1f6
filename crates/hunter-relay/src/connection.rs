//! Per-connection handler: register with the hub, then pump frames both ways.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use hunter_common::ConnectionId;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::hub::{HubHandle, CHANNEL_CAPACITY};

/// Handle a single WebSocket connection until either side closes it.
pub async fn handle_connection(ws: WebSocketStream<TcpStream>, addr: SocketAddr, hub: HubHandle) {
    let (mut sink, mut stream) = ws.split();
    let conn = ConnectionId::new();

    // 1. Create our outbound queue and register it.
    let (tx, mut rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
    if !hub.connected(conn.clone(), tx).await {
        tracing::warn!(peer = %addr, "Hub unavailable, dropping connection");
        return;
    }

    tracing::info!(peer = %addr, conn = %conn.short(), "Client connected");

    // 2. Forwarding loop.
    loop {
        tokio::select! {
            // Messages queued by the hub → this client's WebSocket
            Some(msg) = rx.recv() => {
                if sink.send(Message::Text(msg.into())).await.is_err() {
                    break;
                }
            }

            // Frames from this client → hub, one at a time in arrival order
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if !hub.frame(conn.clone(), text.to_string()).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        tracing::debug!(conn = %conn.short(), "Ignoring binary frame");
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    // 3. Cleanup.
    tracing::info!(peer = %addr, conn = %conn.short(), "Client disconnected");
    hub.disconnected(conn).await;
}
