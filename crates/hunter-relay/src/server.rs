//! Accept loop: TCP → WebSocket handshake → per-connection task.

use std::future::Future;

use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;

use crate::config::RelayConfig;
use crate::connection::handle_connection;
use crate::dispatcher::Dispatcher;
use crate::hub::{Hub, HubHandle};

/// Bind, start the hub, and serve until Ctrl-C.
pub async fn run(config: RelayConfig) -> hunter_common::Result<()> {
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        target_level = config.room.target_level,
        countdown_ms = config.countdown.as_millis() as u64,
        "hunter-relay listening"
    );

    let (hub, hub_task) = Hub::spawn(Dispatcher::new(config.room, config.countdown));
    serve(listener, hub, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown requested");
    })
    .await;

    let _ = hub_task.await;
    Ok(())
}

/// Accept connections on `listener` until `shutdown` resolves, then stop the hub.
pub async fn serve<F>(listener: TcpListener, hub: HubHandle, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let hub = hub.clone();
                    tokio::spawn(async move {
                        match accept_async(stream).await {
                            Ok(ws) => handle_connection(ws, addr, hub).await,
                            Err(e) => {
                                tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
                            }
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "TCP accept error");
                }
            },
        }
    }

    hub.shutdown().await;
}
