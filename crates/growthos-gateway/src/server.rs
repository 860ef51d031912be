//! TCP accept loop.

use std::net::SocketAddr;

use growthos_config::ServerSection;
use growthos_engine::CommandGateway;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::connection::{self, ConnectionSettings};
use crate::error::GatewayResult;

/// Listener serving observers over `WebSocket`.
#[derive(Debug)]
pub struct WsServer {
    listener: TcpListener,
    gateway: CommandGateway,
    settings: ConnectionSettings,
}

impl WsServer {
    /// Bind to `server.bind`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GatewayError::Io`] if the address cannot be bound.
    pub async fn bind(server: &ServerSection, gateway: CommandGateway) -> GatewayResult<Self> {
        let listener = TcpListener::bind(server.bind.as_str()).await?;
        Ok(Self {
            listener,
            gateway,
            settings: ConnectionSettings {
                ws_path: server.ws_path.clone(),
                observer_buffer: server.observer_buffer,
            },
        })
    }

    /// Address actually bound, useful with port 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket has no local address.
    pub fn local_addr(&self) -> GatewayResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` fires or its sender is dropped.
    ///
    /// Each connection runs on its own task. Accept errors are logged and
    /// the loop continues.
    ///
    /// # Errors
    ///
    /// Currently never fails once bound.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> GatewayResult<()> {
        let addr = self.local_addr()?;
        info!(%addr, path = %self.settings.ws_path, "WebSocket server listening");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    info!("WebSocket server received shutdown signal");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let gateway = self.gateway.clone();
                        let settings = self.settings.clone();
                        let span = info_span!("connection", %peer);
                        tokio::spawn(
                            async move {
                                if let Err(e) = connection::serve(stream, peer, gateway, settings).await {
                                    debug!(error = %e, "Connection ended with error");
                                }
                            }
                            .instrument(span),
                        );
                    },
                    Err(e) => {
                        warn!(error = %e, "Failed to accept connection");
                    },
                },
            }
        }
        Ok(())
    }
}
