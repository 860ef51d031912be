//! One observer connection.
//!
//! The handshake is accepted only on the configured path. Once upgraded the
//! connection registers a [`ChannelObserver`] with the session registry,
//! forwards its queue to the socket from a writer task, and feeds inbound
//! text frames to the [`CommandGateway`].

use std::net::SocketAddr;
use std::sync::Arc;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use growthos_engine::{CommandGateway, CommandOutcome, IgnoreReason};
use growthos_events::{ChannelObserver, FunnelEvent};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::{WebSocketStream, accept_hdr_async};
use tracing::{debug, info, warn};

use crate::error::GatewayResult;

type WsStream = WebSocketStream<TcpStream>;

/// Per-connection settings taken from the `[server]` section.
#[derive(Debug, Clone)]
pub(crate) struct ConnectionSettings {
    pub(crate) ws_path: String,
    pub(crate) observer_buffer: usize,
}

/// Serve one accepted TCP stream until either side closes.
pub(crate) async fn serve(
    stream: TcpStream,
    peer: SocketAddr,
    gateway: CommandGateway,
    settings: ConnectionSettings,
) -> GatewayResult<()> {
    let path = settings.ws_path.clone();
    let ws = accept_hdr_async(stream, move |request: &Request, response: Response| {
        if request.uri().path() == path {
            Ok(response)
        } else {
            let mut rejection = ErrorResponse::new(Some("not found".to_owned()));
            *rejection.status_mut() = StatusCode::NOT_FOUND;
            Err(rejection)
        }
    })
    .await?;

    let (writer, mut reader) = ws.split();
    let (observer, queue) = ChannelObserver::new(peer.to_string(), settings.observer_buffer);
    let registry = Arc::clone(gateway.context().bus().registry());
    let observer_id = registry.register(Arc::new(observer));
    info!(%peer, %observer_id, "Observer connected");

    let mut writer_task = tokio::spawn(forward_events(writer, queue));

    let result = tokio::select! {
        result = read_commands(&mut reader, &gateway) => result,
        _ = &mut writer_task => Ok(()),
    };

    registry.unregister(observer_id);
    writer_task.abort();
    info!(%peer, %observer_id, "Observer disconnected");
    result
}

/// Drain the observer queue onto the socket as JSON text frames.
async fn forward_events(
    mut writer: SplitSink<WsStream, Message>,
    mut queue: mpsc::Receiver<Arc<FunnelEvent>>,
) {
    while let Some(event) = queue.recv().await {
        let json = match serde_json::to_string(event.as_ref()) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, event_type = event.event_type(), "Failed to encode event");
                continue;
            },
        };
        if let Err(e) = writer.send(Message::Text(json.into())).await {
            debug!(error = %e, "Write failed, closing observer");
            return;
        }
    }
    let _ = writer.close().await;
}

/// Dispatch inbound frames until the peer closes.
async fn read_commands(
    reader: &mut SplitStream<WsStream>,
    gateway: &CommandGateway,
) -> GatewayResult<()> {
    while let Some(frame) = reader.next().await {
        match frame? {
            Message::Text(text) => match gateway.handle_text(text.as_str()).await {
                CommandOutcome::Ignored(IgnoreReason::Invalid(e)) => {
                    warn!(error = %e, "Ignoring malformed frame");
                },
                outcome => debug!(?outcome, "Command handled"),
            },
            Message::Close(_) => break,
            Message::Binary(_) => debug!("Ignoring binary frame"),
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {
                // Ping/pong handled by tungstenite.
            },
        }
    }
    Ok(())
}
