//! Transport seam for the live channel.
//!
//! The driver only ever sees text frames. [`WsConnector`] provides the
//! tokio-tungstenite implementation; tests plug in their own [`Connector`]
//! to control opens, frames and failures.

use std::future::Future;

use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::Error;

/// Opens transports. One connector serves every attempt of a channel.
pub trait Connector: Send + Sync + 'static {
    type Transport: Transport;

    /// Start a connection attempt. The returned future owns everything it
    /// needs so the driver can drop it to abort the attempt.
    fn connect(&self, url: &Url) -> BoxFuture<'static, Result<Self::Transport, Error>>;
}

/// An open, text-framed connection.
pub trait Transport: Send + 'static {
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), Error>> + Send;

    /// Next text frame. `None` once the peer has closed.
    ///
    /// Must be cancel-safe: the driver polls it inside `select!`.
    fn recv_text(&mut self) -> impl Future<Output = Option<Result<String, Error>>> + Send;

    /// Close the connection. Errors are not reported.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

// ── WebSocket implementation ─────────────────────────────────────────

/// Connects with tokio-tungstenite (`ws://` and `wss://` via rustls).
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    type Transport = WsTransport;

    fn connect(&self, url: &Url) -> BoxFuture<'static, Result<WsTransport, Error>> {
        let url = url.clone();
        Box::pin(async move {
            tracing::info!(url = %url, "connecting to live channel");

            let uri: tungstenite::http::Uri = url.as_str().parse().map_err(
                |e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()),
            )?;

            let (stream, _response) = tokio_tungstenite::connect_async(ClientRequestBuilder::new(uri))
                .await
                .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

            Ok(WsTransport { stream })
        })
    }
}

/// A tungstenite WebSocket stream reduced to text frames.
pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Transport for WsTransport {
    async fn send_text(&mut self, text: String) -> Result<(), Error> {
        self.stream
            .send(Message::text(text))
            .await
            .map_err(|e| Error::WebSocketSend(e.to_string()))
    }

    async fn recv_text(&mut self) -> Option<Result<String, Error>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.to_string())),
                Ok(Message::Close(frame)) => {
                    if let Some(frame) = frame {
                        tracing::info!(
                            code = u16::from(frame.code),
                            reason = %frame.reason,
                            "live channel close frame"
                        );
                    }
                    return None;
                }
                Ok(Message::Ping(_)) => {
                    // tungstenite queues the pong itself
                    tracing::trace!("live channel ping");
                }
                // Binary, Pong, raw frames
                Ok(_) => {}
                Err(e) => return Some(Err(Error::WebSocketRead(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(error = %e, "closing live channel socket");
        }
    }
}
