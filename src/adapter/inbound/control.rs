//! Gateway control channel client.
//!
//! One websocket connection to `/launcher` per process lifetime. Requests
//! are decoded here and forwarded as [`ControlCall`]s; the dispatcher on the
//! other end of the queue handles them one at a time, so a slow request
//! holds back the next one.
//!
//! # Lifecycle
//!
//! 1. Connect (TLS when the gateway publishes `https`)
//! 2. Forward text frames, answer pings
//! 3. On shutdown, send a close frame and wait briefly for the peer's close
//!
//! Read errors end the loop without failing the caller.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rustls::ClientConfig;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::adapter::outbound::tls::insecure_client_config;
use crate::domain::GatewayRpc;
use crate::error::{Error, Result};
use crate::port::inbound::{ControlCall, ControlRequest, ControlResponse};

type ControlStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long to wait for the gateway to acknowledge our close frame.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

pub struct ControlChannel {
    url: String,
    tls: Option<Arc<ClientConfig>>,
}

impl ControlChannel {
    /// Channel to the control endpoint published by `gateway`.
    pub fn new(gateway: &GatewayRpc) -> Result<Self> {
        let url = Url::parse(&gateway.control_url())?;
        let tls = match url.scheme() {
            "wss" => Some(insecure_client_config()?),
            _ => None,
        };
        Ok(Self {
            url: url.into(),
            tls,
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn connect(&self) -> Result<ControlStream> {
        info!(url = %self.url, "Connecting control channel");
        let connector = self.tls.clone().map(Connector::Rustls);
        let (ws, response) =
            connect_async_tls_with_config(self.url.as_str(), None, false, connector).await?;
        debug!(status = %response.status(), "Control channel connected");
        Ok(ws)
    }

    /// Connect and serve until the peer closes, a read fails or `shutdown`
    /// flips to `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established, a response
    /// cannot be written or the dispatcher has gone away.
    pub async fn run(
        self,
        calls: mpsc::Sender<ControlCall>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut ws = self.connect().await?;

        loop {
            if *shutdown.borrow() {
                return close(&mut ws).await;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        return close(&mut ws).await;
                    }
                }
                frame = ws.next() => match frame {
                    None => {
                        debug!("Control channel ended");
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Control channel read failed");
                        return Ok(());
                    }
                    Some(Ok(Message::Text(text))) => {
                        trace!(bytes = text.len(), "Control frame");
                        if let Some(response) = forward(&calls, &text).await? {
                            let json = serde_json::to_string(&response)?;
                            ws.send(Message::Text(json)).await?;
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        ws.send(Message::Pong(payload)).await?;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!(?frame, "Gateway closed control channel");
                        return Ok(());
                    }
                    Some(Ok(_)) => {}
                },
            }
        }
    }

    pub fn spawn(
        self,
        calls: mpsc::Sender<ControlCall>,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run(calls, shutdown))
    }
}

/// Decode one request and wait for the dispatcher's reply.
async fn forward(calls: &mpsc::Sender<ControlCall>, text: &str) -> Result<Option<ControlResponse>> {
    let request: ControlRequest = match serde_json::from_str(text) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, bytes = text.len(), "Ignoring malformed control request");
            return Ok(None);
        }
    };
    debug!(id = request.id, method = %request.method, "Control request");

    let (reply, response) = oneshot::channel();
    calls
        .send(ControlCall { request, reply })
        .await
        .map_err(|_| Error::Connection("control dispatcher stopped".to_string()))?;
    Ok(response.await.ok().flatten())
}

async fn close(ws: &mut ControlStream) -> Result<()> {
    info!("Closing control channel");
    let frame = CloseFrame {
        code: CloseCode::Normal,
        reason: "".into(),
    };
    if let Err(e) = ws.close(Some(frame)).await {
        debug!(error = %e, "Close frame not sent");
        return Ok(());
    }
    let acknowledged = tokio::time::timeout(CLOSE_GRACE, async {
        while let Some(Ok(message)) = ws.next().await {
            if message.is_close() {
                break;
            }
        }
    })
    .await;
    if acknowledged.is_err() {
        debug!("Gateway did not acknowledge close");
    }
    Ok(())
}
