//! WebSocket transport built on `tokio-tungstenite`.
//!
//! # Threading model
//!
//! The main loop is synchronous, the socket is async.  [`WsConnector`] holds
//! a handle to the process's tokio runtime:
//!
//! 1. The bootstrap thread calls [`WsConnector::connect`], which blocks on
//!    `connect_async` through the handle, bounded by the connect timeout.
//! 2. On success a session task is spawned on the runtime.  It owns the
//!    socket and shuttles frames between it and two unbounded channels.
//! 3. The returned [`WsTransport`] is the synchronous end of those channels;
//!    `poll_event` is a `try_recv`.
//!
//! Dropping or closing the transport drops its outbound sender, which makes
//! the session task send a close frame and exit.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::domain::Endpoint;
use crate::infrastructure::network::transport::{
    Connector, Transport, TransportError, TransportEvent,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ── Connector ─────────────────────────────────────────────────────────────────

/// Handshake deadline used unless [`WsConnector::with_connect_timeout`]
/// sets another.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connects to the game server over plain `ws://`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    runtime: Handle,
    connect_timeout: Duration,
}

impl WsConnector {
    /// Creates a connector whose sessions run on `runtime`.
    ///
    /// [`Connector::connect`] blocks on this runtime, so it must be called
    /// from a thread that is not itself a runtime worker.  The runtime needs
    /// its time driver enabled.
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Fails a handshake that has not completed after `connect_timeout`.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

/// Builds the upgrade request for `endpoint`, including the sub-protocol and
/// origin headers.
///
/// # Errors
///
/// Returns [`TransportError::InvalidEndpoint`] if the URL or a header value
/// is malformed.
pub fn build_request(endpoint: &Endpoint) -> Result<Request, TransportError> {
    let url = endpoint.url();
    let invalid = |reason: String| TransportError::InvalidEndpoint {
        url: url.clone(),
        reason,
    };

    let mut request = url
        .as_str()
        .into_client_request()
        .map_err(|e| invalid(e.to_string()))?;

    if let Some(protocol) = &endpoint.protocol {
        let value = HeaderValue::from_str(protocol).map_err(|e| invalid(e.to_string()))?;
        request
            .headers_mut()
            .insert(header::SEC_WEBSOCKET_PROTOCOL, value);
    }
    if let Some(origin) = &endpoint.origin {
        let value = HeaderValue::from_str(origin).map_err(|e| invalid(e.to_string()))?;
        request.headers_mut().insert(header::ORIGIN, value);
    }
    Ok(request)
}

impl Connector for WsConnector {
    fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Transport>, TransportError> {
        let url = endpoint.url();
        let request = build_request(endpoint)?;

        let handshake = self
            .runtime
            // The timer is created inside the runtime, not on this thread.
            .block_on(async { timeout(self.connect_timeout, connect_async(request)).await })
            .map_err(|_| TransportError::Timeout {
                url: url.clone(),
                after: self.connect_timeout,
            })?;
        let (stream, response) = handshake.map_err(|source| TransportError::ConnectFailed {
            url: url.clone(),
            source,
        })?;
        debug!("handshake with {url} answered {}", response.status());

        Ok(Box::new(WsTransport::start(&self.runtime, stream)))
    }
}

// ── Transport ─────────────────────────────────────────────────────────────────

/// Synchronous handle onto a WebSocket session task.
#[derive(Debug)]
pub struct WsTransport {
    /// `None` after [`Transport::close`].
    outbound: Option<mpsc::UnboundedSender<String>>,
    inbound: mpsc::UnboundedReceiver<TransportEvent>,
    writable_requested: bool,
}

impl WsTransport {
    /// Spawns the session task for an upgraded `stream`.
    ///
    /// `Established` is queued before the task starts, so it is always the
    /// first event polled.
    fn start(runtime: &Handle, stream: WsStream) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        // The receiver is held below, so this cannot fail.
        let _ = inbound_tx.send(TransportEvent::Established);
        runtime.spawn(run_session(stream, outbound_rx, inbound_tx));

        Self {
            outbound: Some(outbound_tx),
            inbound: inbound_rx,
            writable_requested: false,
        }
    }
}

impl Transport for WsTransport {
    fn request_writable(&mut self) {
        self.writable_requested = true;
    }

    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        let outbound = self.outbound.as_ref().ok_or(TransportError::ChannelClosed)?;
        outbound
            .send(text.to_owned())
            .map_err(|_| TransportError::ChannelClosed)
    }

    /// Inbound events first, then a pending writable request.
    fn poll_event(&mut self) -> Option<TransportEvent> {
        if let Ok(event) = self.inbound.try_recv() {
            return Some(event);
        }
        if self.writable_requested && self.outbound.is_some() {
            self.writable_requested = false;
            return Some(TransportEvent::Writable);
        }
        None
    }

    fn close(&mut self) {
        if self.outbound.take().is_some() {
            debug!("closing websocket session");
        }
        self.writable_requested = false;
    }
}

// ── Session task ──────────────────────────────────────────────────────────────

/// Pumps frames between the socket and the transport's channels until either
/// side goes away.
async fn run_session(
    stream: WsStream,
    mut outbound: mpsc::UnboundedReceiver<String>,
    inbound: mpsc::UnboundedSender<TransportEvent>,
) {
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let _ = inbound.send(TransportEvent::Received(text));
                }
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => {
                        let _ = inbound.send(TransportEvent::Received(text));
                    }
                    Err(e) => warn!("dropping non-UTF-8 binary frame: {e}"),
                },
                Some(Ok(Message::Close(frame))) => {
                    info!("server closed the connection: {frame:?}");
                    let _ = inbound.send(TransportEvent::Closed);
                    break;
                }
                // Ping/pong are answered by tungstenite itself.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let _ = inbound.send(TransportEvent::Error(e.to_string()));
                    break;
                }
                None => {
                    let _ = inbound.send(TransportEvent::Closed);
                    break;
                }
            },
            text = outbound.recv() => match text {
                Some(text) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        let _ = inbound.send(TransportEvent::Error(e.to_string()));
                        break;
                    }
                }
                None => {
                    if let Err(e) = write.close().await {
                        debug!("close handshake failed: {e}");
                    }
                    break;
                }
            },
        }
    }
    debug!("websocket session ended");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
