//! Transport capability used by the connection.
//!
//! The connection never touches a socket directly.  It talks to a
//! [`Transport`] (an established connection) obtained from a [`Connector`]
//! (something that can perform a handshake).  The production implementation
//! is in [`super::ws_transport`]; tests use [`super::scripted`].
//!
//! The transport is poll based: [`Transport::poll_event`] returns the next
//! callback reason without blocking, the same way a C WebSocket library
//! invokes its callback from a zero-timeout service call.

use std::time::Duration;

use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::domain::Endpoint;

/// Errors raised by a transport or connector.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint could not be turned into a WebSocket request.
    #[error("invalid endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// The WebSocket handshake failed (refused, reset, rejected upgrade).
    #[error("failed to connect to {url}: {source}")]
    ConnectFailed {
        url: String,
        #[source]
        source: tungstenite::Error,
    },

    /// The server accepted the TCP connection but did not finish the
    /// WebSocket handshake in time.
    #[error("handshake with {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    /// The session behind this transport has already ended.
    #[error("transport channel closed")]
    ChannelClosed,
}

/// A callback reason reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The handshake completed; the connection is usable.
    Established,
    /// The transport can accept one outbound message.
    Writable,
    /// A complete inbound text frame.
    Received(String),
    /// The connection closed.
    Closed,
    /// The connection failed.
    Error(String),
}

/// An established (or establishing) connection.
pub trait Transport: Send {
    /// Asks for a [`TransportEvent::Writable`] on a later poll.
    fn request_writable(&mut self);

    /// Queues `text` as one outbound text frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ChannelClosed`] if the session has ended.
    fn send_text(&mut self, text: &str) -> Result<(), TransportError>;

    /// Returns the next pending callback reason without blocking.
    fn poll_event(&mut self) -> Option<TransportEvent>;

    /// Tears the connection down.  Later polls may still return buffered
    /// events; the connection ignores them.
    fn close(&mut self);
}

/// Performs the (blocking) connection handshake.
///
/// Called only from the bootstrap thread, never from the main loop.
#[cfg_attr(test, mockall::automock)]
pub trait Connector: Send + Sync {
    /// Connects to `endpoint` and returns the live transport.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the endpoint is invalid or the
    /// handshake fails.
    fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Transport>, TransportError>;
}
