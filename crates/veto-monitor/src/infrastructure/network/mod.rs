//! Network infrastructure for the monitor.
//!
//! Architecture:
//! - [`Connection`] owns the lifecycle of one outbound connection
//!   (`Disconnected → Connecting → Connected → Disconnected`).
//! - `connect()` hands the blocking handshake to a bootstrap thread
//!   ([`bootstrap`]); the resulting transport comes back over a channel.
//! - [`Connection::service`] is the event bridge: called once per frame, it
//!   adopts finished handshakes, polls the transport and turns its callbacks
//!   into [`MonitorEvent`](crate::domain::MonitorEvent)s.
//! - Outbound messages wait in a single-slot [`SendBuffer`] until the
//!   transport reports it is writable.

pub mod bootstrap;
pub mod bridge;
pub mod connection;
pub mod reconnect;
pub mod scripted;
pub mod send_buffer;
pub mod transport;
pub mod ws_transport;

pub use bridge::CallbackOutcome;
pub use connection::Connection;
pub use reconnect::{FixedDelay, NeverReconnect, ReconnectPolicy};
pub use send_buffer::SendBuffer;
pub use transport::{Connector, Transport, TransportError, TransportEvent};
pub use ws_transport::{WsConnector, WsTransport};
