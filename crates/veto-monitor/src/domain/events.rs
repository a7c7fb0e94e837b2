//! Events pushed onto the host event queue.
//!
//! The connection produces two kinds of events and interleaves them in a
//! single FIFO queue:
//!
//! - [`LifecycleEvent`] describes the connection itself.
//! - [`VetoEvent`] is a decoded server broadcast.
//!
//! Events own their data.  A player name moves from the decoded line into the
//! event and is dropped when the consumer is done with it.

use veto_core::VetoEvent;

/// State of the single server connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection and no attempt in flight.
    #[default]
    Disconnected,
    /// A handshake is in flight on the bootstrap thread, or has completed but
    /// the transport has not reported `Established` yet.
    Connecting,
    /// The transport accepted the connection.
    Connected,
}

/// Why the connection returned to [`ConnectionState::Disconnected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// An established connection was closed or dropped by the transport.
    Closed,
    /// The attempt failed before the connection was established.
    ConnectFailed,
    /// The application called `disconnect()`.
    Requested,
}

impl DisconnectReason {
    /// Returns `true` when the connection had been established before it ended.
    pub fn was_established(self) -> bool {
        matches!(self, DisconnectReason::Closed)
    }
}

/// Connection lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Connecting,
    Connected,
    Disconnected(DisconnectReason),
}

/// One entry of the host event queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// The connection changed state.
    Lifecycle(LifecycleEvent),
    /// The server broadcast a game message.
    Game(VetoEvent),
}

impl From<LifecycleEvent> for MonitorEvent {
    fn from(event: LifecycleEvent) -> Self {
        MonitorEvent::Lifecycle(event)
    }
}

impl From<VetoEvent> for MonitorEvent {
    fn from(event: VetoEvent) -> Self {
        MonitorEvent::Game(event)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
