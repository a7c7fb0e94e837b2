//! The connection state machine.
//!
//! ```text
//!            connect()                 Established
//! Disconnected ──────────▶ Connecting ─────────────▶ Connected
//!      ▲                       │                         │
//!      └───────────────────────┴─────────────────────────┘
//!          Closed / Error / handshake failure / disconnect()
//! ```
//!
//! No other transition exists.  Every transition pushes a
//! [`LifecycleEvent`] onto the host event queue returned by
//! [`Connection::new`].
//!
//! All methods run on the thread that owns the `Connection`.  The only work
//! done elsewhere is the handshake, which reports back through the bootstrap
//! channel (see [`super::bootstrap`]).

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use veto_core::MonitorCommand;

use crate::domain::{ConnectionState, DisconnectReason, Endpoint, LifecycleEvent, MonitorEvent};
use crate::infrastructure::network::bootstrap::{spawn_bootstrap, BootstrapOutcome};
use crate::infrastructure::network::reconnect::{NeverReconnect, ReconnectPolicy};
use crate::infrastructure::network::send_buffer::SendBuffer;
use crate::infrastructure::network::transport::{Connector, Transport};

/// The monitor's single connection to the game server.
pub struct Connection {
    endpoint: Endpoint,
    connector: Arc<dyn Connector>,
    pub(crate) state: ConnectionState,
    /// `Some` only while `state` is `Connecting` or `Connected`.
    pub(crate) transport: Option<Box<dyn Transport>>,
    pub(crate) outbound: SendBuffer,
    /// Connect cycle counter; bootstrap outcomes from older cycles are stale.
    pub(crate) generation: u64,
    bootstraps_spawned: u64,
    bootstrap_tx: mpsc::UnboundedSender<BootstrapOutcome>,
    pub(crate) bootstrap_rx: mpsc::UnboundedReceiver<BootstrapOutcome>,
    events: mpsc::UnboundedSender<MonitorEvent>,
    policy: Box<dyn ReconnectPolicy>,
    pub(crate) reconnect_at: Option<Instant>,
}

impl Connection {
    /// Creates a disconnected connection and the receiver of its event queue.
    ///
    /// Lifecycle and game events are delivered on the receiver in the order
    /// they happened.
    pub fn new(
        endpoint: Endpoint,
        connector: Arc<dyn Connector>,
    ) -> (Self, mpsc::UnboundedReceiver<MonitorEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (bootstrap_tx, bootstrap_rx) = mpsc::unbounded_channel();
        let conn = Self {
            endpoint,
            connector,
            state: ConnectionState::Disconnected,
            transport: None,
            outbound: SendBuffer::default(),
            generation: 0,
            bootstraps_spawned: 0,
            bootstrap_tx,
            bootstrap_rx,
            events,
            policy: Box::new(NeverReconnect),
            reconnect_at: None,
        };
        (conn, events_rx)
    }

    /// Replaces the reconnect policy (default: [`NeverReconnect`]).
    pub fn with_reconnect_policy(mut self, policy: Box<dyn ReconnectPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Whether a transport handle is currently held.
    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    /// The message waiting for the next writable callback, if any.
    pub fn pending_outbound(&self) -> Option<&str> {
        self.outbound.peek()
    }

    /// Number of bootstrap threads started over the connection's lifetime.
    pub fn bootstraps_spawned(&self) -> u64 {
        self.bootstraps_spawned
    }

    /// When the reconnect policy scheduled the next attempt, if it did.
    pub fn reconnect_scheduled_at(&self) -> Option<Instant> {
        self.reconnect_at
    }

    // ── Operations ────────────────────────────────────────────────────────────

    /// Starts connecting to the endpoint.
    ///
    /// Returns immediately: the handshake runs on a bootstrap thread and its
    /// result is picked up by [`Connection::service`].  Does nothing unless
    /// the connection is `Disconnected`, so at most one handshake is ever in
    /// flight.
    pub fn connect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            debug!("connect ignored: connection is {:?}", self.state);
            return;
        }

        self.generation += 1;
        self.reconnect_at = None;
        self.state = ConnectionState::Connecting;
        info!("connecting to {}", self.endpoint.url());
        self.emit(LifecycleEvent::Connecting);

        match spawn_bootstrap(
            Arc::clone(&self.connector),
            self.endpoint.clone(),
            self.generation,
            self.bootstrap_tx.clone(),
        ) {
            Ok(()) => self.bootstraps_spawned += 1,
            Err(e) => {
                error!("{e}");
                self.on_closed_or_failed();
            }
        }
    }

    /// Tears the connection down immediately.
    ///
    /// Raises `Disconnected(Requested)`.  A handshake still running on the
    /// bootstrap thread is discarded when it reports back.  When already
    /// disconnected it only cancels a scheduled reconnect and raises nothing.
    pub fn disconnect(&mut self) {
        if self.state == ConnectionState::Disconnected {
            if self.reconnect_at.take().is_some() {
                info!("scheduled reconnect cancelled");
            } else {
                debug!("disconnect ignored: not connected");
            }
            return;
        }

        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        if let Some(dropped) = self.outbound.take() {
            debug!("discarding unsent message {dropped:?}");
        }
        self.state = ConnectionState::Disconnected;
        self.reconnect_at = None;
        info!("disconnected from {} on request", self.endpoint.url());
        self.emit(LifecycleEvent::Disconnected(DisconnectReason::Requested));
    }

    /// Queues `message` for transmission on the next writable callback.
    ///
    /// Only valid while connected; otherwise the message is logged and
    /// dropped.  An unsent earlier message is replaced.
    pub fn send(&mut self, message: impl Into<String>) {
        let message = message.into();

        let transport = match (&self.state, self.transport.as_mut()) {
            (ConnectionState::Connected, Some(transport)) => transport,
            _ => {
                warn!("send ignored, no connection: {message:?}");
                return;
            }
        };

        if let Some(dropped) = self.outbound.put(message) {
            warn!("send buffer overwritten; dropping unsent {dropped:?}");
        }
        transport.request_writable();
    }

    /// Serializes `command` and queues it like [`Connection::send`].
    pub fn send_command(&mut self, command: MonitorCommand) {
        match command.to_wire() {
            Ok(text) => self.send(text),
            Err(e) => error!("{e}"),
        }
    }

    // ── Transitions used by the event bridge ──────────────────────────────────

    /// `Connecting → Connected`.
    pub(crate) fn on_established(&mut self) {
        if self.state != ConnectionState::Connecting {
            debug!("ignoring Established while {:?}", self.state);
            return;
        }
        self.state = ConnectionState::Connected;
        info!("connected to {}", self.endpoint.url());
        self.emit(LifecycleEvent::Connected);
    }

    /// `Connecting | Connected → Disconnected`.
    ///
    /// The reason depends on how far the connection got.
    pub(crate) fn on_closed_or_failed(&mut self) {
        let reason = match self.state {
            ConnectionState::Connected => DisconnectReason::Closed,
            ConnectionState::Connecting => DisconnectReason::ConnectFailed,
            ConnectionState::Disconnected => return,
        };

        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        if let Some(dropped) = self.outbound.take() {
            debug!("discarding unsent message {dropped:?}");
        }
        self.state = ConnectionState::Disconnected;

        match reason {
            DisconnectReason::Closed => info!("disconnected from {}", self.endpoint.url()),
            _ => warn!("connection to {} failed", self.endpoint.url()),
        }
        self.emit(LifecycleEvent::Disconnected(reason));

        if let Some(delay) = self.policy.on_disconnected(reason) {
            info!("reconnecting in {delay:?}");
            self.reconnect_at = Some(Instant::now() + delay);
        }
    }

    pub(crate) fn emit(&self, event: impl Into<MonitorEvent>) {
        if self.events.send(event.into()).is_err() {
            debug!("event queue receiver dropped; event discarded");
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
