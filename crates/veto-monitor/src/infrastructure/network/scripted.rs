//! Scripted connector and transport for tests.
//!
//! # Why a scripted transport?
//!
//! The real transport needs a game server.  The scripted one replaces the
//! socket with in-memory queues so tests can:
//!
//! - decide whether each handshake succeeds or fails,
//! - hold a handshake open to race it against `disconnect()`,
//! - inject callback reasons (`Established`, `Received`, `Closed`, ...),
//! - inspect every text frame the connection transmitted.
//!
//! # Usage in tests
//!
//! ```ignore
//! let connector = Arc::new(ScriptedConnector::new());
//! let (mut conn, mut events) = Connection::new(Endpoint::default(), connector.clone());
//!
//! conn.connect();
//! // ... pump conn.service() until the handshake is adopted ...
//! connector.probe(0).unwrap().push(TransportEvent::Received("P3".into()));
//! conn.service();
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use tokio_tungstenite::tungstenite;

use crate::domain::Endpoint;
use crate::infrastructure::network::transport::{
    Connector, Transport, TransportError, TransportEvent,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ── Transport probe ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ProbeState {
    queued: VecDeque<TransportEvent>,
    sent: Vec<String>,
    writable_requests: usize,
    closed: bool,
}

/// Test-side handle onto a [`ScriptedTransport`].
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct TransportProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl TransportProbe {
    /// Queues a callback reason for the next poll.
    pub fn push(&self, event: TransportEvent) {
        lock(&self.state).queued.push_back(event);
    }

    /// Every text frame transmitted so far, in order.
    pub fn sent(&self) -> Vec<String> {
        lock(&self.state).sent.clone()
    }

    /// How many times `request_writable` was called.
    pub fn writable_requests(&self) -> usize {
        lock(&self.state).writable_requests
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }
}

/// An in-memory [`Transport`] driven by a [`TransportProbe`].
#[derive(Debug)]
pub struct ScriptedTransport {
    probe: TransportProbe,
}

impl ScriptedTransport {
    pub fn new(probe: TransportProbe) -> Self {
        Self { probe }
    }
}

impl Transport for ScriptedTransport {
    /// Queues a single `Writable`; repeated requests before the next poll
    /// coalesce.
    fn request_writable(&mut self) {
        let mut state = lock(&self.probe.state);
        state.writable_requests += 1;
        if !state.queued.contains(&TransportEvent::Writable) {
            state.queued.push_back(TransportEvent::Writable);
        }
    }

    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        let mut state = lock(&self.probe.state);
        if state.closed {
            return Err(TransportError::ChannelClosed);
        }
        state.sent.push(text.to_owned());
        Ok(())
    }

    fn poll_event(&mut self) -> Option<TransportEvent> {
        lock(&self.probe.state).queued.pop_front()
    }

    fn close(&mut self) {
        lock(&self.probe.state).closed = true;
    }
}

// ── Connector ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ConnectorState {
    attempts: usize,
    refusals: usize,
    probes: Vec<TransportProbe>,
    endpoints: Vec<Endpoint>,
}

/// A [`Connector`] whose handshakes succeed or fail on command.
///
/// Successful handshakes queue `Established` on the new transport unless
/// built with [`ScriptedConnector::manual`].
#[derive(Debug)]
pub struct ScriptedConnector {
    state: Mutex<ConnectorState>,
    held: Mutex<bool>,
    released: Condvar,
    auto_establish: bool,
}

impl Default for ScriptedConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedConnector {
    /// A connector whose transports report `Established` on their first poll.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ConnectorState::default()),
            held: Mutex::new(false),
            released: Condvar::new(),
            auto_establish: true,
        }
    }

    /// A connector whose transports wait for the test to push `Established`.
    pub fn manual() -> Self {
        Self {
            auto_establish: false,
            ..Self::new()
        }
    }

    /// Makes the next `n` handshakes fail.
    pub fn refuse_next(&self, n: usize) {
        lock(&self.state).refusals += n;
    }

    /// Blocks handshakes until [`ScriptedConnector::release`] is called.
    pub fn hold(&self) {
        *lock(&self.held) = true;
    }

    /// Lets held handshakes complete.
    pub fn release(&self) {
        *lock(&self.held) = false;
        self.released.notify_all();
    }

    /// Number of handshakes started so far.
    pub fn attempts(&self) -> usize {
        lock(&self.state).attempts
    }

    /// Probe of the `index`-th successful handshake.
    pub fn probe(&self, index: usize) -> Option<TransportProbe> {
        lock(&self.state).probes.get(index).cloned()
    }

    /// Endpoints passed to each handshake, in order.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        lock(&self.state).endpoints.clone()
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Transport>, TransportError> {
        {
            let mut state = lock(&self.state);
            state.attempts += 1;
            state.endpoints.push(endpoint.clone());
        }

        let mut held = lock(&self.held);
        while *held {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        drop(held);

        let mut state = lock(&self.state);
        if state.refusals > 0 {
            state.refusals -= 1;
            return Err(TransportError::ConnectFailed {
                url: endpoint.url(),
                source: tungstenite::Error::ConnectionClosed,
            });
        }

        let probe = TransportProbe::default();
        if self.auto_establish {
            probe.push(TransportEvent::Established);
        }
        state.probes.push(probe.clone());
        Ok(Box::new(ScriptedTransport::new(probe)))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
