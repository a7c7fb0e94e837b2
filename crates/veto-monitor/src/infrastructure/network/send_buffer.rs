//! Single-slot outbound buffer.
//!
//! The monitor only ever has one message in flight.  A message waits here
//! until the transport reports it is writable; a newer message replaces an
//! unsent one (last write wins).

/// A one-message mailbox.
///
/// # Examples
///
/// ```rust
/// use veto_monitor::infrastructure::network::SendBuffer;
///
/// let mut buf = SendBuffer::default();
/// assert_eq!(buf.put("first".into()), None);
/// assert_eq!(buf.put("second".into()), Some("first".to_string()));
/// assert_eq!(buf.take().as_deref(), Some("second"));
/// assert!(buf.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct SendBuffer {
    pending: Option<String>,
}

impl SendBuffer {
    /// Stores `message`, returning the unsent message it displaced.
    pub fn put(&mut self, message: String) -> Option<String> {
        self.pending.replace(message)
    }

    /// Removes and returns the pending message.
    pub fn take(&mut self) -> Option<String> {
        self.pending.take()
    }

    /// Returns the pending message without removing it.
    pub fn peek(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
