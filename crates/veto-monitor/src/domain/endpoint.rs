//! The remote server address a connection targets.
//!
//! [`Endpoint`] is a plain value: the configuration store builds it, the
//! connection hands a clone to each bootstrap thread.

/// Default game server host.
pub const DEFAULT_HOST: &str = "dosowisko.net";
/// Default game server port.
pub const DEFAULT_PORT: u16 = 8889;
/// Default WebSocket path.
pub const DEFAULT_PATH: &str = "/";
/// WebSocket sub-protocol the server speaks.
pub const DEFAULT_PROTOCOL: &str = "veto";
/// Origin header identifying the monitor.
pub const DEFAULT_ORIGIN: &str = "veto-monitor";

/// Host, port and path of the game server, plus handshake headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub path: String,
    /// Value of the `Sec-WebSocket-Protocol` request header, if any.
    pub protocol: Option<String>,
    /// Value of the `Origin` request header, if any.
    pub origin: Option<String>,
}

impl Endpoint {
    /// Creates an endpoint with the default handshake headers.
    pub fn new(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            path: path.into(),
            protocol: Some(DEFAULT_PROTOCOL.to_string()),
            origin: Some(DEFAULT_ORIGIN.to_string()),
        }
    }

    /// Returns the `ws://` URL for this endpoint.
    ///
    /// A path without a leading slash gets one.  An IPv6 literal host is
    /// wrapped in brackets.
    ///
    /// # Example
    ///
    /// ```rust
    /// use veto_monitor::domain::Endpoint;
    ///
    /// let ep = Endpoint::new("localhost", 8889, "game");
    /// assert_eq!(ep.url(), "ws://localhost:8889/game");
    /// ```
    pub fn url(&self) -> String {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        let slash = if self.path.starts_with('/') { "" } else { "/" };
        format!("ws://{host}:{}{slash}{}", self.port, self.path)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT, DEFAULT_PATH)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
