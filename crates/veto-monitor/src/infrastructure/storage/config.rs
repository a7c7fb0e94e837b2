//! TOML-based configuration for the monitor.
//!
//! ```toml
//! [server]
//! host = "dosowisko.net"
//! port = 8889
//! path = "/"
//! protocol = "veto"
//! origin = "veto-monitor"
//! connect_timeout_secs = 10
//!
//! [monitor]
//! log_level = "info"
//! tick_ms = 16
//! # reconnect_secs = 5
//! ```
//!
//! Every field has a serde default, so a partial file (or none at all) is
//! valid.  Values can also be read and written by `section` / `key` name
//! through [`MonitorConfig::get_option`] and [`MonitorConfig::set_option`],
//! which is what the `--set section.key=value` command-line flag uses.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::endpoint::{
    Endpoint, DEFAULT_HOST, DEFAULT_ORIGIN, DEFAULT_PATH, DEFAULT_PORT, DEFAULT_PROTOCOL,
};
use crate::infrastructure::network::{FixedDelay, NeverReconnect, ReconnectPolicy};

/// Error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// No option with this name exists.
    #[error("unknown config option {section}.{key}")]
    UnknownOption { section: String, key: String },

    /// The option exists but the value does not parse.
    #[error("invalid value {value:?} for {section}.{key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level monitor configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonitorConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub monitor: MonitorSettings,
}

/// Where the game server lives and how to greet it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_path")]
    pub path: String,
    /// `Sec-WebSocket-Protocol` header.  An empty string sends none.
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// `Origin` header.  An empty string sends none.
    #[serde(default = "default_origin")]
    pub origin: String,
    /// Seconds the WebSocket handshake may take before the attempt fails.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// Behaviour of the monitor process itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonitorSettings {
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Main loop frame period in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Seconds to wait before reconnecting after a drop.  Absent means the
    /// operator reconnects by hand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect_secs: Option<u64>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_path() -> String {
    DEFAULT_PATH.to_string()
}
fn default_protocol() -> String {
    DEFAULT_PROTOCOL.to_string()
}
fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_tick_ms() -> u64 {
    16
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path: default_path(),
            protocol: default_protocol(),
            origin: default_origin(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            tick_ms: default_tick_ms(),
            reconnect_secs: None,
        }
    }
}

// ── Derived values ────────────────────────────────────────────────────────────

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

impl MonitorConfig {
    /// The endpoint the connection targets.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            protocol: non_empty(&self.server.protocol),
            origin: non_empty(&self.server.origin),
            ..Endpoint::new(&self.server.host, self.server.port, &self.server.path)
        }
    }

    /// The reconnect policy selected by `monitor.reconnect_secs`.
    pub fn reconnect_policy(&self) -> Box<dyn ReconnectPolicy> {
        match self.monitor.reconnect_secs {
            Some(secs) => Box::new(FixedDelay::new(Duration::from_secs(secs))),
            None => Box::new(NeverReconnect),
        }
    }

    /// Handshake deadline for the connector; at least one second.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.server.connect_timeout_secs.max(1))
    }

    /// Main loop frame period; never zero.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.monitor.tick_ms.max(1))
    }

    // ── String-keyed access ───────────────────────────────────────────────────

    /// Returns the value of `section.key` as text.
    ///
    /// An unset optional value reads as the empty string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownOption`] if no such option exists.
    pub fn get_option(&self, section: &str, key: &str) -> Result<String, ConfigError> {
        let value = match (section, key) {
            ("server", "host") => self.server.host.clone(),
            ("server", "port") => self.server.port.to_string(),
            ("server", "path") => self.server.path.clone(),
            ("server", "protocol") => self.server.protocol.clone(),
            ("server", "origin") => self.server.origin.clone(),
            ("server", "connect_timeout_secs") => self.server.connect_timeout_secs.to_string(),
            ("monitor", "log_level") => self.monitor.log_level.clone(),
            ("monitor", "tick_ms") => self.monitor.tick_ms.to_string(),
            ("monitor", "reconnect_secs") => self
                .monitor
                .reconnect_secs
                .map(|s| s.to_string())
                .unwrap_or_default(),
            _ => return Err(unknown(section, key)),
        };
        Ok(value)
    }

    /// Sets `section.key` from text.
    ///
    /// An empty value clears `monitor.reconnect_secs`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownOption`] if no such option exists and
    /// [`ConfigError::InvalidValue`] if a numeric value does not parse.
    pub fn set_option(&mut self, section: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        match (section, key) {
            ("server", "host") => self.server.host = value.to_string(),
            ("server", "port") => self.server.port = parse(section, key, value)?,
            ("server", "path") => self.server.path = value.to_string(),
            ("server", "protocol") => self.server.protocol = value.to_string(),
            ("server", "origin") => self.server.origin = value.to_string(),
            ("server", "connect_timeout_secs") => {
                self.server.connect_timeout_secs = parse(section, key, value)?
            }
            ("monitor", "log_level") => self.monitor.log_level = value.to_string(),
            ("monitor", "tick_ms") => self.monitor.tick_ms = parse(section, key, value)?,
            ("monitor", "reconnect_secs") => {
                self.monitor.reconnect_secs = if value.is_empty() {
                    None
                } else {
                    Some(parse(section, key, value)?)
                }
            }
            _ => return Err(unknown(section, key)),
        }
        Ok(())
    }

    /// Applies a `section.key=value` assignment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when `assignment` is not of that
    /// shape, plus the errors of [`MonitorConfig::set_option`].
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<(), ConfigError> {
        let malformed = || ConfigError::InvalidValue {
            section: String::new(),
            key: String::new(),
            value: assignment.to_string(),
            reason: "expected section.key=value".to_string(),
        };
        let (name, value) = assignment.split_once('=').ok_or_else(malformed)?;
        let (section, key) = name.trim().split_once('.').ok_or_else(malformed)?;
        self.set_option(section, key, value.trim())
    }
}

fn unknown(section: &str, key: &str) -> ConfigError {
    ConfigError::UnknownOption {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn parse<T>(section: &str, key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Loads [`MonitorConfig`] from `path`, returning the defaults if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<MonitorConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(MonitorConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &MonitorConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DisconnectReason;

    fn scratch_dir(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!(
            "veto_monitor_{name}_{}_{nanos}",
            std::process::id()
        ))
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_default_config_targets_public_server() {
        // Arrange / Act
        let cfg = MonitorConfig::default();

        // Assert
        assert_eq!(cfg.endpoint(), Endpoint::default());
        assert_eq!(cfg.endpoint().url(), "ws://dosowisko.net:8889/");
    }

    #[test]
    fn test_default_monitor_settings() {
        let cfg = MonitorSettings::default();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.tick_ms, 16);
        assert_eq!(cfg.reconnect_secs, None);
    }

    #[test]
    fn test_partial_toml_fills_missing_fields_with_defaults() {
        // Arrange
        let text = "[server]\nhost = \"localhost\"\n";

        // Act
        let cfg: MonitorConfig = toml::from_str(text).unwrap();

        // Assert
        assert_eq!(cfg.server.host, "localhost");
        assert_eq!(cfg.server.port, 8889);
        assert_eq!(cfg.monitor, MonitorSettings::default());
    }

    #[test]
    fn test_empty_protocol_and_origin_send_no_headers() {
        let mut cfg = MonitorConfig::default();
        cfg.server.protocol.clear();
        cfg.server.origin.clear();

        let ep = cfg.endpoint();

        assert_eq!(ep.protocol, None);
        assert_eq!(ep.origin, None);
    }

    #[test]
    fn test_connect_timeout_defaults_and_clamps() {
        // Arrange
        let mut cfg = MonitorConfig::default();
        assert_eq!(cfg.connect_timeout(), Duration::from_secs(10));

        // Act
        cfg.set_option("server", "connect_timeout_secs", "0").unwrap();

        // Assert
        assert_eq!(cfg.get_option("server", "connect_timeout_secs").unwrap(), "0");
        assert_eq!(cfg.connect_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_zero_tick_is_clamped() {
        let mut cfg = MonitorConfig::default();
        cfg.monitor.tick_ms = 0;
        assert_eq!(cfg.tick(), Duration::from_millis(1));
    }

    // ── Reconnect policy ──────────────────────────────────────────────────────

    #[test]
    fn test_no_reconnect_secs_never_reconnects() {
        let mut policy = MonitorConfig::default().reconnect_policy();
        assert_eq!(policy.on_disconnected(DisconnectReason::Closed), None);
    }

    #[test]
    fn test_reconnect_secs_selects_fixed_delay() {
        let mut cfg = MonitorConfig::default();
        cfg.monitor.reconnect_secs = Some(5);

        let mut policy = cfg.reconnect_policy();

        assert_eq!(
            policy.on_disconnected(DisconnectReason::Closed),
            Some(Duration::from_secs(5))
        );
    }

    // ── String-keyed options ──────────────────────────────────────────────────

    #[test]
    fn test_set_then_get_option() {
        // Arrange
        let mut cfg = MonitorConfig::default();

        // Act
        cfg.set_option("server", "port", "9000").unwrap();
        cfg.set_option("monitor", "reconnect_secs", "3").unwrap();

        // Assert
        assert_eq!(cfg.get_option("server", "port").unwrap(), "9000");
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.monitor.reconnect_secs, Some(3));
    }

    #[test]
    fn test_unset_optional_reads_as_empty() {
        let cfg = MonitorConfig::default();
        assert_eq!(cfg.get_option("monitor", "reconnect_secs").unwrap(), "");
    }

    #[test]
    fn test_empty_value_clears_reconnect_secs() {
        let mut cfg = MonitorConfig::default();
        cfg.monitor.reconnect_secs = Some(2);

        cfg.set_option("monitor", "reconnect_secs", "").unwrap();

        assert_eq!(cfg.monitor.reconnect_secs, None);
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let mut cfg = MonitorConfig::default();
        assert!(matches!(
            cfg.set_option("server", "colour", "red"),
            Err(ConfigError::UnknownOption { .. })
        ));
        assert!(matches!(
            cfg.get_option("display", "host"),
            Err(ConfigError::UnknownOption { .. })
        ));
    }

    #[test]
    fn test_unparsable_port_is_invalid_value() {
        let mut cfg = MonitorConfig::default();

        let result = cfg.set_option("server", "port", "99999");

        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        assert_eq!(cfg.server.port, 8889, "failed set must not change the value");
    }

    #[test]
    fn test_apply_assignment_splits_name_and_value() {
        let mut cfg = MonitorConfig::default();

        cfg.apply_assignment("server.path = /game").unwrap();

        assert_eq!(cfg.server.path, "/game");
    }

    #[test]
    fn test_apply_assignment_without_equals_is_invalid() {
        let mut cfg = MonitorConfig::default();
        assert!(matches!(
            cfg.apply_assignment("server.path"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    // ── File persistence ──────────────────────────────────────────────────────

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = scratch_dir("missing").join("config.toml");

        let cfg = load_config(&path).unwrap();

        assert_eq!(cfg, MonitorConfig::default());
    }

    #[test]
    fn test_load_malformed_file_is_parse_error() {
        // Arrange
        let dir = scratch_dir("malformed");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();

        // Act
        let result = load_config(&path);

        // Assert
        assert!(matches!(result, Err(ConfigError::Parse(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_and_load_config_via_temp_dir() {
        // Arrange
        let dir = scratch_dir("save");
        let path = dir.join("nested").join("config.toml");
        let mut cfg = MonitorConfig::default();
        cfg.server.host = "localhost".to_string();
        cfg.monitor.reconnect_secs = Some(10);

        // Act
        save_config(&path, &cfg).unwrap();
        let loaded = load_config(&path).unwrap();

        // Assert
        assert_eq!(loaded, cfg);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
