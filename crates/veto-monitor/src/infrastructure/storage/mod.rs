//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration file, applies
//! string-keyed overrides and writes changes back to disk.  Missing files and
//! missing fields fall back to defaults, so the monitor runs with no
//! configuration at all.

pub mod config;
