//! Operator commands read from standard input.
//!
//! The monitor has no keyboard handling of its own; whoever runs it types
//! one command per line:
//!
//! | Input            | Command                        |
//! |------------------|--------------------------------|
//! | `c`, `connect`   | [`OperatorCommand::Connect`]   |
//! | `d`, `disconnect`| [`OperatorCommand::Disconnect`]|
//! | `s`, `start`     | [`OperatorCommand::Start`]     |
//! | `v`, `voting`    | [`OperatorCommand::Voting`]    |
//! | `q`, `quit`      | [`OperatorCommand::Quit`]      |
//!
//! A reader thread parses lines and forwards commands over a channel; the
//! main loop drains it with `try_recv`.

use std::io::BufRead;
use std::str::FromStr;
use std::thread;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A command typed by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    Connect,
    Disconnect,
    /// Ask the server to start a session.
    Start,
    /// Ask the server to open voting.
    Voting,
    Quit,
}

/// The line is not a known command.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown command {0:?}")]
pub struct UnknownCommand(pub String);

impl FromStr for OperatorCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "connect" => Ok(Self::Connect),
            "d" | "disconnect" => Ok(Self::Disconnect),
            "s" | "start" => Ok(Self::Start),
            "v" | "voting" => Ok(Self::Voting),
            "q" | "quit" => Ok(Self::Quit),
            _ => Err(UnknownCommand(s.trim().to_string())),
        }
    }
}

/// Reads commands from `input` until EOF, `Quit`, or the receiver is gone.
///
/// Blank lines are skipped; unknown lines are logged and skipped.
pub fn read_commands<R: BufRead>(input: R, commands: &mpsc::UnboundedSender<OperatorCommand>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("failed to read operator input: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<OperatorCommand>() {
            Ok(command) => {
                debug!("operator command {command:?}");
                if commands.send(command).is_err() || command == OperatorCommand::Quit {
                    return;
                }
            }
            Err(e) => warn!("{e}; expected c, d, s, v or q"),
        }
    }
    debug!("operator input closed");
}

/// Spawns a detached thread that reads commands from stdin.
///
/// # Errors
///
/// Returns the I/O error if the thread cannot be created.
pub fn spawn_console_reader(
    commands: mpsc::UnboundedSender<OperatorCommand>,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("veto-console".to_string())
        .spawn(move || read_commands(std::io::stdin().lock(), &commands))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
