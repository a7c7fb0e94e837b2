//! Message types for the Veto monitor protocol.
//!
//! # Message flow
//!
//! ```text
//! Server → Monitor: text line  →  decode_line  →  VetoEvent
//! Monitor → Server: MonitorCommand  →  JSON text frame
//! ```
//!
//! The two directions use different encodings.  The server broadcasts
//! compact tagged lines (one character + payload) while the monitor sends
//! small JSON objects with a `"type"` discriminant, for example
//! `{"type":"monitor"}`.

use serde::{Deserialize, Serialize};

use crate::protocol::ProtocolError;

// ── Tags ──────────────────────────────────────────────────────────────────────

/// Tag bytes of the inbound line protocol.
///
/// The tag is always the first character of a line.  Tags are case sensitive:
/// `V` opens voting while `v` announces a veto.
pub mod tags {
    pub const SESSION_START: char = 'S';
    pub const VOTING_OPENED: char = 'V';
    pub const COUNTER_TICK: char = 'C';
    pub const VOTES_FOR: char = 'F';
    pub const VOTES_AGAINST: char = 'A';
    pub const VOTES_ABSTAINED: char = 'N';
    pub const VOTE_RESULT: char = 'E';
    pub const VETO_CAST: char = 'v';
    pub const PLAYER_COUNT: char = 'P';
    pub const PLAYER_JOINED: char = 'J';
    pub const PLAYER_LEFT: char = 'L';
    pub const PLAYER_RECONNECTED: char = 'R';
    pub const WINNER_ANNOUNCED: char = 'W';
    pub const SESSION_ENDED: char = 'T';
}

/// The payload character of an `E` line that means the bill passed.
pub const RESULT_PASSED: char = 'F';

// ── Server → Monitor ──────────────────────────────────────────────────────────

/// A decoded server broadcast.
///
/// Each variant corresponds to one tag of the line protocol.  String fields
/// are owned: the event is moved into the host event queue and the consumer
/// drops it when done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VetoEvent {
    /// `S` – a game session (re)started.
    SessionStart,
    /// `V` – a voting round opened.
    VotingOpened,
    /// `C{n}` – seconds left in the current voting round.
    CounterTick(i32),
    /// `F{n}` – number of players who voted for the bill.
    VotesFor(i32),
    /// `A{n}` – number of players who voted against the bill.
    VotesAgainst(i32),
    /// `N{n}` – number of players who did not vote.
    VotesAbstained(i32),
    /// `E{F|A}` – voting ended; `true` when the bill passed.
    VoteResult(bool),
    /// `v{name}` – the named player vetoed the bill.
    VetoCast(String),
    /// `P{n}` – number of players currently connected.
    PlayerCount(i32),
    /// `J{name}` – a player joined.
    PlayerJoined(String),
    /// `L{name}` – a player left.
    PlayerLeft(String),
    /// `R{name}` – a player reconnected.
    PlayerReconnected(String),
    /// `W{slot}{name}` – podium slot (single digit) and the winner's name.
    WinnerAnnounced { slot: u8, name: String },
    /// `T{note}` – the session ended.
    SessionEnded(String),
}

impl VetoEvent {
    /// Returns the wire tag this event was decoded from.
    pub fn tag(&self) -> char {
        match self {
            VetoEvent::SessionStart => tags::SESSION_START,
            VetoEvent::VotingOpened => tags::VOTING_OPENED,
            VetoEvent::CounterTick(_) => tags::COUNTER_TICK,
            VetoEvent::VotesFor(_) => tags::VOTES_FOR,
            VetoEvent::VotesAgainst(_) => tags::VOTES_AGAINST,
            VetoEvent::VotesAbstained(_) => tags::VOTES_ABSTAINED,
            VetoEvent::VoteResult(_) => tags::VOTE_RESULT,
            VetoEvent::VetoCast(_) => tags::VETO_CAST,
            VetoEvent::PlayerCount(_) => tags::PLAYER_COUNT,
            VetoEvent::PlayerJoined(_) => tags::PLAYER_JOINED,
            VetoEvent::PlayerLeft(_) => tags::PLAYER_LEFT,
            VetoEvent::PlayerReconnected(_) => tags::PLAYER_RECONNECTED,
            VetoEvent::WinnerAnnounced { .. } => tags::WINNER_ANNOUNCED,
            VetoEvent::SessionEnded(_) => tags::SESSION_ENDED,
        }
    }
}

// ── Monitor → Server ──────────────────────────────────────────────────────────

/// Commands the monitor can send to the game server.
///
/// # Serde representation
///
/// ```json
/// {"type":"monitor"}
/// {"type":"start"}
/// {"type":"voting"}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MonitorCommand {
    /// Claim the monitor role.  The server accepts a single monitor.
    Monitor,
    /// Start (or restart) the game.
    Start,
    /// Open a voting round.
    Voting,
}

impl MonitorCommand {
    /// Serializes the command to the JSON text frame sent on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use veto_core::MonitorCommand;
    ///
    /// assert_eq!(MonitorCommand::Monitor.to_wire().unwrap(), r#"{"type":"monitor"}"#);
    /// ```
    pub fn to_wire(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
