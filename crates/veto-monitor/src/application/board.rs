//! Presentation state of the parliament monitor.
//!
//! [`MonitorBoard`] is a fold over the host event queue.  The main loop
//! drains the queue every frame and feeds each event to
//! [`MonitorBoard::apply`]; whatever the board holds afterwards is what the
//! screen shows.
//!
//! Transient announcements (joins, leaves, vetoes) go to a status line that
//! clears itself [`STATUS_DURATION`] after it was set.  A newer announcement
//! replaces an older one.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;
use veto_core::{MonitorCommand, VetoEvent};

use crate::domain::{ConnectionState, LifecycleEvent, MonitorEvent};

/// How long a status announcement stays visible.
pub const STATUS_DURATION: Duration = Duration::from_secs(2);

/// Something the board wants the main loop to do in response to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Send this command to the server.
    Send(MonitorCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Status {
    text: String,
    shown_at: Instant,
}

/// Everything the monitor displays.
#[derive(Debug, Clone, Default)]
pub struct MonitorBoard {
    connection: ConnectionState,
    pub players: i32,
    pub votes_for: i32,
    pub votes_against: i32,
    pub votes_abstained: i32,
    /// Seconds left in the current voting round, once a counter arrived.
    pub seconds_left: Option<i32>,
    pub voting_open: bool,
    /// Outcome of the last vote: `true` when the bill passed.
    pub last_result: Option<bool>,
    /// Player whose veto killed the current bill.
    pub veto_from: Option<String>,
    /// Podium by slot.  Slot 0 is the most effective deputy.
    pub winners: BTreeMap<u8, String>,
    /// Closing note once the session is over.
    pub ended: Option<String>,
    status: Option<Status>,
}

impl MonitorBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one queued event, stamping announcements with the current time.
    pub fn apply(&mut self, event: &MonitorEvent) -> Option<Reaction> {
        self.apply_at(event, Instant::now())
    }

    /// Applies one queued event as if it arrived at `now`.
    pub fn apply_at(&mut self, event: &MonitorEvent, now: Instant) -> Option<Reaction> {
        match event {
            MonitorEvent::Lifecycle(lifecycle) => self.apply_lifecycle(*lifecycle),
            MonitorEvent::Game(game) => {
                self.apply_game(game, now);
                None
            }
        }
    }

    fn apply_lifecycle(&mut self, event: LifecycleEvent) -> Option<Reaction> {
        match event {
            LifecycleEvent::Connecting => {
                self.connection = ConnectionState::Connecting;
                None
            }
            LifecycleEvent::Connected => {
                self.connection = ConnectionState::Connected;
                Some(Reaction::Send(MonitorCommand::Monitor))
            }
            LifecycleEvent::Disconnected(reason) => {
                debug!("board sees disconnect: {reason:?}");
                self.connection = ConnectionState::Disconnected;
                None
            }
        }
    }

    fn apply_game(&mut self, event: &VetoEvent, now: Instant) {
        match event {
            VetoEvent::SessionStart => self.reset_session(),
            VetoEvent::VotingOpened => {
                self.voting_open = true;
                self.veto_from = None;
                self.last_result = None;
            }
            VetoEvent::CounterTick(n) => self.seconds_left = Some(*n),
            VetoEvent::VotesFor(n) => self.votes_for = *n,
            VetoEvent::VotesAgainst(n) => self.votes_against = *n,
            VetoEvent::VotesAbstained(n) => self.votes_abstained = *n,
            VetoEvent::VoteResult(passed) => {
                self.voting_open = false;
                self.last_result = Some(*passed);
            }
            VetoEvent::VetoCast(name) => {
                self.voting_open = false;
                self.veto_from = Some(name.clone());
                self.announce(format!("Veto from {name}!"), now);
            }
            VetoEvent::PlayerCount(n) => self.players = *n,
            VetoEvent::PlayerJoined(name) => self.announce(format!("{name} joined"), now),
            VetoEvent::PlayerLeft(name) => self.announce(format!("{name} left"), now),
            VetoEvent::PlayerReconnected(name) => {
                self.announce(format!("{name} reconnected"), now)
            }
            VetoEvent::WinnerAnnounced { slot, name } => {
                self.winners.insert(*slot, name.clone());
            }
            VetoEvent::SessionEnded(note) => {
                self.voting_open = false;
                self.ended = Some(note.clone());
                self.announce(format!("The end: {note}"), now);
            }
        }
    }

    fn reset_session(&mut self) {
        self.votes_for = 0;
        self.votes_against = 0;
        self.votes_abstained = 0;
        self.seconds_left = None;
        self.voting_open = false;
        self.last_result = None;
        self.veto_from = None;
        self.winners.clear();
        self.ended = None;
    }

    fn announce(&mut self, text: String, now: Instant) {
        self.status = Some(Status {
            text,
            shown_at: now,
        });
    }

    /// Clears the status line once it has been shown for [`STATUS_DURATION`].
    ///
    /// Returns `true` if it was cleared.
    pub fn expire_status(&mut self, now: Instant) -> bool {
        match &self.status {
            Some(status) if now.saturating_duration_since(status.shown_at) >= STATUS_DURATION => {
                self.status = None;
                true
            }
            _ => false,
        }
    }

    /// The current announcement, if any.
    pub fn status(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.text.as_str())
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Text of the overlay covering the screen while not connected.
    pub fn banner(&self) -> Option<&'static str> {
        match self.connection {
            ConnectionState::Connected => None,
            ConnectionState::Connecting => Some("Connecting..."),
            ConnectionState::Disconnected => Some("Disconnected"),
        }
    }
}

/// One-line summary, printed by the binary whenever the board changes.
impl fmt::Display for MonitorBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(banner) = self.banner() {
            return write!(f, "[{banner}]");
        }

        write!(
            f,
            "players {} | for {} against {} abstained {}",
            self.players, self.votes_for, self.votes_against, self.votes_abstained
        )?;
        if let Some(secs) = self.seconds_left.filter(|_| self.voting_open) {
            write!(f, " | {secs}s left")?;
        }
        match self.last_result {
            Some(true) => write!(f, " | PASSED")?,
            Some(false) => write!(f, " | REJECTED")?,
            None => {}
        }
        if let Some(name) = &self.veto_from {
            write!(f, " | VETO ({name})")?;
        }
        if self.ended.is_some() && !self.winners.is_empty() {
            let podium: Vec<String> = self
                .winners
                .iter()
                .map(|(slot, name)| format!("{slot}. {name}"))
                .collect();
            write!(f, " | winners: {}", podium.join(", "))?;
        }
        if let Some(status) = self.status() {
            write!(f, " | {status}")?;
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
