//! Line codec for inbound server broadcasts.
//!
//! Wire format (one message per WebSocket text frame):
//! ```text
//! [tag:1 char][payload:rest of line]
//! ```
//!
//! Framing is the transport's job; [`decode_line`] always receives one
//! complete frame.  Payloads are parsed by field type:
//!
//! | Field   | Rule                                                        |
//! |---------|-------------------------------------------------------------|
//! | integer | optional sign and base-10 digits, rest ignored; none is 0  |
//! | string  | the whole payload, verbatim                                 |
//! | bool    | `F` is `true`, anything else is `false`                     |
//! | slot    | one decimal digit; a non-digit reads as 0                   |
//!
//! A tag whose fields are missing produces no event.  So does an unknown
//! tag: the server may add messages the monitor does not understand yet.

use tracing::debug;

use crate::protocol::messages::{tags, VetoEvent, RESULT_PASSED};

/// Decodes one inbound text line into a [`VetoEvent`].
///
/// Returns `None` for an empty line, an unknown tag, or a tag whose payload
/// is missing.  Never fails and never panics.
///
/// # Examples
///
/// ```rust
/// use veto_core::{decode_line, VetoEvent};
///
/// assert_eq!(decode_line("C42"), Some(VetoEvent::CounterTick(42)));
/// assert_eq!(decode_line("Jalice"), Some(VetoEvent::PlayerJoined("alice".into())));
/// assert_eq!(decode_line("?"), None);
/// ```
pub fn decode_line(line: &str) -> Option<VetoEvent> {
    let mut chars = line.chars();
    let tag = chars.next()?;
    let payload = chars.as_str();

    match tag {
        tags::SESSION_START => Some(VetoEvent::SessionStart),
        tags::VOTING_OPENED => Some(VetoEvent::VotingOpened),
        tags::COUNTER_TICK => int_field(tag, payload).map(VetoEvent::CounterTick),
        tags::VOTES_FOR => int_field(tag, payload).map(VetoEvent::VotesFor),
        tags::VOTES_AGAINST => int_field(tag, payload).map(VetoEvent::VotesAgainst),
        tags::VOTES_ABSTAINED => int_field(tag, payload).map(VetoEvent::VotesAbstained),
        tags::PLAYER_COUNT => int_field(tag, payload).map(VetoEvent::PlayerCount),
        tags::VOTE_RESULT => payload
            .chars()
            .next()
            .map(|c| VetoEvent::VoteResult(c == RESULT_PASSED)),
        tags::VETO_CAST => string_field(payload).map(VetoEvent::VetoCast),
        tags::PLAYER_JOINED => string_field(payload).map(VetoEvent::PlayerJoined),
        tags::PLAYER_LEFT => string_field(payload).map(VetoEvent::PlayerLeft),
        tags::PLAYER_RECONNECTED => string_field(payload).map(VetoEvent::PlayerReconnected),
        tags::SESSION_ENDED => string_field(payload).map(VetoEvent::SessionEnded),
        tags::WINNER_ANNOUNCED => decode_winner(payload),
        other => {
            debug!("ignoring line with unknown tag {other:?}");
            None
        }
    }
}

/// Parses the leading decimal integer of `s`, C `atoi` style.
///
/// Leading ASCII whitespace and one optional `+` or `-` are skipped, then
/// digits are consumed until the first non-digit.  Values outside the `i32`
/// range saturate.  Returns `None` when no digit follows the sign.
///
/// Counters can go negative on the wire: the server derives the abstention
/// count by subtraction and broadcasts it as is.
///
/// # Examples
///
/// ```rust
/// use veto_core::parse_leading_int;
///
/// assert_eq!(parse_leading_int("12s"), Some(12));
/// assert_eq!(parse_leading_int(" +7"), Some(7));
/// assert_eq!(parse_leading_int("-1"), Some(-1));
/// assert_eq!(parse_leading_int("xx"), None);
/// ```
pub fn parse_leading_int(s: &str) -> Option<i32> {
    let s = s.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let mut value: Option<i32> = None;
    for digit in digits.chars().map_while(|c| c.to_digit(10)) {
        // A single decimal digit always fits.
        let digit = digit as i32;
        let acc = value.unwrap_or(0).saturating_mul(10);
        value = Some(if negative {
            acc.saturating_sub(digit)
        } else {
            acc.saturating_add(digit)
        });
    }
    value
}

// ── Field helpers ─────────────────────────────────────────────────────────────

fn int_field(tag: char, payload: &str) -> Option<i32> {
    if payload.is_empty() {
        return None;
    }
    match parse_leading_int(payload) {
        Some(n) => Some(n),
        None => {
            debug!("malformed numeric payload {payload:?} for tag {tag:?}; reading as 0");
            Some(0)
        }
    }
}

fn string_field(payload: &str) -> Option<String> {
    if payload.is_empty() {
        None
    } else {
        Some(payload.to_owned())
    }
}

fn decode_winner(payload: &str) -> Option<VetoEvent> {
    let mut chars = payload.chars();
    let slot_char = chars.next()?;
    let name = string_field(chars.as_str())?;

    let slot = match slot_char.to_digit(10) {
        Some(d) => d as u8,
        None => {
            debug!("malformed winner slot {slot_char:?}; reading as 0");
            0
        }
    };
    Some(VetoEvent::WinnerAnnounced { slot, name })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
