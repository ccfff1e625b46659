//! Text frame grammar of the persistent channel.
//!
//! A single leading token selects the plane:
//! - `SM-<name>` is a control directive naming the next device state
//! - everything else is a game payload for the active state
//!
//! Payloads understood by the controller:
//! - `Game-Start`, `Game-End`
//! - `NOTE-<track>-<timeMs>`
//! - `PlayerObject ... Player=<name> ...` (multi-line player description)

use crate::config::rhythm::TRACK_COUNT;
use crate::error::{Error, Result};

pub const STATE_CHANGE_PREFIX: &str = "SM-";
pub const NOTE_PREFIX: &str = "NOTE-";
pub const GAME_START: &str = "Game-Start";
pub const GAME_END: &str = "Game-End";
pub const PLAYER_OBJECT_PREFIX: &str = "PlayerObject";
pub const PLAYER_KEY: &str = "Player=";
pub const FINAL_SCORE_PREFIX: &str = "Score-";

/// Classified inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Control plane: switch to the named state
    StateChange(String),
    /// Data plane: owned by the active state
    Payload(GamePayload),
}

/// Game payload delivered to the active state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GamePayload {
    GameStart,
    GameEnd,
    Note { track: u8, time_ms: u64 },
    Player { name: String },
    /// Any other text, forwarded verbatim
    Other(String),
}

/// Outbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Greeting(String),
    /// Rising-edge press on a track
    TrackPress(u8),
    /// Score of a finished round
    FinalScore(u32),
    Text(String),
}

impl Outbound {
    pub fn to_frame(&self) -> String {
        match self {
            Self::Greeting(text) | Self::Text(text) => text.clone(),
            Self::TrackPress(track) => track.to_string(),
            Self::FinalScore(score) => format!("{}{}", FINAL_SCORE_PREFIX, score),
        }
    }
}

fn trim_frame(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\0')
}

/// Classify a text frame
///
/// The `SM-` rule is terminal: such a frame is never also a payload.
pub fn parse_inbound(text: &str) -> Result<Inbound> {
    if let Some(name) = text.strip_prefix(STATE_CHANGE_PREFIX) {
        let name = trim_frame(name);
        if name.is_empty() {
            return Err(Error::Protocol("Empty state name".to_string()));
        }
        return Ok(Inbound::StateChange(name.to_string()));
    }

    parse_payload(text).map(Inbound::Payload)
}

/// Parse a data-plane payload
pub fn parse_payload(text: &str) -> Result<GamePayload> {
    let trimmed = trim_frame(text);

    if trimmed == GAME_START {
        return Ok(GamePayload::GameStart);
    }
    if trimmed == GAME_END {
        return Ok(GamePayload::GameEnd);
    }
    if let Some(rest) = trimmed.strip_prefix(NOTE_PREFIX) {
        let (track, time_ms) = parse_note(rest)?;
        return Ok(GamePayload::Note { track, time_ms });
    }
    if trimmed.starts_with(PLAYER_OBJECT_PREFIX) {
        return parse_player(trimmed).map(|name| GamePayload::Player { name });
    }

    Ok(GamePayload::Other(text.to_string()))
}

fn parse_note(rest: &str) -> Result<(u8, u64)> {
    let (track, time) = rest
        .split_once('-')
        .ok_or_else(|| Error::Protocol(format!("Malformed note: NOTE-{}", rest)))?;

    let track: u8 = track
        .parse()
        .map_err(|_| Error::Protocol(format!("Invalid note track: {:?}", track)))?;
    if track >= TRACK_COUNT {
        return Err(Error::Protocol(format!("Note track out of range: {}", track)));
    }

    let time_ms: u64 = time
        .parse()
        .map_err(|_| Error::Protocol(format!("Invalid note time: {:?}", time)))?;

    Ok((track, time_ms))
}

fn parse_player(text: &str) -> Result<String> {
    text.lines()
        .find_map(|line| line.trim().strip_prefix(PLAYER_KEY))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::Protocol("Player object without a name".to_string()))
}
