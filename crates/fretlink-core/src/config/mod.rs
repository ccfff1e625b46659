//! Configuration and tuning constants.
//!
//! This module contains:
//! - `Config` - the TOML-loadable runtime configuration
//! - Scan, session, rhythm and device constant groups used as defaults

mod file;

pub use file::*;

/// Subnet discovery scan configuration.
///
/// A full pass probes suffixes 1..=254 at most `BATCH_SIZE` per tick, with
/// ticks spaced at least `THROTTLE_MS` apart.
pub mod scan {
    /// Minimum interval (in ms) between two scan batches.
    pub const THROTTLE_MS: u64 = 10;

    /// Candidate addresses probed per batch.
    pub const BATCH_SIZE: usize = 3;

    /// Reachability probe timeout (in ms).
    pub const PING_TIMEOUT_MS: u64 = 5;

    /// Time allowed (in ms) for the discovery status line to arrive.
    pub const PROBE_TIMEOUT_MS: u64 = 50;

    /// Port the discovery endpoint listens on.
    pub const DISCOVERY_PORT: u16 = 80;

    /// Path of the discovery endpoint.
    pub const DISCOVERY_PATH: &str = "/guitargame";

    /// Maximum number of hosts retained per pass.
    pub const MAX_HOSTS: usize = 10;

    /// First host suffix probed in a pass.
    pub const FIRST_SUFFIX: u8 = 1;

    /// Last host suffix probed in a pass.
    pub const LAST_SUFFIX: u8 = 254;

    /// Status line that marks a game host.
    pub const SUCCESS_STATUS_LINE: &str = "HTTP/1.1 200 OK";
}

/// Persistent session configuration.
pub mod session {
    /// Fixed reconnect interval (in ms) while the channel is down.
    pub const RECONNECT_INTERVAL_MS: u64 = 5000;

    /// Frame sent to the host as soon as the channel opens.
    pub const GREETING: &str = "Connected";

    /// Session port used when the discovery document cannot be resolved.
    pub const DEFAULT_PORT: u16 = 8765;

    /// Time allowed (in ms) to read the discovery document.
    pub const DOCUMENT_TIMEOUT_MS: u64 = 2000;

    /// Channel events drained per poll, so one tick stays bounded.
    pub const MAX_EVENTS_PER_POLL: usize = 32;
}

/// Rhythm engine timing and scoring.
pub mod rhythm {
    /// Full hit window (in ms) centered on a note's scheduled time.
    pub const HIT_WINDOW_MS: u64 = 200;

    /// Points for a hit within a quarter window.
    pub const PERFECT_POINTS: u32 = 100;

    /// Points for a hit within the half window.
    pub const GOOD_POINTS: u32 = 50;

    /// Number of playable tracks.
    pub const TRACK_COUNT: u8 = 4;

    /// How long (in ms) a track LED flashes after a hit.
    pub const FLASH_MS: u64 = 120;
}

/// Device peripherals.
pub mod device {
    /// Number of pixels on the LED strip.
    pub const LED_COUNT: usize = 5;

    /// Default LED brightness (0-255).
    pub const LED_BRIGHTNESS: u8 = 40;

    /// Number of capacitive buttons.
    pub const BUTTON_COUNT: usize = 5;
}
