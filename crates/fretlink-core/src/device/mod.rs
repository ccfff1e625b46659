//! Device collaborator abstraction.
//!
//! The controller never talks to hardware directly. Everything it needs from
//! the board (clock, screen, buttons, LED strip, network radio and the
//! persistent message channel) is expressed as a trait here, so the core can
//! run against real peripherals, a desktop simulator, or the mocks in
//! [`mock`].

mod clock;

// Mock collaborators (always available for unit and integration tests)
#[doc(hidden)]
pub mod mock;

use std::net::Ipv4Addr;

use crate::error::Result;
use crate::input::ButtonSet;

pub use clock::MonotonicClock;

/// 24-bit color used for both text and LEDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const YELLOW: Rgb = Rgb::new(255, 255, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);
    pub const GRAY: Rgb = Rgb::new(100, 100, 100);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn is_off(&self) -> bool {
        *self == Self::BLACK
    }
}

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin; never decreases.
    fn now_ms(&self) -> u64;
}

/// Character display
pub trait Display {
    /// Blank the whole screen.
    fn clear(&mut self);

    fn set_cursor(&mut self, x: u16, y: u16);

    fn set_text_size(&mut self, size: u8);

    fn set_text_color(&mut self, color: Rgb);

    /// Print text at the cursor, advancing it.
    fn print(&mut self, text: &str);

    fn width(&self) -> u16 {
        240
    }

    fn height(&self) -> u16 {
        240
    }

    /// Print a line of text at the given cursor position
    fn print_at(&mut self, x: u16, y: u16, text: &str) {
        self.set_cursor(x, y);
        self.print(text);
    }
}

/// Capacitive button panel
///
/// Reports raw levels; edge detection happens in [`crate::input`].
pub trait Buttons {
    /// Sample all buttons, returning the set currently held down.
    fn read(&mut self) -> ButtonSet;
}

/// Addressable RGB LED strip
pub trait Leds {
    fn pixel_count(&self) -> usize;

    fn set_pixel(&mut self, index: usize, color: Rgb);

    fn set_brightness(&mut self, level: u8);

    /// Push buffered pixel colors to the strip.
    fn show(&mut self);

    /// Turn every pixel off and push the change.
    fn clear(&mut self) {
        for index in 0..self.pixel_count() {
            self.set_pixel(index, Rgb::BLACK);
        }
        self.show();
    }
}

/// Network radio used by discovery
pub trait Network {
    /// Address of this device on the local subnet.
    fn local_addr(&self) -> Ipv4Addr;

    /// Reachability probe; `true` when the host answered within `timeout_ms`.
    fn ping(&mut self, address: Ipv4Addr, timeout_ms: u64) -> bool;

    /// Open a short-lived stream connection.
    fn connect(
        &mut self,
        address: Ipv4Addr,
        port: u16,
        timeout_ms: u64,
    ) -> Result<Box<dyn Connection>>;
}

/// Short-lived stream connection
pub trait Connection {
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Next complete line with its `\n` / `\r\n` terminator removed.
    ///
    /// Never blocks: returns `Ok(None)` when no full line is buffered yet.
    fn read_line(&mut self) -> Result<Option<String>>;

    /// Whether the peer may still send data.
    fn is_connected(&self) -> bool;

    fn close(&mut self);
}

/// Events reported by a [`MessageChannel`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Connected,
    Disconnected,
    Text(String),
    Binary(Vec<u8>),
    Ping,
    Pong,
    Error(String),
}

/// Persistent full-duplex text message channel (WebSocket-like)
pub trait MessageChannel {
    /// Start connecting; completion is reported as [`ChannelEvent::Connected`].
    fn open(&mut self, host: &str, port: u16) -> Result<()>;

    fn close(&mut self);

    fn send_text(&mut self, text: &str) -> Result<()>;

    /// Pump the channel, returning the next pending event if any.
    fn poll(&mut self) -> Option<ChannelEvent>;
}

/// The full set of board peripherals handed to the controller
pub struct Peripherals {
    pub clock: Box<dyn Clock>,
    pub display: Box<dyn Display>,
    pub buttons: Box<dyn Buttons>,
    pub leds: Box<dyn Leds>,
    pub network: Box<dyn Network>,
    pub channel: Box<dyn MessageChannel>,
}
