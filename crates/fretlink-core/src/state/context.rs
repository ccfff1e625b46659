use crate::config::Config;
use crate::device::{Buttons, Clock, Display, Leds, Network, Peripherals};
use crate::discovery::ServerScanner;
use crate::input::{ButtonSet, EdgeDetector};
use crate::session::SessionClient;

/// Everything a state may touch during one tick
///
/// Owned by the controller and lent to the active state for each hook
/// call. `now_ms` and `pressed` are sampled once at the start of a tick.
pub struct DeviceContext {
    pub clock: Box<dyn Clock>,
    pub display: Box<dyn Display>,
    pub buttons: Box<dyn Buttons>,
    pub leds: Box<dyn Leds>,
    pub network: Box<dyn Network>,
    pub scanner: ServerScanner,
    pub session: SessionClient,
    pub config: Config,
    pub edges: EdgeDetector,
    /// Clock reading for the current tick
    pub now_ms: u64,
    /// Buttons that went down this tick
    pub pressed: ButtonSet,
}

impl DeviceContext {
    pub fn new(peripherals: Peripherals, config: Config) -> Self {
        let Peripherals {
            clock,
            display,
            buttons,
            mut leds,
            network,
            channel,
        } = peripherals;

        leds.set_brightness(config.device.led_brightness);
        let now_ms = clock.now_ms();

        Self {
            clock,
            display,
            buttons,
            leds,
            network,
            scanner: ServerScanner::new(config.scan.clone()),
            session: SessionClient::new(channel, config.session.clone()),
            config,
            edges: EdgeDetector::new(),
            now_ms,
            pressed: ButtonSet::empty(),
        }
    }

    /// Sample the clock and buttons for a new tick
    pub fn begin_tick(&mut self) {
        self.now_ms = self.clock.now_ms();
        let levels = self.buttons.read();
        self.pressed = self.edges.update(levels);
    }

    /// Blank the screen and every LED
    pub fn blank_outputs(&mut self) {
        self.leds.clear();
        self.display.clear();
    }
}
