pub mod config;
pub mod controller;
pub mod device;
pub mod discovery;
pub mod error;
pub mod input;
pub mod rhythm;
pub mod session;
pub mod state;

pub use config::Config;
pub use controller::Controller;
pub use device::{
    Buttons, ChannelEvent, Clock, Connection, Display, Leds, MessageChannel, MonotonicClock,
    Network, Peripherals, Rgb,
};
pub use discovery::{DiscoveryInfo, HostList, HostRecord, ScanStatus, ServerScanner};
pub use error::{Error, Result};
pub use input::{Button, ButtonSet, EdgeDetector};
pub use rhythm::{Hit, Judgment, Note, NoteQueue, RhythmEngine, RoundPhase, RoundStats};
pub use session::{GamePayload, Inbound, Outbound, SessionClient, SessionEvent};
pub use state::{DeviceContext, DeviceState, StateKind, StateMachine, StateRegistry};
