//! Interactive controller mode.

use std::net::Ipv4Addr;
use std::sync::Arc;

use anyhow::{Context, Result};
use fretlink_core::{Config, Controller, MonotonicClock, Peripherals};
use tracing::info;

use crate::cli::HostArg;
use crate::net::TcpNetwork;
use crate::terminal::{KeyboardButtons, TerminalDisplay, TerminalGuard, TerminalLeds};
use crate::ws::WsChannel;

use super::setup_shutdown_handler;

/// Run the device loop against the terminal until `q` or Ctrl+C
pub fn run(config: Config, local: Ipv4Addr, tick_ms: u64, host: Option<HostArg>) -> Result<()> {
    let shutdown = setup_shutdown_handler()?;

    println!("Keys: 1-4 tracks, 5/Esc action, q quit");
    let _guard = TerminalGuard::enter().context("Failed to prepare terminal")?;

    let peripherals = Peripherals {
        clock: Box::new(MonotonicClock::new()),
        display: Box::new(TerminalDisplay::new()),
        buttons: Box::new(KeyboardButtons::new(Arc::clone(&shutdown))),
        leds: Box::new(TerminalLeds::new()),
        network: Box::new(TcpNetwork::new(local)),
        channel: Box::new(WsChannel::new()),
    };

    let mut controller = Controller::new(peripherals, config);
    controller.start()?;

    if let Some(host) = host {
        let record = controller.connect_to(host.address, host.port);
        info!("Connecting to {}:{}", record.address, record.port);
    }

    controller.run(shutdown.flag(), tick_ms)?;
    Ok(())
}
