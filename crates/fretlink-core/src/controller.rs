//! Device loop: one owned context plus the state machine.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::Config;
use crate::device::Peripherals;
use crate::discovery::HostRecord;
use crate::error::Result;
use crate::session::{Inbound, SessionClient, SessionEvent};
use crate::state::{
    DeviceContext, DeviceState, MENU, StateKind, StateMachine, StateRegistry, connect_to_host,
};

pub struct Controller {
    ctx: DeviceContext,
    machine: StateMachine,
}

impl Controller {
    pub fn new(peripherals: Peripherals, config: Config) -> Self {
        Self::with_registry(peripherals, config, StateRegistry::with_defaults())
    }

    pub fn with_registry(peripherals: Peripherals, config: Config, registry: StateRegistry) -> Self {
        Self {
            ctx: DeviceContext::new(peripherals, config),
            machine: StateMachine::new(registry),
        }
    }

    /// Enter the initial menu state
    pub fn start(&mut self) -> Result<StateKind> {
        self.ctx.begin_tick();
        self.machine.set_state(MENU, &mut self.ctx)
    }

    /// Run one device loop iteration
    ///
    /// Order within a tick: sample clock and buttons, pump the session
    /// (directives first switch states, payloads go to the active state),
    /// then update the active state.
    pub fn tick(&mut self) {
        self.ctx.begin_tick();

        let events = self.ctx.session.poll(self.ctx.now_ms);
        for event in events {
            self.dispatch(event);
        }

        self.machine.tick(&mut self.ctx);
    }

    fn dispatch(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Connected => debug!("Session up"),
            SessionEvent::Disconnected => debug!("Session down"),
            SessionEvent::Inbound(Inbound::StateChange(name)) => {
                // Unknown names are logged by the machine and ignored
                let _ = self.machine.set_state(&name, &mut self.ctx);
            }
            SessionEvent::Inbound(Inbound::Payload(payload)) => {
                self.machine.handle_payload(payload, &mut self.ctx);
            }
        }
    }

    /// Tick until `shutdown_requested` is set, then exit the active state
    pub fn run(&mut self, shutdown_requested: &AtomicBool, tick_ms: u64) -> Result<()> {
        if self.machine.current().is_none() {
            self.start()?;
        }

        info!("Device loop running ({}ms tick)", tick_ms);
        loop {
            if shutdown_requested.load(Ordering::SeqCst) {
                debug!("Shutdown signal received, exiting device loop");
                break;
            }

            self.tick();
            thread::sleep(Duration::from_millis(tick_ms));
        }

        self.shutdown();
        Ok(())
    }

    /// Connect straight to a known host, bypassing the menu selection
    pub fn connect_to(&mut self, address: Ipv4Addr, port: Option<u16>) -> HostRecord {
        self.ctx.begin_tick();
        connect_to_host(&mut self.ctx, address, port)
    }

    /// Switch state as if the host had sent `SM-<name>`
    pub fn set_state(&mut self, name: &str) -> Result<StateKind> {
        self.machine.set_state(name, &mut self.ctx)
    }

    /// Exit the active state; outputs are blanked and the session closed
    pub fn shutdown(&mut self) {
        self.machine.shutdown(&mut self.ctx);
        self.ctx.session.disconnect();
        self.ctx.blank_outputs();
    }

    pub fn current_state(&self) -> Option<&DeviceState> {
        self.machine.current()
    }

    pub fn current_kind(&self) -> Option<StateKind> {
        self.machine.current_kind()
    }

    pub fn session(&self) -> &SessionClient {
        &self.ctx.session
    }

    pub fn scanned_servers(&self) -> &[HostRecord] {
        self.ctx.scanner.scanned_servers()
    }
}
