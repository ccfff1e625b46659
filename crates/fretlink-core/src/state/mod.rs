//! Device screens and the state machine that switches between them.
//!
//! Exactly one [`DeviceState`] is active at a time. Every state implements
//! the same four hooks:
//! - `on_enter`: entry initialization (draw the screen, reset locals)
//! - `on_exit`: cleanup; must leave no visual or LED output behind
//! - `on_tick`: per-loop update, may request a transition by name
//! - `on_payload`: game payloads routed from the session

mod context;
mod machine;
mod menu;
mod playing;

use strum::{Display, IntoStaticStr};

use crate::session::GamePayload;

pub use context::DeviceContext;
pub use machine::*;
pub use menu::*;
pub use playing::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum StateKind {
    Menu,
    Playing,
}

/// Hooks every device state implements
pub trait StateHooks {
    fn on_enter(&mut self, ctx: &mut DeviceContext);

    fn on_exit(&mut self, ctx: &mut DeviceContext);

    /// Per-tick update; returns the name of a state to switch to
    fn on_tick(&mut self, ctx: &mut DeviceContext) -> Option<&'static str>;

    fn on_payload(&mut self, payload: GamePayload, ctx: &mut DeviceContext);
}

/// The closed set of device states
pub enum DeviceState {
    Menu(MenuState),
    Playing(PlayingState),
}

impl DeviceState {
    pub fn kind(&self) -> StateKind {
        match self {
            Self::Menu(_) => StateKind::Menu,
            Self::Playing(_) => StateKind::Playing,
        }
    }

    pub fn as_menu(&self) -> Option<&MenuState> {
        match self {
            Self::Menu(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_playing(&self) -> Option<&PlayingState> {
        match self {
            Self::Playing(state) => Some(state),
            _ => None,
        }
    }

    fn hooks(&mut self) -> &mut dyn StateHooks {
        match self {
            Self::Menu(state) => state,
            Self::Playing(state) => state,
        }
    }
}

impl std::fmt::Debug for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeviceState({})", self.kind())
    }
}
