use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::GamePayload;
use crate::state::{DeviceContext, DeviceState, MenuState, PlayingState, StateKind};

pub const MENU: &str = "Menu";
pub const MENU_STATE: &str = "MenuState";
pub const PLAYING: &str = "Playing";
pub const PLAYING_STATE: &str = "PlayingState";

/// Builds a fresh, not yet entered state
pub type StateConstructor = fn(&Config) -> DeviceState;

fn new_menu(_config: &Config) -> DeviceState {
    DeviceState::Menu(MenuState::new())
}

fn new_playing(config: &Config) -> DeviceState {
    DeviceState::Playing(PlayingState::new(&config.rhythm))
}

/// Name to constructor mapping (exact, case-sensitive)
#[derive(Debug, Clone, Default)]
pub struct StateRegistry {
    constructors: HashMap<String, StateConstructor>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in states under both short and long names
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(MENU, new_menu);
        registry.register(MENU_STATE, new_menu);
        registry.register(PLAYING, new_playing);
        registry.register(PLAYING_STATE, new_playing);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, constructor: StateConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    pub fn get(&self, name: &str) -> Option<StateConstructor> {
        self.constructors.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Holds the single active device state
///
/// ## Transition rules
///
/// - Unknown names are rejected and the current state stays active
/// - The old state is fully exited before the new one is constructed
/// - Any registered name may follow any state, including itself
#[derive(Debug)]
pub struct StateMachine {
    registry: StateRegistry,
    current: Option<DeviceState>,
}

impl StateMachine {
    pub fn new(registry: StateRegistry) -> Self {
        Self {
            registry,
            current: None,
        }
    }

    /// Switch to the state registered as `name`
    pub fn set_state(&mut self, name: &str, ctx: &mut DeviceContext) -> Result<StateKind> {
        let Some(constructor) = self.registry.get(name) else {
            warn!(
                "Unknown state: {:?}, keeping {}",
                name,
                self.current_kind()
                    .map(|k| k.to_string())
                    .unwrap_or_else(|| "no state".to_string())
            );
            return Err(Error::UnknownState(name.to_string()));
        };

        if let Some(mut old) = self.current.take() {
            debug!("Leaving {}", old.kind());
            old.hooks().on_exit(ctx);
        }

        let mut next = constructor(&ctx.config);
        let kind = next.kind();
        info!("Entering {}", kind);
        next.hooks().on_enter(ctx);
        self.current = Some(next);

        Ok(kind)
    }

    /// Run the active state's per-tick update
    pub fn tick(&mut self, ctx: &mut DeviceContext) {
        let Some(state) = self.current.as_mut() else {
            debug!("Tick without an active state");
            return;
        };

        if let Some(next) = state.hooks().on_tick(ctx) {
            // Failure is already logged and leaves the state in place
            let _ = self.set_state(next, ctx);
        }
    }

    /// Route a game payload to the active state
    pub fn handle_payload(&mut self, payload: GamePayload, ctx: &mut DeviceContext) {
        match self.current.as_mut() {
            Some(state) => state.hooks().on_payload(payload, ctx),
            None => debug!("Dropping payload without an active state: {:?}", payload),
        }
    }

    /// Exit the active state, leaving none
    pub fn shutdown(&mut self, ctx: &mut DeviceContext) {
        if let Some(mut state) = self.current.take() {
            info!("Shutting down {}", state.kind());
            state.hooks().on_exit(ctx);
        }
    }

    pub fn current(&self) -> Option<&DeviceState> {
        self.current.as_ref()
    }

    pub fn current_kind(&self) -> Option<StateKind> {
        self.current.as_ref().map(DeviceState::kind)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new(StateRegistry::with_defaults())
    }
}
