use tracing::{debug, info};

use crate::config::RhythmConfig;
use crate::config::rhythm::{FLASH_MS, TRACK_COUNT};
use crate::device::Rgb;
use crate::input::Button;
use crate::rhythm::{Hit, Judgment, RhythmEngine, RoundPhase};
use crate::session::{GamePayload, Outbound};
use crate::state::machine::MENU;
use crate::state::{DeviceContext, StateHooks};

/// Track colors, shared with the host's note lanes
pub const TRACK_COLORS: [Rgb; TRACK_COUNT as usize] = [Rgb::RED, Rgb::GREEN, Rgb::YELLOW, Rgb::BLUE];

pub const NOT_CONNECTED: &str = "WebSocket not connected.";

pub const FULL_COMBO: &str = "FULL COMBO";

const TRACKS: usize = TRACK_COUNT as usize;

#[derive(Debug, Clone, PartialEq, Eq)]
struct PlayingView {
    player: Option<String>,
    phase: RoundPhase,
    score: u32,
    combo: u32,
    judgment: Option<Judgment>,
    connected: bool,
}

/// In-game screen: feeds host notes to the rhythm engine and scores presses
#[derive(Debug)]
pub struct PlayingState {
    engine: RhythmEngine,
    player_name: Option<String>,
    last_hit: Option<Hit>,
    /// Per-track flash color and the time it ends
    flashes: [Option<(Rgb, u64)>; TRACKS],
    last_view: Option<PlayingView>,
    last_leds: Option<[Rgb; TRACKS]>,
}

impl PlayingState {
    pub fn new(config: &RhythmConfig) -> Self {
        Self {
            engine: RhythmEngine::new(config),
            player_name: None,
            last_hit: None,
            flashes: [None; TRACKS],
            last_view: None,
            last_leds: None,
        }
    }

    pub fn engine(&self) -> &RhythmEngine {
        &self.engine
    }

    pub fn player_name(&self) -> Option<&str> {
        self.player_name.as_deref()
    }

    pub fn last_hit(&self) -> Option<&Hit> {
        self.last_hit.as_ref()
    }

    fn register_hit(&mut self, hit: Hit, now_ms: u64) {
        let color = match hit.judgment {
            Judgment::Perfect => Rgb::WHITE,
            Judgment::Good => TRACK_COLORS[hit.track as usize],
        };
        if let Some(flash) = self.flashes.get_mut(hit.track as usize) {
            *flash = Some((color, now_ms + FLASH_MS));
        }
        self.last_hit = Some(hit);
    }

    fn update_leds(&mut self, ctx: &mut DeviceContext) {
        let now = ctx.now_ms;
        let in_window = self.engine.tracks_in_window(now);

        let mut frame = [Rgb::BLACK; TRACKS];
        for (track, color) in frame.iter_mut().enumerate() {
            *color = match self.flashes[track] {
                Some((flash, until)) if now < until => flash,
                _ if in_window[track] => TRACK_COLORS[track],
                _ => Rgb::BLACK,
            };
        }

        if self.last_leds != Some(frame) {
            for (index, color) in frame.iter().enumerate() {
                ctx.leds.set_pixel(index, *color);
            }
            ctx.leds.show();
            self.last_leds = Some(frame);
        }
    }

    fn render(&mut self, ctx: &mut DeviceContext) {
        let view = PlayingView {
            player: self.player_name.clone(),
            phase: self.engine.phase(),
            score: self.engine.score(),
            combo: self.engine.stats().combo,
            judgment: self.last_hit.map(|h| h.judgment),
            connected: ctx.session.is_connected(),
        };
        if self.last_view.as_ref() == Some(&view) {
            return;
        }

        let display = ctx.display.as_mut();
        display.clear();
        display.set_text_size(2);
        display.set_text_color(Rgb::WHITE);
        let title = match &view.player {
            Some(name) => format!("Player: {}", name),
            None => "Playing".to_string(),
        };
        display.print_at(0, 10, &title);

        match view.phase {
            RoundPhase::Idle => {
                display.set_text_color(Rgb::GRAY);
                display.print_at(0, 50, "Waiting for game...");
            }
            RoundPhase::Running => {
                display.print_at(0, 50, &format!("Score: {}", view.score));
                display.print_at(0, 80, &format!("Combo: {}", view.combo));
                if let Some(judgment) = view.judgment {
                    let color = match judgment {
                        Judgment::Perfect => Rgb::YELLOW,
                        Judgment::Good => Rgb::GREEN,
                    };
                    display.set_text_color(color);
                    display.print_at(0, 120, &judgment.to_string());
                }
            }
            RoundPhase::Finished => {
                let stats = self.engine.stats();
                display.print_at(0, 50, "Game over");
                display.set_text_color(Rgb::YELLOW);
                display.print_at(0, 80, &format!("Final score: {}", view.score));
                if stats.is_full_combo() {
                    display.set_text_color(Rgb::GREEN);
                    display.print_at(0, 140, FULL_COMBO);
                }
                display.set_text_size(1);
                display.set_text_color(Rgb::WHITE);
                display.print_at(
                    0,
                    110,
                    &format!(
                        "Perfect {}  Good {}  Miss {}  Max combo {}",
                        stats.perfect, stats.good, stats.missed, stats.max_combo
                    ),
                );
            }
        }

        display.set_text_size(1);
        if !view.connected {
            display.set_text_color(Rgb::RED);
            display.print_at(0, 200, NOT_CONNECTED);
        }
        display.set_text_color(Rgb::GRAY);
        display.print_at(0, display.height().saturating_sub(12), "5: Disconnect");

        self.last_view = Some(view);
    }
}

impl StateHooks for PlayingState {
    fn on_enter(&mut self, ctx: &mut DeviceContext) {
        self.last_view = None;
        self.last_leds = None;
        ctx.leds.clear();
        self.render(ctx);
    }

    fn on_exit(&mut self, ctx: &mut DeviceContext) {
        ctx.session.disconnect();
        ctx.blank_outputs();
        self.last_view = None;
        self.last_leds = None;
    }

    fn on_tick(&mut self, ctx: &mut DeviceContext) -> Option<&'static str> {
        let now = ctx.now_ms;
        let pressed = ctx.pressed;

        if pressed.contains(Button::Action) {
            info!("Disconnect requested");
            ctx.session.disconnect();
            return Some(MENU);
        }

        for track in pressed.iter().filter_map(Button::track) {
            ctx.session.send_message(&Outbound::TrackPress(track));
            if let Some(hit) = self.engine.press(track, now) {
                self.register_hit(hit, now);
            }
        }

        self.engine.maintain(now);
        self.update_leds(ctx);
        self.render(ctx);
        None
    }

    fn on_payload(&mut self, payload: GamePayload, ctx: &mut DeviceContext) {
        let now = ctx.now_ms;
        match payload {
            GamePayload::GameStart => {
                self.engine.start(now);
                self.last_hit = None;
                self.flashes = [None; TRACKS];
            }
            GamePayload::GameEnd => {
                let was_running = self.engine.is_running();
                let score = self.engine.end(now);
                if was_running {
                    ctx.session.send_message(&Outbound::FinalScore(score));
                }
            }
            GamePayload::Note { track, time_ms } => {
                self.engine.add_note(track, time_ms);
            }
            GamePayload::Player { name } => {
                info!("Playing as {}", name);
                self.player_name = Some(name);
            }
            GamePayload::Other(text) => debug!("Unhandled payload: {:?}", text),
        }
    }
}
