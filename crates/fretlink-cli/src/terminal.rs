//! Terminal peripherals: a character screen, keyboard buttons and an LED row.
//!
//! The 240x240 device screen maps onto terminal cells at 6x10 pixels per
//! cell. The LED strip is drawn on the line below the screen.

use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue};
use fretlink_core::config::device::LED_COUNT;
use fretlink_core::{Button, ButtonSet, Buttons, Display, Leds, Rgb};
use owo_colors::OwoColorize;
use tracing::{debug, trace};

use crate::shutdown::ShutdownSignal;

const CELL_WIDTH: u16 = 6;
const CELL_HEIGHT: u16 = 10;
const SCREEN_SIZE: u16 = 240;

/// Terminal row the LED strip is drawn on
const LED_ROW: u16 = SCREEN_SIZE / CELL_HEIGHT + 1;

/// Terminals report presses but not releases; a key counts as held this long
const HOLD: Duration = Duration::from_millis(80);

/// Raw mode plus alternate screen, restored on drop
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), ResetColor, cursor::Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn to_color(color: Rgb) -> Color {
    Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

/// [`Display`] drawn into the terminal with absolute cursor moves
pub struct TerminalDisplay {
    out: Stdout,
    cursor: (u16, u16),
    color: Rgb,
}

impl TerminalDisplay {
    pub fn new() -> Self {
        Self {
            out: io::stdout(),
            cursor: (0, 0),
            color: Rgb::WHITE,
        }
    }

    fn cell(&self) -> (u16, u16) {
        (self.cursor.0 / CELL_WIDTH, self.cursor.1 / CELL_HEIGHT)
    }

    fn draw(&mut self, result: io::Result<()>) {
        if let Err(e) = result.and_then(|_| self.out.flush()) {
            debug!("Terminal write failed: {}", e);
        }
    }
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TerminalDisplay {
    fn clear(&mut self) {
        // Only the screen area; the LED row keeps its state
        let mut result = Ok(());
        for row in 0..SCREEN_SIZE / CELL_HEIGHT {
            result = result.and_then(|_| {
                queue!(
                    self.out,
                    cursor::MoveTo(0, row),
                    Clear(ClearType::CurrentLine)
                )
            });
        }
        self.draw(result);
    }

    fn set_cursor(&mut self, x: u16, y: u16) {
        self.cursor = (x, y);
    }

    fn set_text_size(&mut self, _size: u8) {}

    fn set_text_color(&mut self, color: Rgb) {
        self.color = color;
    }

    fn print(&mut self, text: &str) {
        let (col, row) = self.cell();
        let result = queue!(
            self.out,
            cursor::MoveTo(col, row),
            SetForegroundColor(to_color(self.color)),
            Print(text),
            ResetColor
        );
        self.cursor.0 = self
            .cursor
            .0
            .saturating_add(text.chars().count() as u16 * CELL_WIDTH);
        self.draw(result);
    }

    fn width(&self) -> u16 {
        SCREEN_SIZE
    }

    fn height(&self) -> u16 {
        SCREEN_SIZE
    }
}

/// Keyboard mapped onto the button panel
///
/// `1`-`4` are the track buttons, `5` or `Esc` the action button.
/// `q` and `Ctrl+C` request shutdown, since raw mode swallows SIGINT.
pub struct KeyboardButtons {
    last_press: [Option<Instant>; Button::ALL.len()],
    shutdown: Arc<ShutdownSignal>,
}

impl KeyboardButtons {
    pub fn new(shutdown: Arc<ShutdownSignal>) -> Self {
        Self {
            last_press: [None; Button::ALL.len()],
            shutdown,
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        let button = match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.shutdown.trigger();
                return;
            }
            KeyCode::Char('q') => {
                self.shutdown.trigger();
                return;
            }
            KeyCode::Esc => Button::Action,
            KeyCode::Char(c) => match key_button(c) {
                Some(button) => button,
                None => return,
            },
            _ => return,
        };
        trace!("Key {:?} -> {}", key.code, button);
        self.last_press[button as usize] = Some(now);
    }
}

/// Button bound to a character key
pub fn key_button(c: char) -> Option<Button> {
    match c {
        '1'..='4' => Button::from_track(c as u8 - b'1'),
        '5' => Some(Button::Action),
        _ => None,
    }
}

impl Buttons for KeyboardButtons {
    fn read(&mut self) -> ButtonSet {
        let now = Instant::now();
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => self.handle_key(key, now),
                    Ok(_) => {}
                    Err(e) => {
                        debug!("Key read failed: {}", e);
                        break;
                    }
                },
                Ok(false) => break,
                Err(e) => {
                    debug!("Key poll failed: {}", e);
                    break;
                }
            }
        }

        Button::ALL
            .iter()
            .filter(|b| {
                self.last_press[**b as usize].is_some_and(|at| now.duration_since(at) < HOLD)
            })
            .fold(ButtonSet::default(), |set, b| set.with(*b))
    }
}

/// LED strip drawn as a row of dots
pub struct TerminalLeds {
    pixels: [Rgb; LED_COUNT],
    shown: Option<[Rgb; LED_COUNT]>,
    brightness: u8,
    out: Stdout,
}

impl TerminalLeds {
    pub fn new() -> Self {
        Self {
            pixels: [Rgb::BLACK; LED_COUNT],
            shown: None,
            brightness: u8::MAX,
            out: io::stdout(),
        }
    }

    fn render(&self) -> String {
        let mut line = String::from("LED ");
        for pixel in &self.pixels {
            if pixel.is_off() || self.brightness == 0 {
                line.push_str(&format!("{} ", "o".dimmed()));
            } else {
                line.push_str(&format!("{} ", "@".truecolor(pixel.r, pixel.g, pixel.b)));
            }
        }
        line
    }
}

impl Default for TerminalLeds {
    fn default() -> Self {
        Self::new()
    }
}

impl Leds for TerminalLeds {
    fn pixel_count(&self) -> usize {
        LED_COUNT
    }

    fn set_pixel(&mut self, index: usize, color: Rgb) {
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = color;
        }
    }

    fn set_brightness(&mut self, level: u8) {
        self.brightness = level;
        self.shown = None;
    }

    fn show(&mut self) {
        if self.shown == Some(self.pixels) {
            return;
        }
        let line = self.render();
        let result = queue!(
            self.out,
            cursor::MoveTo(0, LED_ROW),
            Clear(ClearType::CurrentLine),
            Print(line)
        )
        .and_then(|_| self.out.flush());
        if let Err(e) = result {
            debug!("LED draw failed: {}", e);
        }
        self.shown = Some(self.pixels);
    }
}
