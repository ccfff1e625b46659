//! Mock device collaborators for testing
//!
//! Every mock is a cheap handle around shared state: clone it before
//! handing it to the controller and keep the clone to drive inputs and
//! inspect outputs from the test.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::rc::Rc;

use crate::config::device::LED_COUNT;
use crate::device::{
    Buttons, ChannelEvent, Clock, Connection, Display, Leds, MessageChannel, Network,
    Peripherals, Rgb,
};
use crate::error::{Error, Result};
use crate::input::{Button, ButtonSet};

/// Manually driven clock
///
/// With `with_auto_advance`, every read moves time forward, which lets
/// deadline loops terminate without a real timer.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    now: Rc<Cell<u64>>,
    step: u64,
}

impl MockClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
            step: 0,
        }
    }

    pub fn with_auto_advance(mut self, step_ms: u64) -> Self {
        self.step = step_ms;
        self
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn peek(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}

/// Recorded display operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayOp {
    Clear,
    Cursor(u16, u16),
    TextSize(u8),
    TextColor(Rgb),
    Print(String),
}

/// Display that records every call
#[derive(Debug, Clone, Default)]
pub struct MockDisplay {
    ops: Rc<RefCell<Vec<DisplayOp>>>,
}

impl MockDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<DisplayOp> {
        self.ops.borrow().clone()
    }

    /// All printed strings, oldest first
    pub fn printed(&self) -> Vec<String> {
        self.ops
            .borrow()
            .iter()
            .filter_map(|op| match op {
                DisplayOp::Print(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Strings printed since the last clear
    pub fn screen_text(&self) -> Vec<String> {
        let ops = self.ops.borrow();
        let start = ops
            .iter()
            .rposition(|op| *op == DisplayOp::Clear)
            .map(|i| i + 1)
            .unwrap_or(0);
        ops[start..]
            .iter()
            .filter_map(|op| match op {
                DisplayOp::Print(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn shows(&self, needle: &str) -> bool {
        self.screen_text().iter().any(|line| line.contains(needle))
    }

    /// Index of the first printed op containing `needle`
    pub fn position_of(&self, needle: &str) -> Option<usize> {
        self.ops
            .borrow()
            .iter()
            .position(|op| matches!(op, DisplayOp::Print(text) if text.contains(needle)))
    }

    pub fn reset(&self) {
        self.ops.borrow_mut().clear();
    }
}

impl Display for MockDisplay {
    fn clear(&mut self) {
        self.ops.borrow_mut().push(DisplayOp::Clear);
    }

    fn set_cursor(&mut self, x: u16, y: u16) {
        self.ops.borrow_mut().push(DisplayOp::Cursor(x, y));
    }

    fn set_text_size(&mut self, size: u8) {
        self.ops.borrow_mut().push(DisplayOp::TextSize(size));
    }

    fn set_text_color(&mut self, color: Rgb) {
        self.ops.borrow_mut().push(DisplayOp::TextColor(color));
    }

    fn print(&mut self, text: &str) {
        self.ops.borrow_mut().push(DisplayOp::Print(text.to_string()));
    }
}

/// Button panel whose levels are set by the test
#[derive(Debug, Clone, Default)]
pub struct MockButtons {
    levels: Rc<Cell<ButtonSet>>,
}

impl MockButtons {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, button: Button) {
        self.levels.set(self.levels.get().with(button));
    }

    pub fn release(&self, button: Button) {
        self.levels.set(self.levels.get().without(button));
    }

    pub fn release_all(&self) {
        self.levels.set(ButtonSet::empty());
    }
}

impl Buttons for MockButtons {
    fn read(&mut self) -> ButtonSet {
        self.levels.get()
    }
}

/// LED strip keeping both the buffered and the shown pixel colors
#[derive(Debug, Clone)]
pub struct MockLeds {
    buffer: Rc<RefCell<Vec<Rgb>>>,
    shown: Rc<RefCell<Vec<Rgb>>>,
    brightness: Rc<Cell<u8>>,
}

impl MockLeds {
    pub fn new(count: usize) -> Self {
        Self {
            buffer: Rc::new(RefCell::new(vec![Rgb::BLACK; count])),
            shown: Rc::new(RefCell::new(vec![Rgb::BLACK; count])),
            brightness: Rc::new(Cell::new(0)),
        }
    }

    /// Color currently shown on the strip
    pub fn pixel(&self, index: usize) -> Rgb {
        self.shown.borrow().get(index).copied().unwrap_or_default()
    }

    pub fn is_blank(&self) -> bool {
        self.shown.borrow().iter().all(Rgb::is_off)
    }

    pub fn brightness(&self) -> u8 {
        self.brightness.get()
    }
}

impl Leds for MockLeds {
    fn pixel_count(&self) -> usize {
        self.buffer.borrow().len()
    }

    fn set_pixel(&mut self, index: usize, color: Rgb) {
        if let Some(pixel) = self.buffer.borrow_mut().get_mut(index) {
            *pixel = color;
        }
    }

    fn set_brightness(&mut self, level: u8) {
        self.brightness.set(level);
    }

    fn show(&mut self) {
        let buffer = self.buffer.borrow().clone();
        *self.shown.borrow_mut() = buffer;
    }
}

/// Scripted behaviour of one address on the mock subnet
#[derive(Debug, Clone, Default)]
pub struct MockHost {
    pub reachable: bool,
    pub accepts: bool,
    /// Lines sent back after the request, without terminators
    pub response: Vec<String>,
    /// Keep the connection open after the response is drained
    pub hold_open: bool,
}

impl MockHost {
    /// Host serving the discovery endpoint with an empty body
    pub fn game_host() -> Self {
        Self::responding(&["HTTP/1.1 200 OK", "Connection: close", ""])
    }

    /// Host serving the discovery endpoint with a JSON document
    pub fn with_document(json: &str) -> Self {
        Self::responding(&[
            "HTTP/1.1 200 OK",
            "Content-Type: application/json",
            "",
            json,
        ])
    }

    /// Reachable host answering with the given response lines
    pub fn responding(lines: &[&str]) -> Self {
        Self {
            reachable: true,
            accepts: true,
            response: lines.iter().map(|l| l.to_string()).collect(),
            hold_open: false,
        }
    }

    /// Host that answers pings but refuses connections
    pub fn refusing() -> Self {
        Self {
            reachable: true,
            ..Default::default()
        }
    }

    /// Host that accepts and never answers
    pub fn silent() -> Self {
        Self {
            reachable: true,
            accepts: true,
            response: Vec::new(),
            hold_open: true,
        }
    }
}

#[derive(Debug, Default)]
struct NetworkState {
    hosts: HashMap<Ipv4Addr, MockHost>,
    pinged: Vec<Ipv4Addr>,
    requests: Vec<(Ipv4Addr, u16, String)>,
    open_connections: usize,
}

/// Subnet of scripted hosts
#[derive(Debug, Clone)]
pub struct MockNetwork {
    local: Ipv4Addr,
    state: Rc<RefCell<NetworkState>>,
}

impl MockNetwork {
    pub fn new(local: Ipv4Addr) -> Self {
        Self {
            local,
            state: Rc::new(RefCell::new(NetworkState::default())),
        }
    }

    pub fn add_host(&self, address: Ipv4Addr, host: MockHost) {
        self.state.borrow_mut().hosts.insert(address, host);
    }

    /// Addresses pinged so far, in order
    pub fn pinged(&self) -> Vec<Ipv4Addr> {
        self.state.borrow().pinged.clone()
    }

    /// Requests written to connections: (address, port, payload)
    pub fn requests(&self) -> Vec<(Ipv4Addr, u16, String)> {
        self.state.borrow().requests.clone()
    }

    /// Connections opened and not yet closed
    pub fn open_connections(&self) -> usize {
        self.state.borrow().open_connections
    }
}

impl Network for MockNetwork {
    fn local_addr(&self) -> Ipv4Addr {
        self.local
    }

    fn ping(&mut self, address: Ipv4Addr, _timeout_ms: u64) -> bool {
        let mut state = self.state.borrow_mut();
        state.pinged.push(address);
        state
            .hosts
            .get(&address)
            .map(|host| host.reachable)
            .unwrap_or(false)
    }

    fn connect(
        &mut self,
        address: Ipv4Addr,
        port: u16,
        _timeout_ms: u64,
    ) -> Result<Box<dyn Connection>> {
        let host = self.state.borrow().hosts.get(&address).cloned();
        match host {
            Some(host) if host.accepts => {
                self.state.borrow_mut().open_connections += 1;
                Ok(Box::new(MockConnection {
                    address,
                    port,
                    lines: host.response.into_iter().collect(),
                    hold_open: host.hold_open,
                    closed: false,
                    state: Rc::clone(&self.state),
                }))
            }
            _ => Err(Error::ConnectFailed {
                address: address.to_string(),
                port,
                message: "connection refused".to_string(),
            }),
        }
    }
}

struct MockConnection {
    address: Ipv4Addr,
    port: u16,
    lines: VecDeque<String>,
    hold_open: bool,
    closed: bool,
    state: Rc<RefCell<NetworkState>>,
}

impl Connection for MockConnection {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(Error::ConnectionClosed);
        }
        self.state.borrow_mut().requests.push((
            self.address,
            self.port,
            String::from_utf8_lossy(data).into_owned(),
        ));
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        if self.closed {
            return Err(Error::ConnectionClosed);
        }
        Ok(self.lines.pop_front())
    }

    fn is_connected(&self) -> bool {
        !self.closed && (self.hold_open || !self.lines.is_empty())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.state.borrow_mut().open_connections -= 1;
        }
    }
}

#[derive(Debug)]
struct ChannelState {
    accepting: bool,
    connected: bool,
    open_calls: Vec<(String, u16)>,
    close_calls: usize,
    sent: Vec<String>,
    pending: VecDeque<ChannelEvent>,
}

/// Message channel driven by the test
///
/// `open` queues a `Connected` event when the channel is accepting;
/// inbound frames are injected with `push_text`.
#[derive(Debug, Clone)]
pub struct MockChannel {
    state: Rc<RefCell<ChannelState>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ChannelState {
                accepting: true,
                connected: false,
                open_calls: Vec::new(),
                close_calls: 0,
                sent: Vec::new(),
                pending: VecDeque::new(),
            })),
        }
    }

    /// Channel whose connection attempts never complete
    pub fn refusing() -> Self {
        let channel = Self::new();
        channel.set_accepting(false);
        channel
    }

    pub fn set_accepting(&self, accepting: bool) {
        self.state.borrow_mut().accepting = accepting;
    }

    pub fn push_text(&self, text: &str) {
        self.push_event(ChannelEvent::Text(text.to_string()));
    }

    pub fn push_event(&self, event: ChannelEvent) {
        self.state.borrow_mut().pending.push_back(event);
    }

    /// Simulate the peer going away
    pub fn drop_connection(&self) {
        let mut state = self.state.borrow_mut();
        state.connected = false;
        state.pending.push_back(ChannelEvent::Disconnected);
    }

    pub fn sent(&self) -> Vec<String> {
        self.state.borrow().sent.clone()
    }

    pub fn open_calls(&self) -> Vec<(String, u16)> {
        self.state.borrow().open_calls.clone()
    }

    pub fn close_calls(&self) -> usize {
        self.state.borrow().close_calls
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageChannel for MockChannel {
    fn open(&mut self, host: &str, port: u16) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.open_calls.push((host.to_string(), port));
        if state.accepting {
            state.pending.push_back(ChannelEvent::Connected);
        }
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        state.connected = false;
        state.close_calls += 1;
        state.pending.clear();
    }

    fn send_text(&mut self, text: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        state.sent.push(text.to_string());
        Ok(())
    }

    fn poll(&mut self) -> Option<ChannelEvent> {
        let mut state = self.state.borrow_mut();
        let event = state.pending.pop_front()?;
        match event {
            ChannelEvent::Connected => state.connected = true,
            ChannelEvent::Disconnected => state.connected = false,
            _ => {}
        }
        Some(event)
    }
}

/// One mock of every peripheral, plus the handles to drive them
#[derive(Debug, Clone)]
pub struct MockBoard {
    pub clock: MockClock,
    pub display: MockDisplay,
    pub buttons: MockButtons,
    pub leds: MockLeds,
    pub network: MockNetwork,
    pub channel: MockChannel,
}

impl MockBoard {
    pub fn new(local: Ipv4Addr) -> Self {
        Self {
            clock: MockClock::new(0),
            display: MockDisplay::new(),
            buttons: MockButtons::new(),
            leds: MockLeds::new(LED_COUNT),
            network: MockNetwork::new(local),
            channel: MockChannel::new(),
        }
    }

    /// Peripherals sharing state with this board's handles
    pub fn peripherals(&self) -> Peripherals {
        Peripherals {
            clock: Box::new(self.clock.clone()),
            display: Box::new(self.display.clone()),
            buttons: Box::new(self.buttons.clone()),
            leds: Box::new(self.leds.clone()),
            network: Box::new(self.network.clone()),
            channel: Box::new(self.channel.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock_auto_advance() {
        let clock = MockClock::new(100).with_auto_advance(5);
        assert_eq!(clock.now_ms(), 100);
        assert_eq!(clock.now_ms(), 105);
        clock.advance(10);
        assert_eq!(clock.peek(), 120);
    }

    #[test]
    fn test_mock_display_screen_text() {
        let mut display = MockDisplay::new();
        display.print("old");
        display.clear();
        display.print("new");

        assert_eq!(display.printed(), vec!["old", "new"]);
        assert_eq!(display.screen_text(), vec!["new"]);
        assert!(display.shows("new"));
        assert!(!display.shows("old"));
    }

    #[test]
    fn test_mock_connection_lifecycle() {
        let network = MockNetwork::new(Ipv4Addr::new(192, 168, 0, 10));
        let addr = Ipv4Addr::new(192, 168, 0, 14);
        network.add_host(addr, MockHost::game_host());

        let mut net = network.clone();
        let mut conn = net.connect(addr, 80, 50).unwrap();
        assert_eq!(network.open_connections(), 1);

        conn.write_all(b"GET / HTTP/1.1\r\n").unwrap();
        assert_eq!(conn.read_line().unwrap().as_deref(), Some("HTTP/1.1 200 OK"));

        conn.close();
        assert_eq!(network.open_connections(), 0);
        assert!(conn.read_line().is_err());
        assert_eq!(network.requests().len(), 1);
    }

    #[test]
    fn test_mock_network_refuses_unknown_host() {
        let mut network = MockNetwork::new(Ipv4Addr::new(10, 0, 0, 2));
        let result = network.connect(Ipv4Addr::new(10, 0, 0, 3), 80, 50);
        assert!(matches!(result, Err(Error::ConnectFailed { .. })));
        assert!(!network.ping(Ipv4Addr::new(10, 0, 0, 3), 5));
    }

    #[test]
    fn test_mock_channel_connect_and_send() {
        let handle = MockChannel::new();
        let mut channel = handle.clone();

        assert!(channel.send_text("early").is_err());
        channel.open("192.168.0.14", 8765).unwrap();
        assert_eq!(channel.poll(), Some(ChannelEvent::Connected));
        assert!(channel.is_connected());

        channel.send_text("hello").unwrap();
        assert_eq!(handle.sent(), vec!["hello"]);

        handle.drop_connection();
        assert_eq!(channel.poll(), Some(ChannelEvent::Disconnected));
        assert!(!channel.is_connected());
    }

    #[test]
    fn test_mock_buttons_levels() {
        let handle = MockButtons::new();
        let mut buttons = handle.clone();
        handle.press(Button::Track2);
        assert!(buttons.read().contains(Button::Track2));
        handle.release_all();
        assert!(buttons.read().is_empty());
    }
}
