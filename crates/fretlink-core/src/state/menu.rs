use std::net::Ipv4Addr;

use tracing::{debug, info, warn};

use crate::device::Rgb;
use crate::discovery::{HostRecord, fetch_discovery_info};
use crate::input::Button;
use crate::session::GamePayload;
use crate::state::{DeviceContext, StateHooks};

/// LED used for session status while in the menu
pub const STATUS_LED: usize = 4;

const TITLE: &str = "Select a server";
const NO_SERVERS: &str = "No servers found.";
const SCANNING: &str = "Scanning...";
const HELP: &str = "1:Prev 2:Next 3:Scan 4:Join";
const LIST_TOP: u16 = 40;
const ROW_HEIGHT: u16 = 20;
const VISIBLE_ROWS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Link {
    Idle,
    Connecting(String),
    Connected(String),
}

/// Snapshot of everything the menu draws
#[derive(Debug, Clone, PartialEq, Eq)]
struct MenuView {
    hosts: Vec<Ipv4Addr>,
    selected: usize,
    scan_complete: bool,
    target: Option<HostRecord>,
    link: Link,
}

/// Server browser: scans the subnet and connects to the chosen host
#[derive(Debug, Default)]
pub struct MenuState {
    selected: usize,
    target: Option<HostRecord>,
    last_view: Option<MenuView>,
}

impl MenuState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the highlighted host
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Host of the last connect request, with resolved names
    pub fn target(&self) -> Option<&HostRecord> {
        self.target.as_ref()
    }

    fn handle_buttons(&mut self, ctx: &mut DeviceContext) {
        let count = ctx.scanner.scanned_servers().len();
        let pressed = ctx.pressed;

        for button in pressed.iter() {
            match button {
                Button::Track0 if count > 0 => {
                    self.selected = (self.selected + count - 1) % count;
                }
                Button::Track1 if count > 0 => {
                    self.selected = (self.selected + 1) % count;
                }
                Button::Track2 => {
                    info!("Rescanning");
                    ctx.session.disconnect();
                    ctx.scanner.init_server_scan();
                    self.selected = 0;
                    self.target = None;
                    // The list is gone; remaining presses refer to stale entries
                    return;
                }
                Button::Track3 => {
                    let Some(host) = ctx.scanner.scanned_servers().get(self.selected).cloned()
                    else {
                        debug!("No server selected");
                        continue;
                    };
                    self.target = Some(connect_to_host(ctx, host.address, None));
                }
                _ => {}
            }
        }
    }

    fn view(&self, ctx: &DeviceContext) -> MenuView {
        let link = match ctx.session.session() {
            None => Link::Idle,
            Some(s) if s.is_connected => Link::Connected(format!("{}:{}", s.host, s.port)),
            Some(s) => Link::Connecting(format!("{}:{}", s.host, s.port)),
        };

        MenuView {
            hosts: ctx
                .scanner
                .scanned_servers()
                .iter()
                .map(|h| h.address)
                .collect(),
            selected: self.selected,
            scan_complete: ctx.scanner.is_complete(),
            target: self.target.clone(),
            link,
        }
    }

    fn render(&mut self, ctx: &mut DeviceContext) {
        let view = self.view(ctx);
        if self.last_view.as_ref() == Some(&view) {
            return;
        }

        let display = ctx.display.as_mut();
        display.clear();
        display.set_text_size(2);
        display.set_text_color(Rgb::WHITE);
        display.print_at(0, 10, TITLE);

        if view.hosts.is_empty() {
            display.set_text_color(Rgb::GRAY);
            let message = if view.scan_complete { NO_SERVERS } else { SCANNING };
            display.print_at(0, LIST_TOP, message);
        }

        // Keep the selection inside the visible rows
        let first = view.selected.saturating_sub(VISIBLE_ROWS - 1);
        for (row, (index, address)) in view
            .hosts
            .iter()
            .enumerate()
            .skip(first)
            .take(VISIBLE_ROWS)
            .enumerate()
        {
            let y = LIST_TOP + row as u16 * ROW_HEIGHT;
            if index == view.selected {
                display.set_text_color(Rgb::YELLOW);
                display.print_at(0, y, &format!("> {}", address));
            } else {
                display.set_text_color(Rgb::WHITE);
                display.print_at(0, y, &format!("  {}", address));
            }
        }

        display.set_text_size(1);
        let status_y = LIST_TOP + VISIBLE_ROWS as u16 * ROW_HEIGHT;
        match &view.link {
            Link::Idle => {}
            Link::Connecting(addr) => {
                display.set_text_color(Rgb::BLUE);
                display.print_at(0, status_y, &format!("Connecting to {}...", addr));
            }
            Link::Connected(addr) => {
                display.set_text_color(Rgb::GREEN);
                display.print_at(0, status_y, &format!("Connected to {}", addr));
                display.print_at(0, status_y + 10, "Waiting for host...");
            }
        }
        if let Some(target) = &view.target
            && view.link != Link::Idle
        {
            display.set_text_color(Rgb::WHITE);
            display.print_at(
                0,
                status_y + 20,
                &format!("{} @ {}", target.game_name, target.host_name),
            );
        }

        display.set_text_color(Rgb::GRAY);
        display.print_at(0, display.height().saturating_sub(12), HELP);

        let status = match view.link {
            Link::Idle => Rgb::BLACK,
            Link::Connecting(_) => Rgb::BLUE,
            Link::Connected(_) => Rgb::GREEN,
        };
        ctx.leds.set_pixel(STATUS_LED, status);
        ctx.leds.show();

        self.last_view = Some(view);
    }
}

impl StateHooks for MenuState {
    fn on_enter(&mut self, ctx: &mut DeviceContext) {
        ctx.scanner.init_server_scan();
        self.selected = 0;
        self.last_view = None;
        ctx.leds.clear();
        self.render(ctx);
    }

    fn on_exit(&mut self, ctx: &mut DeviceContext) {
        // The session outlives the menu: the host switches us to Playing over it
        ctx.blank_outputs();
        self.last_view = None;
    }

    fn on_tick(&mut self, ctx: &mut DeviceContext) -> Option<&'static str> {
        if ctx.session.session().is_none() {
            ctx.scanner
                .update_server_scan(ctx.network.as_mut(), ctx.clock.as_ref());
        }

        if !ctx.pressed.is_empty() {
            self.handle_buttons(ctx);
        }

        self.render(ctx);
        None
    }

    fn on_payload(&mut self, payload: GamePayload, _ctx: &mut DeviceContext) {
        debug!("Menu ignoring payload: {:?}", payload);
    }
}

/// Open the session to a game host
///
/// Without an explicit `port`, the host's discovery document is fetched to
/// learn the session port; on failure the configured default is used.
/// Returns the host record with whatever names were resolved.
pub fn connect_to_host(ctx: &mut DeviceContext, address: Ipv4Addr, port: Option<u16>) -> HostRecord {
    let session_config = &ctx.config.session;
    let mut record = HostRecord::placeholder(address, session_config.default_port);

    match port {
        Some(port) => record.port = port,
        None => match fetch_discovery_info(
            ctx.network.as_mut(),
            ctx.clock.as_ref(),
            address,
            ctx.config.scan.discovery_port,
            &ctx.config.scan.discovery_path,
            session_config.document_timeout_ms,
        ) {
            Ok(info) => {
                info!(
                    "Resolved {}: game={:?}, host={:?}, port={}",
                    address, info.game_name, info.hostname, info.port
                );
                record.port = info.port;
                record.host_name = info.hostname;
                record.game_name = info.game_name;
            }
            Err(e) => warn!(
                "Failed to resolve {}: {}, using port {}",
                address, e, record.port
            ),
        },
    }

    let now_ms = ctx.clock.now_ms();
    ctx.session.connect(&address.to_string(), record.port, now_ms);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::device::mock::{MockBoard, MockHost};

    fn addr(suffix: u8) -> Ipv4Addr {
        Ipv4Addr::new(192, 168, 0, suffix)
    }

    fn document(port: u16) -> String {
        format!(
            r#"{{"game_name": "Friday Jam", "hostname": "den-pc", "ip": "192.168.0.20", "port": {}}}"#,
            port
        )
    }

    struct Rig {
        board: MockBoard,
        ctx: DeviceContext,
        menu: MenuState,
    }

    impl Rig {
        fn new(hosts: Vec<(u8, MockHost)>) -> Self {
            let board = MockBoard::new(addr(2));
            for (suffix, host) in hosts {
                board.network.add_host(addr(suffix), host);
            }
            let mut ctx = DeviceContext::new(board.peripherals(), Config::default());
            let mut menu = MenuState::new();
            menu.on_enter(&mut ctx);
            Self { board, ctx, menu }
        }

        fn tick(&mut self) {
            self.board.clock.advance(10);
            self.ctx.begin_tick();
            self.menu.on_tick(&mut self.ctx);
        }

        fn press(&mut self, button: Button) {
            self.board.buttons.press(button);
            self.tick();
            self.board.buttons.release(button);
            self.tick();
        }

        fn scan_all(&mut self) {
            for _ in 0..200 {
                if self.ctx.scanner.is_complete() {
                    break;
                }
                self.tick();
            }
            self.tick();
        }
    }

    #[test]
    fn test_enter_starts_scan() {
        let rig = Rig::new(Vec::new());
        assert!(rig.board.display.shows(TITLE));
        assert!(rig.board.display.shows(SCANNING));
        assert_eq!(rig.ctx.scanner.cursor().scanned(), 0);
    }

    #[test]
    fn test_empty_pass_shows_fallback() {
        let mut rig = Rig::new(Vec::new());
        rig.scan_all();

        assert!(rig.ctx.scanner.is_complete());
        assert!(rig.board.display.shows(NO_SERVERS));
        assert!(!rig.board.display.shows(SCANNING));
    }

    #[test]
    fn test_found_hosts_are_listed() {
        let mut rig = Rig::new(vec![(14, MockHost::game_host()), (20, MockHost::game_host())]);
        rig.scan_all();

        assert!(rig.board.display.shows("> 192.168.0.14"));
        assert!(rig.board.display.shows("  192.168.0.20"));
    }

    #[test]
    fn test_selection_wraps() {
        let mut rig = Rig::new(vec![(14, MockHost::game_host()), (20, MockHost::game_host())]);
        rig.scan_all();

        rig.press(Button::Track1);
        assert_eq!(rig.menu.selected(), 1);
        rig.press(Button::Track1);
        assert_eq!(rig.menu.selected(), 0);
        rig.press(Button::Track0);
        assert_eq!(rig.menu.selected(), 1);
        assert!(rig.board.display.shows("> 192.168.0.20"));
    }

    #[test]
    fn test_connect_uses_document_port() {
        let mut rig = Rig::new(vec![
            (14, MockHost::game_host()),
            (20, MockHost::with_document(&document(9001))),
        ]);
        rig.scan_all();

        rig.press(Button::Track1);
        rig.press(Button::Track3);

        assert_eq!(
            rig.board.channel.open_calls(),
            vec![("192.168.0.20".to_string(), 9001)]
        );
        let target = rig.menu.target().unwrap();
        assert_eq!(target.game_name, "Friday Jam");
        assert_eq!(target.host_name, "den-pc");
        assert!(rig.board.display.shows("Connecting to 192.168.0.20:9001..."));
        assert_eq!(rig.board.leds.pixel(STATUS_LED), Rgb::BLUE);
        assert_eq!(rig.board.network.open_connections(), 0);
    }

    #[test]
    fn test_connect_falls_back_to_default_port() {
        let mut rig = Rig::new(vec![(14, MockHost::game_host())]);
        rig.scan_all();
        rig.press(Button::Track3);

        assert_eq!(
            rig.board.channel.open_calls(),
            vec![("192.168.0.14".to_string(), 8765)]
        );
        assert_eq!(rig.menu.target().unwrap().game_name, "GameName");
    }

    #[test]
    fn test_connect_without_hosts_does_nothing() {
        let mut rig = Rig::new(Vec::new());
        rig.scan_all();
        rig.press(Button::Track3);
        assert!(rig.board.channel.open_calls().is_empty());
        assert!(rig.ctx.session.session().is_none());
    }

    #[test]
    fn test_rescan_cancels_connection() {
        let mut rig = Rig::new(vec![(14, MockHost::game_host())]);
        rig.scan_all();
        rig.press(Button::Track3);
        assert!(rig.ctx.session.session().is_some());

        rig.press(Button::Track2);
        assert!(rig.ctx.session.session().is_none());
        assert_eq!(rig.board.channel.close_calls(), 1);
        assert!(!rig.ctx.scanner.is_complete());
        assert_eq!(rig.menu.selected(), 0);
        assert!(rig.menu.target().is_none());
    }

    #[test]
    fn test_scan_paused_while_connecting() {
        let mut rig = Rig::new(vec![(1, MockHost::game_host())]);
        // First batch finds the host at .1
        rig.tick();
        rig.press(Button::Track3);

        let pinged = rig.board.network.pinged().len();
        for _ in 0..10 {
            rig.tick();
        }
        assert_eq!(rig.board.network.pinged().len(), pinged);
    }

    #[test]
    fn test_exit_blanks_outputs_and_keeps_session() {
        let mut rig = Rig::new(vec![(14, MockHost::game_host())]);
        rig.scan_all();
        rig.press(Button::Track3);

        rig.menu.on_exit(&mut rig.ctx);
        assert!(rig.board.leds.is_blank());
        assert!(rig.board.display.screen_text().is_empty());
        assert!(rig.ctx.session.session().is_some());
        assert_eq!(rig.board.channel.close_calls(), 0);
    }
}
