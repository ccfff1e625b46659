//! Integration tests for fretlink-core
//!
//! These tests drive the controller through mock peripherals, the same way
//! the device loop does: one `tick()` per iteration, with host frames
//! injected into the mock channel.

use std::net::Ipv4Addr;

use fretlink_core::device::mock::{DisplayOp, MockBoard, MockHost};
use fretlink_core::{Button, Config, Controller, DeviceState, Rgb, StateKind};

const LOCAL: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 2);
const HOST: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 14);

fn started() -> (Controller, MockBoard) {
    let board = MockBoard::new(LOCAL);
    let mut controller = Controller::new(board.peripherals(), Config::default());
    controller.start().unwrap();
    (controller, board)
}

/// Controller in Playing with a live session, clock at `now`
fn playing_at(now: u64) -> (Controller, MockBoard) {
    let (mut controller, board) = started();
    board.clock.set(now);
    controller.connect_to(HOST, Some(8765));
    controller.tick();
    board.channel.push_text("SM-Playing");
    controller.tick();
    assert_eq!(controller.current_kind(), Some(StateKind::Playing));
    (controller, board)
}

fn tick_at(controller: &mut Controller, board: &MockBoard, ms: u64) {
    board.clock.set(ms);
    controller.tick();
}

fn press_at(controller: &mut Controller, board: &MockBoard, ms: u64, button: Button) {
    board.buttons.press(button);
    tick_at(controller, board, ms);
    board.buttons.release(button);
    tick_at(controller, board, ms + 1);
}

fn playing(controller: &Controller) -> &fretlink_core::state::PlayingState {
    controller
        .current_state()
        .and_then(DeviceState::as_playing)
        .expect("controller should be playing")
}

mod transition_tests {
    use super::*;

    #[test]
    fn test_menu_fully_exits_before_playing_enters() {
        let (mut controller, board) = started();
        controller.connect_to(HOST, Some(8765));
        controller.tick();
        assert_eq!(board.leds.pixel(4), Rgb::GREEN);

        board.display.reset();
        board.channel.push_text("SM-Playing");
        controller.tick();

        let ops = board.display.ops();
        let entered = board
            .display
            .position_of("Waiting for game...")
            .expect("playing screen drawn");
        // Menu's cleanup clear happens before anything the playing state draws
        assert_eq!(ops.first(), Some(&DisplayOp::Clear));
        assert!(board.display.position_of("Select a server").is_none());
        assert!(entered > 0);
        assert!(board.leds.is_blank());
    }

    #[test]
    fn test_unknown_directive_keeps_state() {
        let (mut controller, board) = started();
        controller.connect_to(HOST, Some(8765));
        controller.tick();

        board.display.reset();
        board.channel.push_text("SM-Lobby");
        board.channel.push_text("SM-menu");
        controller.tick();

        assert_eq!(controller.current_kind(), Some(StateKind::Menu));
        // The menu was not re-entered
        assert!(!board.display.ops().contains(&DisplayOp::Clear));
    }

    #[test]
    fn test_host_can_return_to_menu() {
        let (mut controller, board) = playing_at(0);
        board.channel.push_text("SM-MenuState");
        controller.tick();

        assert_eq!(controller.current_kind(), Some(StateKind::Menu));
        // Leaving Playing closes the session
        assert!(controller.session().session().is_none());
        assert!(board.display.shows("Scanning..."));
    }

    #[test]
    fn test_repeated_playing_directive_reenters_without_session() {
        let (mut controller, board) = playing_at(0);
        board.channel.push_text("Game-Start");
        board.channel.push_text("NOTE-0-500");
        tick_at(&mut controller, &board, 10);
        let opens = board.channel.open_calls().len();

        board.channel.push_text("SM-Playing");
        tick_at(&mut controller, &board, 20);

        // Leaving Playing always closes the session, even into Playing again
        assert_eq!(controller.current_kind(), Some(StateKind::Playing));
        assert!(controller.session().session().is_none());
        assert_eq!(board.channel.close_calls(), 1);
        assert!(!playing(&controller).engine().is_running());
        assert!(playing(&controller).engine().queue().is_empty());
        assert!(board.display.shows("WebSocket not connected."));

        tick_at(&mut controller, &board, 60_000);
        assert_eq!(board.channel.open_calls().len(), opens);
    }

    #[test]
    fn test_disconnect_action_returns_to_menu() {
        let (mut controller, board) = playing_at(0);
        board.channel.push_text("Game-Start");
        board.channel.push_text("NOTE-0-50");
        tick_at(&mut controller, &board, 10);
        assert!(!board.leds.is_blank());

        press_at(&mut controller, &board, 20, Button::Action);

        assert_eq!(controller.current_kind(), Some(StateKind::Menu));
        assert!(controller.session().session().is_none());
        assert!(board.channel.close_calls() >= 1);
        assert!(board.leds.is_blank());
        // No reconnect attempts after an explicit disconnect
        let opens = board.channel.open_calls().len();
        tick_at(&mut controller, &board, 60_000);
        assert_eq!(board.channel.open_calls().len(), opens);
    }
}

mod gameplay_tests {
    use super::*;

    #[test]
    fn test_perfect_hit_scenario() {
        let (mut controller, board) = playing_at(1_000);
        board.channel.push_text("Game-Start");
        tick_at(&mut controller, &board, 2_000);
        assert_eq!(playing(&controller).engine().score(), 0);

        board.channel.push_text("NOTE-2-1000");
        tick_at(&mut controller, &board, 2_100);
        assert_eq!(playing(&controller).engine().queue().len(), 1);

        board.buttons.press(Button::Track2);
        tick_at(&mut controller, &board, 3_000);

        let engine = playing(&controller).engine();
        assert_eq!(engine.score(), 100);
        assert!(engine.queue().is_empty());
        assert_eq!(engine.stats().perfect, 1);
    }

    #[test]
    fn test_late_press_is_good_and_very_late_press_is_nothing() {
        let (mut controller, board) = playing_at(0);
        board.channel.push_text("Game-Start");
        board.channel.push_text("NOTE-1-1000");
        board.channel.push_text("NOTE-3-1000");
        tick_at(&mut controller, &board, 0);

        // 1000 + HIT_WINDOW/4 + 1
        press_at(&mut controller, &board, 1_051, Button::Track1);
        assert_eq!(playing(&controller).engine().score(), 50);

        // 1000 + HIT_WINDOW/2 + 1: no score, note expires on the same tick
        press_at(&mut controller, &board, 1_101, Button::Track3);
        let engine = playing(&controller).engine();
        assert_eq!(engine.score(), 50);
        assert_eq!(engine.stats().missed, 1);
        assert!(engine.queue().is_empty());
    }

    #[test]
    fn test_malformed_notes_are_dropped() {
        let (mut controller, board) = playing_at(0);
        board.channel.push_text("Game-Start");
        board.channel.push_text("NOTE-7-1000");
        board.channel.push_text("NOTE-two-1000");
        board.channel.push_text("NOTE-1-500");
        tick_at(&mut controller, &board, 0);

        assert_eq!(controller.current_kind(), Some(StateKind::Playing));
        assert_eq!(playing(&controller).engine().queue().len(), 1);
    }

    #[test]
    fn test_far_future_note_does_not_stop_the_loop() {
        let (mut controller, board) = playing_at(0);
        board.channel.push_text("Game-Start");
        board.channel.push_text("NOTE-0-18446744073709551615");
        tick_at(&mut controller, &board, 0);
        tick_at(&mut controller, &board, 10_000);

        let engine = playing(&controller).engine();
        assert_eq!(engine.queue().len(), 1);
        assert_eq!(engine.stats().missed, 0);
        assert!(board.leds.is_blank());

        press_at(&mut controller, &board, 10_100, Button::Track0);
        assert_eq!(playing(&controller).engine().score(), 0);
    }

    #[test]
    fn test_restart_resets_round() {
        let (mut controller, board) = playing_at(0);
        board.channel.push_text("Game-Start");
        board.channel.push_text("NOTE-0-100");
        tick_at(&mut controller, &board, 0);
        press_at(&mut controller, &board, 100, Button::Track0);
        assert_eq!(playing(&controller).engine().score(), 100);

        board.channel.push_text("NOTE-0-5000");
        board.channel.push_text("Game-Start");
        tick_at(&mut controller, &board, 200);

        let engine = playing(&controller).engine();
        assert_eq!(engine.score(), 0);
        assert!(engine.queue().is_empty());
        assert_eq!(engine.game_time(300), Some(100));
    }

    #[test]
    fn test_full_round_reports_final_score() {
        let (mut controller, board) = playing_at(0);
        board
            .channel
            .push_text("PlayerObject \nPlayer=red-panda \nScore=0");
        board.channel.push_text("Game-Start");
        board.channel.push_text("NOTE-0-400");
        board.channel.push_text("NOTE-1-800");
        board.channel.push_text("NOTE-2-1200");
        tick_at(&mut controller, &board, 0);

        press_at(&mut controller, &board, 400, Button::Track0);
        press_at(&mut controller, &board, 870, Button::Track1);
        tick_at(&mut controller, &board, 1_500);

        board.channel.push_text("Game-End");
        tick_at(&mut controller, &board, 1_600);

        let state = playing(&controller);
        assert_eq!(state.player_name(), Some("red-panda"));
        assert_eq!(state.engine().score(), 150);
        assert_eq!(state.engine().stats().missed, 1);
        assert_eq!(state.engine().stats().max_combo, 2);

        let sent = board.channel.sent();
        assert_eq!(sent, vec!["Connected", "0", "1", "Score-150"]);
        assert!(board.display.shows("Final score: 150"));
        assert!(board.display.shows("Player: red-panda"));
    }

    #[test]
    fn test_lost_session_keeps_playing_and_reconnects() {
        let (mut controller, board) = playing_at(0);
        board.channel.drop_connection();
        tick_at(&mut controller, &board, 100);

        assert_eq!(controller.current_kind(), Some(StateKind::Playing));
        assert!(board.display.shows("WebSocket not connected."));

        tick_at(&mut controller, &board, 5_100);
        assert!(controller.session().is_connected());
        assert_eq!(board.channel.sent(), vec!["Connected", "Connected"]);
        assert!(!board.display.shows("WebSocket not connected."));
    }
}

mod discovery_tests {
    use super::*;

    fn scan_until_complete(controller: &mut Controller, board: &MockBoard) {
        for _ in 0..200 {
            board.clock.advance(10);
            controller.tick();
        }
    }

    #[test]
    fn test_menu_scan_connect_and_play() {
        let board = MockBoard::new(LOCAL);
        board.network.add_host(
            HOST,
            MockHost::with_document(
                r#"{"game_name": "Friday Jam", "hostname": "den-pc", "ip": "192.168.0.14", "port": 8765}"#,
            ),
        );
        let mut controller = Controller::new(board.peripherals(), Config::default());
        controller.start().unwrap();

        scan_until_complete(&mut controller, &board);
        assert_eq!(controller.scanned_servers().len(), 1);
        assert!(board.display.shows("> 192.168.0.14"));

        board.buttons.press(Button::Track3);
        controller.tick();
        board.buttons.release(Button::Track3);
        assert!(board.display.shows("Connecting to 192.168.0.14:8765..."));
        assert_eq!(board.leds.pixel(4), Rgb::BLUE);

        controller.tick();
        assert!(controller.session().is_connected());
        assert!(board.display.shows("Friday Jam @ den-pc"));

        board.channel.push_text("SM-Playing");
        controller.tick();
        assert_eq!(controller.current_kind(), Some(StateKind::Playing));
    }

    #[test]
    fn test_empty_subnet_shows_fallback() {
        let (mut controller, board) = started();
        scan_until_complete(&mut controller, &board);

        assert!(controller.scanned_servers().is_empty());
        assert!(board.display.shows("No servers found."));
        assert_eq!(board.network.pinged().len(), 253);
    }

    #[test]
    fn test_capacity_bound_through_controller() {
        let board = MockBoard::new(LOCAL);
        for suffix in 100..130 {
            board
                .network
                .add_host(Ipv4Addr::new(192, 168, 0, suffix), MockHost::game_host());
        }
        let mut controller = Controller::new(board.peripherals(), Config::default());
        controller.start().unwrap();
        scan_until_complete(&mut controller, &board);

        assert_eq!(controller.scanned_servers().len(), 10);
        assert_eq!(board.network.open_connections(), 0);
    }
}
