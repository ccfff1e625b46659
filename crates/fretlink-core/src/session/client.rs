use tracing::{debug, info, trace, warn};

use crate::config::SessionConfig;
use crate::config::session::MAX_EVENTS_PER_POLL;
use crate::device::{ChannelEvent, MessageChannel};
use crate::session::protocol::{Inbound, Outbound, parse_inbound};

/// Target and link status of the persistent channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub host: String,
    pub port: u16,
    pub is_connected: bool,
    pub reconnect_interval_ms: u64,
    last_attempt_ms: u64,
}

impl Session {
    /// Milliseconds until the next reconnect attempt is due
    pub fn reconnect_due_in(&self, now_ms: u64) -> u64 {
        (self.last_attempt_ms + self.reconnect_interval_ms).saturating_sub(now_ms)
    }
}

/// What one poll observed on the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Connected,
    Disconnected,
    Inbound(Inbound),
}

/// Owner of the single persistent session
///
/// Link failures are never surfaced as errors: while a session target is
/// set, the client retries on a fixed interval until `disconnect`.
pub struct SessionClient {
    channel: Box<dyn MessageChannel>,
    config: SessionConfig,
    session: Option<Session>,
}

impl SessionClient {
    pub fn new(channel: Box<dyn MessageChannel>, config: SessionConfig) -> Self {
        Self {
            channel,
            config,
            session: None,
        }
    }

    /// Open the session to `host:port`, replacing any existing one
    pub fn connect(&mut self, host: &str, port: u16, now_ms: u64) {
        if self.session.is_some() {
            self.disconnect();
        }

        info!("Connecting to {}:{}", host, port);
        self.session = Some(Session {
            host: host.to_string(),
            port,
            is_connected: false,
            reconnect_interval_ms: self.config.reconnect_interval_ms,
            last_attempt_ms: now_ms,
        });

        if let Err(e) = self.channel.open(host, port) {
            warn!(
                "Failed to open session: {}, retrying in {}ms",
                e, self.config.reconnect_interval_ms
            );
        }
    }

    /// Send a text frame
    ///
    /// Returns `false` (after logging) when the session is down.
    pub fn send(&mut self, text: &str) -> bool {
        if !self.is_connected() {
            warn!("WebSocket not connected. Dropping message: {}", text);
            return false;
        }

        match self.channel.send_text(text) {
            Ok(()) => {
                trace!("Sent: {}", text);
                true
            }
            Err(e) => {
                warn!("Failed to send {:?}: {}", text, e);
                false
            }
        }
    }

    pub fn send_message(&mut self, message: &Outbound) -> bool {
        self.send(&message.to_frame())
    }

    /// Close the session and cancel reconnection
    pub fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            info!("Disconnecting from {}:{}", session.host, session.port);
            self.channel.close();
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_connected)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Pump the channel
    ///
    /// Retries a dropped link once the reconnect interval has elapsed, then
    /// drains pending events. Malformed frames are logged and dropped.
    pub fn poll(&mut self, now_ms: u64) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        let Some(session) = self.session.as_mut() else {
            return events;
        };

        if !session.is_connected && session.reconnect_due_in(now_ms) == 0 {
            debug!("Reconnecting to {}:{}", session.host, session.port);
            session.last_attempt_ms = now_ms;
            if let Err(e) = self.channel.open(&session.host, session.port) {
                warn!("Reconnect failed: {}", e);
            }
        }

        for _ in 0..MAX_EVENTS_PER_POLL {
            let Some(event) = self.channel.poll() else {
                break;
            };

            match event {
                ChannelEvent::Connected => {
                    info!("[WSc] Connected to {}:{}", session.host, session.port);
                    session.is_connected = true;
                    if let Err(e) = self.channel.send_text(&self.config.greeting) {
                        warn!("Failed to send greeting: {}", e);
                    }
                    events.push(SessionEvent::Connected);
                }
                ChannelEvent::Disconnected => {
                    if session.is_connected {
                        info!("[WSc] Disconnected");
                    }
                    session.is_connected = false;
                    session.last_attempt_ms = now_ms;
                    events.push(SessionEvent::Disconnected);
                }
                ChannelEvent::Text(text) => {
                    debug!("[WSc] Received: {}", text);
                    match parse_inbound(&text) {
                        Ok(inbound) => events.push(SessionEvent::Inbound(inbound)),
                        Err(e) => warn!("Dropping frame {:?}: {}", text, e),
                    }
                }
                ChannelEvent::Binary(data) => trace!("Ignoring {} byte binary frame", data.len()),
                ChannelEvent::Ping | ChannelEvent::Pong => trace!("Ignoring control frame"),
                ChannelEvent::Error(message) => warn!("[WSc] Channel error: {}", message),
            }
        }

        events
    }
}
