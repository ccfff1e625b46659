//! WebSocket message channel.

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use fretlink_core::{ChannelEvent, Error, MessageChannel, Result};
use tracing::{debug, info, warn};
use tungstenite::protocol::WebSocket;
use tungstenite::Message;

/// Time allowed for the TCP connect and the opening handshake
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);

/// [`MessageChannel`] over a plain `ws://` connection
///
/// The handshake runs blocking with a short timeout; afterwards the socket is
/// switched to non-blocking so `poll` never stalls the device loop.
#[derive(Default)]
pub struct WsChannel {
    socket: Option<WebSocket<TcpStream>>,
    pending: VecDeque<ChannelEvent>,
}

impl WsChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
        (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::NetworkError(format!("Cannot resolve {}", host)))
    }

    fn handshake(host: &str, port: u16) -> Result<WebSocket<TcpStream>> {
        let connect_failed = |message: String| Error::ConnectFailed {
            address: host.to_string(),
            port,
            message,
        };

        let target = Self::resolve(host, port)?;
        let stream = TcpStream::connect_timeout(&target, HANDSHAKE_TIMEOUT)
            .map_err(|e| connect_failed(e.to_string()))?;
        stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT))?;
        stream.set_nodelay(true)?;

        let url = format!("ws://{}:{}/", host, port);
        let (socket, response) =
            tungstenite::client(url.as_str(), stream).map_err(|e| connect_failed(e.to_string()))?;
        debug!("Handshake with {} answered {}", url, response.status());

        socket.get_ref().set_read_timeout(None)?;
        socket.get_ref().set_nonblocking(true)?;
        Ok(socket)
    }

    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    fn drop_socket(&mut self) {
        if self.socket.take().is_some() {
            self.pending.push_back(ChannelEvent::Disconnected);
        }
    }

    fn read_next(&mut self) -> Option<ChannelEvent> {
        let socket = self.socket.as_mut()?;
        match socket.read() {
            Ok(Message::Text(text)) => Some(ChannelEvent::Text(text)),
            Ok(Message::Binary(data)) => Some(ChannelEvent::Binary(data)),
            Ok(Message::Ping(_)) => {
                // The pong is queued by tungstenite; push it out
                let _ = socket.flush();
                Some(ChannelEvent::Ping)
            }
            Ok(Message::Pong(_)) => Some(ChannelEvent::Pong),
            Ok(Message::Close(frame)) => {
                info!("Host closed the channel: {:?}", frame);
                let _ = socket.flush();
                self.drop_socket();
                self.pending.pop_front()
            }
            Ok(Message::Frame(_)) => None,
            Err(tungstenite::Error::Io(e)) if e.kind() == ErrorKind::WouldBlock => None,
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                self.drop_socket();
                self.pending.pop_front()
            }
            Err(e) => {
                self.drop_socket();
                Some(ChannelEvent::Error(e.to_string()))
            }
        }
    }
}

impl MessageChannel for WsChannel {
    fn open(&mut self, host: &str, port: u16) -> Result<()> {
        self.close();
        self.pending.clear();

        let socket = Self::handshake(host, port)?;
        info!("WebSocket connected to {}:{}", host, port);
        self.socket = Some(socket);
        self.pending.push_back(ChannelEvent::Connected);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            let _ = socket.close(None);
            let _ = socket.flush();
        }
    }

    fn send_text(&mut self, text: &str) -> Result<()> {
        let socket = self.socket.as_mut().ok_or(Error::NotConnected)?;
        match socket.send(Message::Text(text.to_string())) {
            Ok(()) => Ok(()),
            // Frame is buffered and goes out on the next write or flush
            Err(tungstenite::Error::Io(e)) if e.kind() == ErrorKind::WouldBlock => Ok(()),
            Err(e) => {
                warn!("Send failed: {}", e);
                self.drop_socket();
                Err(Error::NetworkError(e.to_string()))
            }
        }
    }

    fn poll(&mut self) -> Option<ChannelEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }
        self.read_next()
    }
}
