//! TCP-backed discovery network.

use std::io::{ErrorKind, Read, Write};
use std::net::{IpAddr, Ipv4Addr, Shutdown, SocketAddr, TcpStream, UdpSocket};
use std::time::Duration;

use fretlink_core::{Connection, Error, Network, Result};
use tracing::{debug, trace};

/// Port used for the reachability probe
const PING_PORT: u16 = 80;

/// Address used to pick the outbound interface; nothing is sent to it
const ROUTE_PROBE: &str = "8.8.8.8:80";

/// Discover the address of the interface holding the default route
pub fn detect_local_addr() -> Result<Ipv4Addr> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect(ROUTE_PROBE)?;
    match socket.local_addr()?.ip() {
        IpAddr::V4(addr) if !addr.is_unspecified() => Ok(addr),
        other => Err(Error::NetworkError(format!(
            "No IPv4 route available (got {})",
            other
        ))),
    }
}

/// [`Network`] over the host's TCP stack
#[derive(Debug, Clone)]
pub struct TcpNetwork {
    local: Ipv4Addr,
}

impl TcpNetwork {
    pub fn new(local: Ipv4Addr) -> Self {
        Self { local }
    }
}

fn timeout(ms: u64) -> Duration {
    Duration::from_millis(ms.max(1))
}

impl Network for TcpNetwork {
    fn local_addr(&self) -> Ipv4Addr {
        self.local
    }

    fn ping(&mut self, address: Ipv4Addr, timeout_ms: u64) -> bool {
        let target = SocketAddr::from((address, PING_PORT));
        match TcpStream::connect_timeout(&target, timeout(timeout_ms)) {
            Ok(stream) => {
                let _ = stream.shutdown(Shutdown::Both);
                true
            }
            Err(e) => {
                trace!("Ping {} failed: {}", address, e);
                false
            }
        }
    }

    fn connect(
        &mut self,
        address: Ipv4Addr,
        port: u16,
        timeout_ms: u64,
    ) -> Result<Box<dyn Connection>> {
        let target = SocketAddr::from((address, port));
        let stream = TcpStream::connect_timeout(&target, timeout(timeout_ms)).map_err(|e| {
            Error::ConnectFailed {
                address: address.to_string(),
                port,
                message: e.to_string(),
            }
        })?;
        stream.set_nodelay(true)?;
        stream.set_nonblocking(true)?;
        debug!("Connected to {}:{}", address, port);
        Ok(Box::new(TcpConnection::new(stream)))
    }
}

/// Non-blocking line-buffered TCP stream
#[derive(Debug)]
pub struct TcpConnection {
    stream: Option<TcpStream>,
    buffer: Vec<u8>,
    eof: bool,
}

impl TcpConnection {
    fn new(stream: TcpStream) -> Self {
        Self {
            stream: Some(stream),
            buffer: Vec::new(),
            eof: false,
        }
    }

    fn fill(&mut self) -> Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };
        let mut chunk = [0u8; 512];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => self.buffer.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.eof = true;
                    return Err(e.into());
                }
            }
        }
    }

    fn take_line(&mut self) -> Option<String> {
        let end = self.buffer.iter().position(|b| *b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

impl Connection for TcpConnection {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::ConnectionClosed)?;
        // Requests are tiny; write them in blocking mode
        stream.set_nonblocking(false)?;
        let written = stream.write_all(data).and_then(|_| stream.flush());
        stream.set_nonblocking(true)?;
        written?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.take_line() {
            return Ok(Some(line));
        }
        self.fill()?;
        if let Some(line) = self.take_line() {
            return Ok(Some(line));
        }
        // Unterminated tail after the peer closed
        if self.eof && !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            return Ok(Some(String::from_utf8_lossy(&rest).into_owned()));
        }
        Ok(None)
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some() && (!self.eof || !self.buffer.is_empty())
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.buffer.clear();
    }
}
