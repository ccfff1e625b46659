//! HTTP probing of the discovery endpoint.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::scan::SUCCESS_STATUS_LINE;
use crate::device::{Clock, Connection, Network};
use crate::error::{Error, Result};

/// Discovery document served by a game host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryInfo {
    pub game_name: String,
    pub hostname: String,
    pub ip: String,
    pub port: u16,
}

/// Build the fixed discovery GET request
pub fn discovery_request(path: &str, address: Ipv4Addr) -> String {
    format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, address
    )
}

/// Check whether `address` serves the discovery endpoint
///
/// Returns `Ok(true)` only when the status line is exactly
/// `HTTP/1.1 200 OK` and arrives within `timeout_ms`. The connection is
/// closed on every path.
pub fn probe_host(
    network: &mut dyn Network,
    clock: &dyn Clock,
    address: Ipv4Addr,
    port: u16,
    path: &str,
    timeout_ms: u64,
) -> Result<bool> {
    let mut conn = network.connect(address, port, timeout_ms)?;
    let result = read_status_line(conn.as_mut(), clock, address, path, timeout_ms);
    conn.close();

    Ok(result?.as_deref() == Some(SUCCESS_STATUS_LINE))
}

/// Fetch and parse the discovery document of `address`
pub fn fetch_discovery_info(
    network: &mut dyn Network,
    clock: &dyn Clock,
    address: Ipv4Addr,
    port: u16,
    path: &str,
    timeout_ms: u64,
) -> Result<DiscoveryInfo> {
    let mut conn = network.connect(address, port, timeout_ms)?;
    let result = read_response(conn.as_mut(), clock, address, path, timeout_ms);
    conn.close();

    let lines = result?;
    match lines.first() {
        Some(status) if status == SUCCESS_STATUS_LINE => {}
        Some(status) => {
            return Err(Error::Discovery(format!("Unexpected status: {}", status)));
        }
        None => return Err(Error::Timeout(timeout_ms)),
    }

    parse_discovery_document(&lines.join("\n"))
}

/// Extract the discovery document from a raw HTTP response
///
/// The body is the first JSON object in the response; anything after it
/// is ignored.
pub fn parse_discovery_document(response: &str) -> Result<DiscoveryInfo> {
    let start = response
        .find('{')
        .ok_or_else(|| Error::Discovery("No JSON found in response".to_string()))?;

    let mut stream =
        serde_json::Deserializer::from_str(&response[start..]).into_iter::<DiscoveryInfo>();
    match stream.next() {
        Some(Ok(info)) => Ok(info),
        Some(Err(e)) => Err(e.into()),
        None => Err(Error::Discovery("Empty discovery document".to_string())),
    }
}

fn send_request(conn: &mut dyn Connection, address: Ipv4Addr, path: &str) -> Result<()> {
    let request = discovery_request(path, address);
    trace!("Probing {} with {:?}", address, request);
    conn.write_all(request.as_bytes())
}

fn read_status_line(
    conn: &mut dyn Connection,
    clock: &dyn Clock,
    address: Ipv4Addr,
    path: &str,
    timeout_ms: u64,
) -> Result<Option<String>> {
    send_request(conn, address, path)?;

    let deadline = clock.now_ms() + timeout_ms;
    while clock.now_ms() < deadline && conn.is_connected() {
        if let Some(line) = conn.read_line()? {
            debug!("{} answered: {}", address, line);
            return Ok(Some(line));
        }
    }

    Ok(None)
}

fn read_response(
    conn: &mut dyn Connection,
    clock: &dyn Clock,
    address: Ipv4Addr,
    path: &str,
    timeout_ms: u64,
) -> Result<Vec<String>> {
    send_request(conn, address, path)?;

    let mut lines = Vec::new();
    let deadline = clock.now_ms() + timeout_ms;
    while clock.now_ms() < deadline && conn.is_connected() {
        if let Some(line) = conn.read_line()? {
            lines.push(line);
        }
    }

    Ok(lines)
}
