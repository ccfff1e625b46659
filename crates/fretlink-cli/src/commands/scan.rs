//! Headless subnet scan.

use std::net::Ipv4Addr;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use fretlink_core::discovery::fetch_discovery_info;
use fretlink_core::{Clock, Config, HostRecord, MonotonicClock, Network, ScanStatus, ServerScanner};
use owo_colors::OwoColorize;
use tracing::{debug, warn};

use crate::net::TcpNetwork;

use super::setup_shutdown_handler;

/// Run one scan pass and print what was found
pub fn run(config: &Config, local: Ipv4Addr, json: bool, resolve: bool) -> Result<()> {
    let shutdown = setup_shutdown_handler()?;
    let mut network = TcpNetwork::new(local);
    let clock = MonotonicClock::new();

    if !json {
        println!("Scanning {}.1-254...", subnet_prefix(local));
    }

    let mut scanner = ServerScanner::new(config.scan.clone());
    scanner.init_server_scan();
    while !shutdown.is_shutdown() {
        if scanner.update_server_scan(&mut network, &clock) == ScanStatus::Complete {
            break;
        }
        thread::sleep(Duration::from_millis(config.scan.throttle_ms.max(1)));
    }
    debug!("Scan stopped after {} addresses", scanner.cursor().scanned());

    let mut hosts = scanner.scanned_servers().to_vec();
    if resolve {
        for host in &mut hosts {
            resolve_host(&mut network, &clock, config, host);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&hosts)?);
    } else {
        print_hosts(&hosts);
    }
    Ok(())
}

fn subnet_prefix(local: Ipv4Addr) -> String {
    let [a, b, c, _] = local.octets();
    format!("{}.{}.{}", a, b, c)
}

fn resolve_host(network: &mut dyn Network, clock: &dyn Clock, config: &Config, host: &mut HostRecord) {
    match fetch_discovery_info(
        network,
        clock,
        host.address,
        config.scan.discovery_port,
        &config.scan.discovery_path,
        config.session.document_timeout_ms,
    ) {
        Ok(info) => {
            host.port = info.port;
            host.host_name = info.hostname;
            host.game_name = info.game_name;
        }
        Err(e) => warn!("Failed to resolve {}: {}", host.address, e),
    }
}

fn print_hosts(hosts: &[HostRecord]) {
    if hosts.is_empty() {
        println!("{}", "No servers found.".yellow());
        return;
    }
    println!("Found {} host(s):", hosts.len());
    for host in hosts {
        println!(
            "  {}  {}  {} @ {}",
            host.address.to_string().green(),
            format!("port {}", host.port).dimmed(),
            host.game_name.bold(),
            host.host_name
        );
    }
}
