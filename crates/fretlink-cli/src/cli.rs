//! CLI argument definitions for fretlink.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fretlink")]
#[command(about = "Handheld rhythm game controller", version)]
pub struct Args {
    /// Path to config file
    #[arg(short, long, default_value = "fretlink.toml")]
    pub config: PathBuf,

    /// Local IPv4 address (detected from the default route when omitted)
    #[arg(long, env = "FRETLINK_LOCAL_IP")]
    pub local_ip: Option<Ipv4Addr>,

    /// Device loop tick interval in milliseconds
    #[arg(long, default_value = "5")]
    pub tick_ms: u64,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the controller (default)
    Run {
        /// Connect straight to a host, skipping the scan (ADDR or ADDR:PORT)
        #[arg(long, value_parser = parse_host)]
        host: Option<HostArg>,
    },
    /// Scan the local subnet once and list game hosts
    Scan {
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Fetch each host's discovery document
        #[arg(long)]
        resolve: bool,
    },
}

/// Host given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostArg {
    pub address: Ipv4Addr,
    /// Session port; resolved through the discovery document when absent
    pub port: Option<u16>,
}

/// Parse `ADDR` or `ADDR:PORT`
pub fn parse_host(s: &str) -> Result<HostArg, String> {
    let (addr, port) = match s.split_once(':') {
        Some((addr, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|e| format!("invalid port {:?}: {}", port, e))?;
            (addr, Some(port))
        }
        None => (s, None),
    };
    let address = addr
        .parse::<Ipv4Addr>()
        .map_err(|e| format!("invalid address {:?}: {}", addr, e))?;
    Ok(HostArg { address, port })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_without_port() {
        let host = parse_host("192.168.0.14").unwrap();
        assert_eq!(host.address, Ipv4Addr::new(192, 168, 0, 14));
        assert_eq!(host.port, None);
    }

    #[test]
    fn test_parse_host_with_port() {
        let host = parse_host("10.0.0.5:9000").unwrap();
        assert_eq!(host.address, Ipv4Addr::new(10, 0, 0, 5));
        assert_eq!(host.port, Some(9000));
    }

    #[test]
    fn test_parse_host_rejects_garbage() {
        assert!(parse_host("den-pc").is_err());
        assert!(parse_host("10.0.0.5:").is_err());
        assert!(parse_host("10.0.0.5:70000").is_err());
    }

    #[test]
    fn test_run_host_flag() {
        let args = Args::try_parse_from(["fretlink", "run", "--host", "10.0.0.5:9000"]).unwrap();
        match args.command {
            Some(Command::Run { host: Some(host) }) => assert_eq!(host.port, Some(9000)),
            _ => panic!("Expected Run command with host"),
        }
    }
}
