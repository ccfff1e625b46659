//! CLI argument parsing tests.
//!
//! These tests verify that command-line arguments are parsed correctly
//! without executing the commands (which would need a terminal and a network).

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::Parser;

// Re-create Args structure for testing since it's not publicly exported
#[derive(Parser)]
#[command(name = "fretlink")]
struct Args {
    #[arg(short, long, default_value = "fretlink.toml")]
    config: PathBuf,

    #[arg(long)]
    local_ip: Option<Ipv4Addr>,

    #[arg(long, default_value = "5")]
    tick_ms: u64,

    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand)]
enum Command {
    Run {
        #[arg(long)]
        host: Option<String>,
    },
    Scan {
        #[arg(long)]
        json: bool,
        #[arg(long)]
        resolve: bool,
    },
}

#[test]
fn test_parse_no_args() {
    let args = Args::try_parse_from(["fretlink"]).unwrap();
    assert!(args.command.is_none());
    assert_eq!(args.config, PathBuf::from("fretlink.toml"));
    assert_eq!(args.tick_ms, 5);
    assert!(args.local_ip.is_none());
    assert!(!args.verbose);
}

#[test]
fn test_parse_global_flags() {
    let args = Args::try_parse_from([
        "fretlink",
        "--config",
        "device.toml",
        "--local-ip",
        "192.168.0.2",
        "--tick-ms",
        "20",
        "-v",
    ])
    .unwrap();
    assert_eq!(args.config, PathBuf::from("device.toml"));
    assert_eq!(args.local_ip, Some(Ipv4Addr::new(192, 168, 0, 2)));
    assert_eq!(args.tick_ms, 20);
    assert!(args.verbose);
}

#[test]
fn test_parse_invalid_local_ip() {
    assert!(Args::try_parse_from(["fretlink", "--local-ip", "den-pc"]).is_err());
}

#[test]
fn test_parse_run_without_host() {
    let args = Args::try_parse_from(["fretlink", "run"]).unwrap();
    match args.command {
        Some(Command::Run { host }) => assert!(host.is_none()),
        _ => panic!("Expected Run command"),
    }
}

#[test]
fn test_parse_run_with_host() {
    let args = Args::try_parse_from(["fretlink", "run", "--host", "192.168.0.14:8765"]).unwrap();
    match args.command {
        Some(Command::Run { host }) => assert_eq!(host.as_deref(), Some("192.168.0.14:8765")),
        _ => panic!("Expected Run command"),
    }
}

#[test]
fn test_parse_scan_defaults() {
    let args = Args::try_parse_from(["fretlink", "scan"]).unwrap();
    match args.command {
        Some(Command::Scan { json, resolve }) => {
            assert!(!json);
            assert!(!resolve);
        }
        _ => panic!("Expected Scan command"),
    }
}

#[test]
fn test_parse_scan_json() {
    let args = Args::try_parse_from(["fretlink", "scan", "--json", "--resolve"]).unwrap();
    match args.command {
        Some(Command::Scan { json, resolve }) => {
            assert!(json);
            assert!(resolve);
        }
        _ => panic!("Expected Scan command"),
    }
}

#[test]
fn test_global_flags_before_subcommand() {
    let args = Args::try_parse_from(["fretlink", "--tick-ms", "1", "scan"]).unwrap();
    assert_eq!(args.tick_ms, 1);
    assert!(matches!(args.command, Some(Command::Scan { .. })));
}

#[test]
fn test_unknown_subcommand_fails() {
    assert!(Args::try_parse_from(["fretlink", "play"]).is_err());
}
