mod cli;
mod commands;
mod net;
mod shutdown;
mod terminal;
mod ws;

use anyhow::Result;
use clap::Parser;
use fretlink_core::Config;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Args, Command};

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("fretlink={}", level).parse()?)
                .add_directive(format!("fretlink_core={}", level).parse()?),
        )
        .init();

    let config = match Config::load(&args.config) {
        Ok(c) => {
            info!("Loaded config from {:?}", args.config);
            c
        }
        Err(e) => {
            warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        }
    };

    let local = commands::local_addr(args.local_ip)?;

    match args.command {
        Some(Command::Scan { json, resolve }) => commands::scan::run(&config, local, json, resolve),
        Some(Command::Run { host }) => commands::run::run(config, local, args.tick_ms, host),
        None => commands::run::run(config, local, args.tick_ms, None),
    }
}
