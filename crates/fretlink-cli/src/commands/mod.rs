//! CLI command implementations.

pub mod run;
pub mod scan;

use std::net::Ipv4Addr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::net;
use crate::shutdown::ShutdownSignal;

/// Local address from the flag, or detected from the default route
pub fn local_addr(flag: Option<Ipv4Addr>) -> Result<Ipv4Addr> {
    match flag {
        Some(addr) => Ok(addr),
        None => {
            let addr = net::detect_local_addr()
                .context("Failed to detect local address, pass --local-ip")?;
            info!("Local address: {}", addr);
            Ok(addr)
        }
    }
}

pub fn setup_shutdown_handler() -> Result<Arc<ShutdownSignal>> {
    let shutdown = Arc::new(ShutdownSignal::new());

    let shutdown_ctrlc = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        println!("\nShutting down...");
        shutdown_ctrlc.trigger();
    })?;

    Ok(shutdown)
}
