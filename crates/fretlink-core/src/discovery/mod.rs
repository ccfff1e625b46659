//! Game host discovery.
//!
//! This module contains:
//! - `HostRecord`, `HostList` - discovered hosts, bounded and duplicate-free
//! - `ServerScanner` - throttled, resumable subnet scan
//! - HTTP probing of the discovery endpoint and discovery document parsing

mod host;
mod probe;
mod scanner;

pub use host::*;
pub use probe::*;
pub use scanner::*;
