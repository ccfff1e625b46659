use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{device, rhythm, scan, session};
use crate::error::Result;

/// Runtime configuration, loaded from a TOML file
///
/// Every section and field is optional; missing values take the defaults
/// from the constant groups in [`crate::config`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub session: SessionConfig,
    pub rhythm: RhythmConfig,
    pub device: DeviceConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub throttle_ms: u64,
    pub batch_size: usize,
    pub ping_timeout_ms: u64,
    pub probe_timeout_ms: u64,
    pub discovery_port: u16,
    pub discovery_path: String,
    pub max_hosts: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            throttle_ms: scan::THROTTLE_MS,
            batch_size: scan::BATCH_SIZE,
            ping_timeout_ms: scan::PING_TIMEOUT_MS,
            probe_timeout_ms: scan::PROBE_TIMEOUT_MS,
            discovery_port: scan::DISCOVERY_PORT,
            discovery_path: scan::DISCOVERY_PATH.to_string(),
            max_hosts: scan::MAX_HOSTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub reconnect_interval_ms: u64,
    pub default_port: u16,
    pub greeting: String,
    pub document_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_interval_ms: session::RECONNECT_INTERVAL_MS,
            default_port: session::DEFAULT_PORT,
            greeting: session::GREETING.to_string(),
            document_timeout_ms: session::DOCUMENT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhythmConfig {
    pub hit_window_ms: u64,
    pub perfect_points: u32,
    pub good_points: u32,
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            hit_window_ms: rhythm::HIT_WINDOW_MS,
            perfect_points: rhythm::PERFECT_POINTS,
            good_points: rhythm::GOOD_POINTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub led_brightness: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            led_brightness: device::LED_BRIGHTNESS,
        }
    }
}
