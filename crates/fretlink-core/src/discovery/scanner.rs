use std::net::Ipv4Addr;

use tracing::{debug, info, trace};

use crate::config::ScanConfig;
use crate::config::scan::{FIRST_SUFFIX, LAST_SUFFIX};
use crate::device::{Clock, Network};
use crate::discovery::host::{HostList, HostRecord, PushOutcome};
use crate::discovery::probe::probe_host;

/// Position of the scanner within the current pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanCursor {
    /// Next host suffix to probe (may pass `LAST_SUFFIX` when the pass ends)
    pub next_suffix: u16,
    pub last_scan_ms: Option<u64>,
    pub found_count: usize,
}

impl ScanCursor {
    fn start() -> Self {
        Self {
            next_suffix: FIRST_SUFFIX as u16,
            last_scan_ms: None,
            found_count: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.next_suffix > LAST_SUFFIX as u16
    }

    /// Suffixes already consumed in this pass
    pub fn scanned(&self) -> u16 {
        self.next_suffix.min(LAST_SUFFIX as u16 + 1) - FIRST_SUFFIX as u16
    }
}

/// Outcome of one `update_server_scan` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// Called again before the throttle interval elapsed
    Throttled,
    /// A batch ran; `probed` candidates were tried
    Scanned { probed: usize },
    /// The pass already reached the last suffix
    Complete,
}

/// Incremental, throttled subnet scanner
///
/// One pass walks suffixes `FIRST_SUFFIX..=LAST_SUFFIX` of the device's /24,
/// skipping the device itself, a small batch per call. The pass does not
/// restart on its own; call [`ServerScanner::init_server_scan`] to begin a
/// new one.
pub struct ServerScanner {
    config: ScanConfig,
    cursor: ScanCursor,
    hosts: HostList,
}

impl ServerScanner {
    pub fn new(config: ScanConfig) -> Self {
        let hosts = HostList::new(config.max_hosts);
        Self {
            config,
            cursor: ScanCursor::start(),
            hosts,
        }
    }

    /// Reset the cursor and forget every found host
    pub fn init_server_scan(&mut self) {
        debug!("Starting server scan");
        self.cursor = ScanCursor::start();
        self.hosts.clear();
    }

    /// Probe the next batch of candidates, unless throttled or finished
    pub fn update_server_scan(&mut self, network: &mut dyn Network, clock: &dyn Clock) -> ScanStatus {
        if self.cursor.is_complete() {
            return ScanStatus::Complete;
        }

        let now = clock.now_ms();
        if let Some(last) = self.cursor.last_scan_ms
            && now.saturating_sub(last) < self.config.throttle_ms
        {
            return ScanStatus::Throttled;
        }
        self.cursor.last_scan_ms = Some(now);

        let [a, b, c, own] = network.local_addr().octets();
        let mut probed = 0;

        for _ in 0..self.config.batch_size {
            if self.cursor.is_complete() {
                break;
            }
            let suffix = self.cursor.next_suffix as u8;
            self.cursor.next_suffix += 1;

            if suffix == own {
                continue;
            }

            probed += 1;
            self.probe_candidate(network, clock, Ipv4Addr::new(a, b, c, suffix));
        }

        if self.cursor.is_complete() {
            info!("Server scan complete: {} host(s) found", self.hosts.len());
        }

        ScanStatus::Scanned { probed }
    }

    /// Hosts found so far in this pass
    ///
    /// The view is only valid until the next `update_server_scan` call.
    pub fn scanned_servers(&self) -> &[HostRecord] {
        self.hosts.as_slice()
    }

    pub fn cursor(&self) -> ScanCursor {
        self.cursor
    }

    pub fn is_complete(&self) -> bool {
        self.cursor.is_complete()
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    fn probe_candidate(&mut self, network: &mut dyn Network, clock: &dyn Clock, candidate: Ipv4Addr) {
        trace!("Scanning IP: {}", candidate);

        if !network.ping(candidate, self.config.ping_timeout_ms) {
            return;
        }

        let port = self.config.discovery_port;
        match probe_host(
            network,
            clock,
            candidate,
            port,
            &self.config.discovery_path,
            self.config.probe_timeout_ms,
        ) {
            Ok(true) => self.record(HostRecord::placeholder(candidate, port)),
            Ok(false) => debug!("{} is not a game host", candidate),
            Err(e) => debug!("Probe of {} failed: {}", candidate, e),
        }
    }

    fn record(&mut self, record: HostRecord) {
        let address = record.address;
        match self.hosts.push(record) {
            PushOutcome::Added => {
                self.cursor.found_count += 1;
                info!("Found server at: {}", address);
            }
            PushOutcome::Duplicate => debug!("{} already listed", address),
            PushOutcome::Full => debug!("Host list full, ignoring {}", address),
        }
    }
}
