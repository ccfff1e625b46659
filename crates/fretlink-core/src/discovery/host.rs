use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// A discovered game host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub address: Ipv4Addr,
    pub port: u16,
    pub host_name: String,
    pub game_name: String,
}

impl HostRecord {
    pub fn new(
        address: Ipv4Addr,
        port: u16,
        host_name: impl Into<String>,
        game_name: impl Into<String>,
    ) -> Self {
        Self {
            address,
            port,
            host_name: host_name.into(),
            game_name: game_name.into(),
        }
    }

    /// Record for a host found by probing, before its document is fetched
    pub fn placeholder(address: Ipv4Addr, port: u16) -> Self {
        Self::new(address, port, "HostName", "GameName")
    }
}

/// Result of adding a record to a [`HostList`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Added,
    Duplicate,
    Full,
}

/// Capacity-bounded, duplicate-free list of hosts
#[derive(Debug, Clone)]
pub struct HostList {
    records: Vec<HostRecord>,
    capacity: usize,
}

impl HostList {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record unless its address is already listed or the list is full
    pub fn push(&mut self, record: HostRecord) -> PushOutcome {
        if self.contains(record.address) {
            return PushOutcome::Duplicate;
        }
        if self.is_full() {
            return PushOutcome::Full;
        }
        self.records.push(record);
        PushOutcome::Added
    }

    pub fn contains(&self, address: Ipv4Addr) -> bool {
        self.records.iter().any(|r| r.address == address)
    }

    pub fn as_slice(&self) -> &[HostRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(suffix: u8) -> Ipv4Addr {
        Ipv4Addr::new(192, 168, 0, suffix)
    }

    #[test]
    fn test_placeholder_record() {
        let record = HostRecord::placeholder(addr(14), 80);
        assert_eq!(record.port, 80);
        assert_eq!(record.host_name, "HostName");
        assert_eq!(record.game_name, "GameName");
    }

    #[test]
    fn test_push_rejects_duplicates() {
        let mut list = HostList::new(10);
        assert_eq!(list.push(HostRecord::placeholder(addr(14), 80)), PushOutcome::Added);
        assert_eq!(
            list.push(HostRecord::new(addr(14), 80, "other", "other")),
            PushOutcome::Duplicate
        );
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_push_respects_capacity() {
        let mut list = HostList::new(2);
        list.push(HostRecord::placeholder(addr(1), 80));
        list.push(HostRecord::placeholder(addr(2), 80));
        assert!(list.is_full());
        assert_eq!(list.push(HostRecord::placeholder(addr(3), 80)), PushOutcome::Full);
        assert_eq!(list.len(), 2);
        assert!(!list.contains(addr(3)));
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut list = HostList::new(3);
        list.push(HostRecord::placeholder(addr(1), 80));
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.capacity(), 3);
        assert!(list.as_slice().is_empty());
    }
}
