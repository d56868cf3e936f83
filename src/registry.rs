//! In-memory registry of servers that have registered with this LDS.

use crate::types::RegisteredServer;
use std::collections::HashMap;
use std::path::Path;
use tokio::time::{Duration, Instant};
use tracing::info;

/// Why a record was dropped during [`Registry::sweep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    SemaphoreFileMissing,
    TimedOut,
}

/// Registry of registered servers, indexed by `server_uri`.
///
/// Backed by a `Vec` for insertion-ordered iteration (`FindServers` requires
/// peers in registry insertion order, matching the source's intrusive linked
/// list) plus a `HashMap` index for O(1) lookup. Removal shifts the tail
/// rather than swap-removing, so surviving order is never scrambled.
#[derive(Debug, Default)]
pub struct Registry {
    records: Vec<RegisteredServer>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn lookup(&self, uri: &str) -> Option<&RegisteredServer> {
        self.index.get(uri).map(|&i| &self.records[i])
    }

    /// Insert a new record, or replace the existing one with the same
    /// `server_uri`. Returns the previous record, if any.
    pub fn insert_or_replace(&mut self, record: RegisteredServer) -> Option<RegisteredServer> {
        if let Some(&i) = self.index.get(&record.server_uri) {
            Some(std::mem::replace(&mut self.records[i], record))
        } else {
            self.index.insert(record.server_uri.clone(), self.records.len());
            self.records.push(record);
            None
        }
    }

    /// Remove a record by URI, preserving the insertion order of the
    /// survivors. Shifts the tail left and fixes up every index past the
    /// removed slot.
    pub fn remove(&mut self, uri: &str) -> Option<RegisteredServer> {
        let i = self.index.remove(uri)?;
        let removed = self.records.remove(i);
        for idx in self.index.values_mut() {
            if *idx > i {
                *idx -= 1;
            }
        }
        Some(removed)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredServer> {
        self.records.iter()
    }

    /// Visit every record once, removing those whose semaphore file is gone
    /// (when `semaphore_enabled`) or that have timed out (when `timeout` is
    /// non-zero). Does not allocate per surviving record.
    pub fn sweep(&mut self, now: Instant, timeout: Duration, semaphore_enabled: bool) -> Vec<(String, RemovalReason)> {
        let mut doomed = Vec::new();
        for record in &self.records {
            if semaphore_enabled {
                if let Some(path) = &record.semaphore_file_path {
                    if !path.is_empty() && !Path::new(path).exists() {
                        doomed.push((record.server_uri.clone(), RemovalReason::SemaphoreFileMissing));
                        continue;
                    }
                }
            }
            if timeout != Duration::ZERO && now.saturating_duration_since(record.last_seen) > timeout {
                doomed.push((record.server_uri.clone(), RemovalReason::TimedOut));
            }
        }

        for (uri, reason) in &doomed {
            self.remove(uri);
            match reason {
                RemovalReason::SemaphoreFileMissing => {
                    info!(server_uri = %uri, "registration removed: semaphore file deleted");
                }
                RemovalReason::TimedOut => {
                    info!(server_uri = %uri, "registration removed: timed out");
                }
            }
        }

        doomed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ApplicationType, RegisteredServer};

    fn record(uri: &str, last_seen: Instant) -> RegisteredServer {
        RegisteredServer {
            server_uri: uri.into(),
            product_uri: "urn:product".into(),
            server_names: vec![],
            server_type: ApplicationType::Server,
            gateway_server_uri: String::new(),
            discovery_urls: vec!["opc.tcp://h:1".into()],
            semaphore_file_path: None,
            is_online: true,
            last_seen,
        }
    }

    #[tokio::test]
    async fn insert_then_lookup() {
        let mut reg = Registry::new();
        reg.insert_or_replace(record("urn:a", Instant::now()));
        assert_eq!(reg.len(), 1);
        assert!(reg.lookup("urn:a").is_some());
        assert!(reg.lookup("urn:b").is_none());
    }

    #[tokio::test]
    async fn re_registering_replaces_not_duplicates() {
        let mut reg = Registry::new();
        reg.insert_or_replace(record("urn:a", Instant::now()));
        reg.insert_or_replace(record("urn:a", Instant::now()));
        assert_eq!(reg.len(), 1);
    }

    #[tokio::test]
    async fn remove_fixes_up_shifted_indices() {
        let mut reg = Registry::new();
        reg.insert_or_replace(record("urn:a", Instant::now()));
        reg.insert_or_replace(record("urn:b", Instant::now()));
        reg.insert_or_replace(record("urn:c", Instant::now()));

        reg.remove("urn:a");
        assert_eq!(reg.len(), 2);
        assert!(reg.lookup("urn:b").is_some());
        assert!(reg.lookup("urn:c").is_some());
        reg.remove("urn:c");
        assert!(reg.lookup("urn:b").is_some());
    }

    #[tokio::test]
    async fn remove_preserves_insertion_order_of_survivors() {
        let mut reg = Registry::new();
        reg.insert_or_replace(record("urn:a", Instant::now()));
        reg.insert_or_replace(record("urn:b", Instant::now()));
        reg.insert_or_replace(record("urn:c", Instant::now()));

        reg.remove("urn:a");

        let order: Vec<&str> = reg.iter().map(|r| r.server_uri.as_str()).collect();
        assert_eq!(order, vec!["urn:b", "urn:c"]);
    }

    #[tokio::test]
    async fn remove_missing_returns_none() {
        let mut reg = Registry::new();
        assert!(reg.remove("urn:a").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_only_timed_out_entries() {
        let mut reg = Registry::new();
        reg.insert_or_replace(record("urn:stale", Instant::now()));
        tokio::time::advance(Duration::from_secs(120)).await;
        reg.insert_or_replace(record("urn:fresh", Instant::now()));

        let removed = reg.sweep(Instant::now(), Duration::from_secs(60), false);

        assert_eq!(removed, vec![("urn:stale".to_string(), RemovalReason::TimedOut)]);
        assert_eq!(reg.len(), 1);
        assert!(reg.lookup("urn:fresh").is_some());
    }

    #[tokio::test]
    async fn sweep_zero_timeout_disables_timeout_check() {
        let mut reg = Registry::new();
        let mut stale = record("urn:a", Instant::now());
        stale.last_seen = Instant::now() - Duration::from_secs(1_000_000);
        reg.insert_or_replace(stale);

        let removed = reg.sweep(Instant::now(), Duration::ZERO, false);
        assert!(removed.is_empty());
        assert_eq!(reg.len(), 1);
    }

    #[tokio::test]
    async fn sweep_removes_entries_with_missing_semaphore_file() {
        let mut reg = Registry::new();
        let mut rec = record("urn:a", Instant::now());
        rec.semaphore_file_path = Some("/nonexistent/path/to/semaphore".into());
        reg.insert_or_replace(rec);
        reg.insert_or_replace(record("urn:b", Instant::now()));

        let removed = reg.sweep(Instant::now(), Duration::from_secs(3600), true);

        assert_eq!(removed, vec![("urn:a".to_string(), RemovalReason::SemaphoreFileMissing)]);
        assert_eq!(reg.len(), 1);
    }

    #[tokio::test]
    async fn sweep_ignores_semaphore_when_disabled() {
        let mut reg = Registry::new();
        let mut rec = record("urn:a", Instant::now());
        rec.semaphore_file_path = Some("/nonexistent/path/to/semaphore".into());
        reg.insert_or_replace(rec);

        let removed = reg.sweep(Instant::now(), Duration::from_secs(3600), false);
        assert!(removed.is_empty());
    }
}
