//! Per-host request pacing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Hosts known to block bursts get a stricter gap than the configured
/// default.
const HOST_GAP_OVERRIDES_MS: &[(&str, u64)] = &[
    ("www.realestate.com.au", 2500),
    ("realestate.com.au", 2500),
    ("www.domain.com.au", 2500),
    ("domain.com.au", 2500),
];

/// Tracks the last dispatch instant per destination host and enforces a
/// minimum gap between consecutive dispatches to the same host.
///
/// Each host entry is its own mutex, held across the gap wait, so the
/// check-and-update is atomic per host: two tasks targeting the same host
/// can never both observe a stale last-hit time and dispatch inside the
/// same gap window. A task cancelled while waiting drops the guard without
/// recording a dispatch it never made. Hosts are independent; pacing one
/// never delays another.
///
/// State has process lifetime and only affects pacing, never result
/// correctness, so [`HostGate::reset`] between logical runs is safe.
#[derive(Debug, Default)]
pub(crate) struct HostGate {
    default_gap: Duration,
    hosts: Mutex<HashMap<String, Arc<Mutex<Option<Instant>>>>>,
}

impl HostGate {
    pub(crate) fn new(default_gap_ms: u64) -> Self {
        Self {
            default_gap: Duration::from_millis(default_gap_ms),
            hosts: Mutex::new(HashMap::new()),
        }
    }

    fn gap_for(&self, host: &str) -> Duration {
        HOST_GAP_OVERRIDES_MS
            .iter()
            .find(|(h, _)| *h == host)
            .map_or(self.default_gap, |(_, ms)| Duration::from_millis(*ms))
    }

    /// Waits until a request to `host` is allowed, then records the dispatch.
    pub(crate) async fn pace(&self, host: &str) {
        let slot = {
            let mut hosts = self.hosts.lock().await;
            Arc::clone(hosts.entry(host.to_owned()).or_default())
        };

        let mut last_hit = slot.lock().await;
        if let Some(last) = *last_hit {
            let ready_at = last + self.gap_for(host);
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last_hit = Some(Instant::now());
    }

    /// Clears all pacing state.
    pub(crate) async fn reset(&self) {
        self.hosts.lock().await.clear();
    }
}
