//! Process-wide fusion counters.
//!
//! Call sites bump a [`Counter`] on [`METRICS`]; [`Metrics::flush`] logs a
//! [`MetricsSnapshot`] as one `info!` event when the process exits.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

pub static METRICS: Metrics = Metrics::new();

const COUNTERS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    AgentsDiscovered,
    DiscoveryFailures,
    DispatchesSucceeded,
    DispatchFailures,
    ReportsBuilt,
}

impl Counter {
    pub const ALL: [Counter; COUNTERS] = [
        Counter::AgentsDiscovered,
        Counter::DiscoveryFailures,
        Counter::DispatchesSucceeded,
        Counter::DispatchFailures,
        Counter::ReportsBuilt,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Counter::AgentsDiscovered => "agents_discovered",
            Counter::DiscoveryFailures => "discovery_failures",
            Counter::DispatchesSucceeded => "dispatches_succeeded",
            Counter::DispatchFailures => "dispatch_failures",
            Counter::ReportsBuilt => "reports_built",
        }
    }
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub agents_discovered: u64,
    pub discovery_failures: u64,
    pub dispatches_succeeded: u64,
    pub dispatch_failures: u64,
    pub reports_built: u64,
}

pub struct Metrics {
    counts: [AtomicU64; COUNTERS],
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            counts: [
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
            ],
        }
    }

    pub fn inc(&self, counter: Counter) {
        self.counts[counter as usize].fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = counter.name(), "counter incremented");
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.counts[counter as usize].load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            agents_discovered: self.get(Counter::AgentsDiscovered),
            discovery_failures: self.get(Counter::DiscoveryFailures),
            dispatches_succeeded: self.get(Counter::DispatchesSucceeded),
            dispatch_failures: self.get(Counter::DispatchFailures),
            reports_built: self.get(Counter::ReportsBuilt),
        }
    }

    /// Log the current counters and return them.
    pub fn flush(&self) -> MetricsSnapshot {
        let snapshot = self.snapshot();
        tracing::info!(
            metric = "flush",
            agents_discovered = snapshot.agents_discovered,
            discovery_failures = snapshot.discovery_failures,
            dispatches_succeeded = snapshot.dispatches_succeeded,
            dispatch_failures = snapshot.dispatch_failures,
            reports_built = snapshot.reports_built,
        );
        snapshot
    }
}
