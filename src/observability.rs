use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Pot activity counters
#[derive(Debug, Default)]
pub struct PotMetrics {
    pub brews_started: AtomicU64,
    pub brews_rejected: AtomicU64,
    pub pours_stopped: AtomicU64,
    pub stops_rejected: AtomicU64,
    pub pour_timeouts: AtomicU64,
    pub action_failures: AtomicU64,
    pub config_reloads: AtomicU64,
}

impl PotMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_brew_started(&self) {
        self.brews_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_brew_rejected(&self) {
        self.brews_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pour_stopped(&self) {
        self.pours_stopped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stop_rejected(&self) {
        self.stops_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pour_timeout(&self) {
        self.pour_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_action_failure(&self) {
        self.action_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_config_reload(&self) {
        self.config_reloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> PotStats {
        PotStats {
            brews_started: self.brews_started.load(Ordering::Relaxed),
            brews_rejected: self.brews_rejected.load(Ordering::Relaxed),
            pours_stopped: self.pours_stopped.load(Ordering::Relaxed),
            stops_rejected: self.stops_rejected.load(Ordering::Relaxed),
            pour_timeouts: self.pour_timeouts.load(Ordering::Relaxed),
            action_failures: self.action_failures.load(Ordering::Relaxed),
            config_reloads: self.config_reloads.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            brews_started = stats.brews_started,
            brews_rejected = stats.brews_rejected,
            pours_stopped = stats.pours_stopped,
            stops_rejected = stats.stops_rejected,
            pour_timeouts = stats.pour_timeouts,
            action_failures = stats.action_failures,
            config_reloads = stats.config_reloads,
            "Pot metrics"
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PotStats {
    pub brews_started: u64,
    pub brews_rejected: u64,
    pub pours_stopped: u64,
    pub stops_rejected: u64,
    pub pour_timeouts: u64,
    pub action_failures: u64,
    pub config_reloads: u64,
}

/// Time an operation and log its duration
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}
