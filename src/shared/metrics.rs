//! Metrics utilities module
//!
//! Process-wide counters for the payment confirmation flow, snapshotted into
//! a serializable structure for the `/metrics` endpoint.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

/// Metrics data structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    /// Payment sessions opened
    pub sessions_opened: u64,

    /// Payment intents created at the gateway
    pub initiations_succeeded: u64,

    /// Payment intents the gateway could not create
    pub initiations_failed: u64,

    /// Completed status checks (scheduled and manual)
    pub status_checks: u64,

    /// Status checks that failed at the transport level
    pub status_check_failures: u64,

    /// Sessions that reached a paid outcome
    pub payments_succeeded: u64,

    /// Sessions the gateway reported failed or cancelled
    pub payments_declined: u64,

    /// Sessions that exhausted the attempt budget
    pub payments_timed_out: u64,

    /// Successful artifact fetches
    pub artifacts_fetched: u64,

    /// Artifact fetches that failed after a successful payment
    pub artifact_fetch_failures: u64,

    /// Uptime in seconds
    pub uptime_seconds: u64,
}

/// Metrics utilities for the application
pub struct MetricsUtils {
    sessions_opened: AtomicU64,
    initiations_succeeded: AtomicU64,
    initiations_failed: AtomicU64,
    status_checks: AtomicU64,
    status_check_failures: AtomicU64,
    payments_succeeded: AtomicU64,
    payments_declined: AtomicU64,
    payments_timed_out: AtomicU64,
    artifacts_fetched: AtomicU64,
    artifact_fetch_failures: AtomicU64,
    consecutive_check_failures: AtomicU64,
    start_time: SystemTime,
}

impl MetricsUtils {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            sessions_opened: AtomicU64::new(0),
            initiations_succeeded: AtomicU64::new(0),
            initiations_failed: AtomicU64::new(0),
            status_checks: AtomicU64::new(0),
            status_check_failures: AtomicU64::new(0),
            payments_succeeded: AtomicU64::new(0),
            payments_declined: AtomicU64::new(0),
            payments_timed_out: AtomicU64::new(0),
            artifacts_fetched: AtomicU64::new(0),
            artifact_fetch_failures: AtomicU64::new(0),
            consecutive_check_failures: AtomicU64::new(0),
            start_time: SystemTime::now(),
        }
    }

    pub fn record_session_opened(&self) {
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_initiation(&self, succeeded: bool) {
        if succeeded {
            self.initiations_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.initiations_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_status_check(&self, succeeded: bool) {
        self.status_checks.fetch_add(1, Ordering::Relaxed);
        if succeeded {
            self.consecutive_check_failures.store(0, Ordering::Relaxed);
        } else {
            self.status_check_failures.fetch_add(1, Ordering::Relaxed);
            self.consecutive_check_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Transport failures since the last successful status check
    pub fn consecutive_check_failures(&self) -> u64 {
        self.consecutive_check_failures.load(Ordering::Relaxed)
    }

    pub fn record_payment_succeeded(&self) {
        self.payments_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_payment_declined(&self) {
        self.payments_declined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_payment_timed_out(&self) {
        self.payments_timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_artifact_fetch(&self, succeeded: bool) {
        if succeeded {
            self.artifacts_fetched.fetch_add(1, Ordering::Relaxed);
        } else {
            self.artifact_fetch_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get current metrics
    pub fn get_metrics(&self) -> Metrics {
        let uptime = SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or(Duration::from_secs(0))
            .as_secs();

        Metrics {
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
            initiations_succeeded: self.initiations_succeeded.load(Ordering::Relaxed),
            initiations_failed: self.initiations_failed.load(Ordering::Relaxed),
            status_checks: self.status_checks.load(Ordering::Relaxed),
            status_check_failures: self.status_check_failures.load(Ordering::Relaxed),
            payments_succeeded: self.payments_succeeded.load(Ordering::Relaxed),
            payments_declined: self.payments_declined.load(Ordering::Relaxed),
            payments_timed_out: self.payments_timed_out.load(Ordering::Relaxed),
            artifacts_fetched: self.artifacts_fetched.load(Ordering::Relaxed),
            artifact_fetch_failures: self.artifact_fetch_failures.load(Ordering::Relaxed),
            uptime_seconds: uptime,
        }
    }
}

impl Default for MetricsUtils {
    fn default() -> Self {
        Self::new()
    }
}
