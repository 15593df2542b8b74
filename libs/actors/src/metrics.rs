//! Runtime Metrics
//!
//! Lock-free counters shared by every actor of one system (and its child
//! system views). Recorded by the processing loops and the remote layer.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// System-wide counters
#[derive(Debug, Default)]
pub struct SystemMetrics {
    pub actors_spawned: AtomicU64,
    pub actors_stopped: AtomicU64,
    pub messages_processed: AtomicU64,
    pub total_processing_time_ns: AtomicU64,
    pub handler_failures: AtomicU64,
    pub supervisor_retries: AtomicU64,
    pub remote_calls: AtomicU64,
    pub remote_failures: AtomicU64,
}

impl SystemMetrics {
    pub fn record_actor_spawned(&self) {
        self.actors_spawned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_actor_stopped(&self) {
        self.actors_stopped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message_handled(&self, duration: Duration) {
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
        self.total_processing_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn record_handler_failure(&self) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_supervisor_retry(&self) {
        self.supervisor_retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one remote round trip and whether it failed in transport
    pub fn record_remote_call(&self, failed: bool) {
        self.remote_calls.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.remote_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn avg_processing_time_ns(&self) -> f64 {
        let count = self.messages_processed.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        let total = self.total_processing_time_ns.load(Ordering::Relaxed);
        total as f64 / count as f64
    }

    pub fn snapshot(&self) -> SystemStats {
        SystemStats {
            actors_spawned: self.actors_spawned.load(Ordering::Relaxed),
            actors_stopped: self.actors_stopped.load(Ordering::Relaxed),
            messages_processed: self.messages_processed.load(Ordering::Relaxed),
            avg_processing_time_ns: self.avg_processing_time_ns(),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            supervisor_retries: self.supervisor_retries.load(Ordering::Relaxed),
            remote_calls: self.remote_calls.load(Ordering::Relaxed),
            remote_failures: self.remote_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `SystemMetrics`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemStats {
    pub actors_spawned: u64,
    pub actors_stopped: u64,
    pub messages_processed: u64,
    pub avg_processing_time_ns: f64,
    pub handler_failures: u64,
    pub supervisor_retries: u64,
    pub remote_calls: u64,
    pub remote_failures: u64,
}
