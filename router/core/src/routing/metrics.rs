//! Backend Performance Tracking
//!
//! Adaptive input to backend scoring:
//! - Rolling success rate per backend
//! - Rolling average latency per backend
//! - Lifetime sample counters (never windowed)
//!
//! ```text
//!   record(b, ok, ms)
//!         |
//!         v
//!   [ s1 s2 ... s100 ]  <- oldest evicted once the window is full
//!         |
//!         v
//!   metrics_for(b) = { success_rate, avg_latency_ms, sample_count }
//! ```
//!
//! One tracker belongs to one router instance. All state sits behind a
//! single `RwLock`, so a reader always sees a consistent window.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::config::PerformanceConfig;
use crate::backend::BackendId;

// ============================================================================
// Samples
// ============================================================================

/// Outcome of one backend call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    /// Backend that was called
    pub backend: BackendId,
    /// Whether the call succeeded
    pub success: bool,
    /// Wall-clock latency of the call
    pub latency_ms: u64,
    /// When the call resolved
    pub timestamp: DateTime<Utc>,
}

/// Derived view over one backend's window
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Fraction of successful calls in the window
    pub success_rate: f64,
    /// Mean latency over the window
    pub avg_latency_ms: f64,
    /// Samples currently in the window
    pub sample_count: usize,
}

/// Window plus lifetime counters for one backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackendStats {
    /// Backend
    pub backend: BackendId,
    /// Current windowed metrics
    pub metrics: PerformanceMetrics,
    /// Every sample ever recorded
    pub lifetime_samples: u64,
    /// Every failed sample ever recorded
    pub lifetime_failures: u64,
}

#[derive(Debug, Default)]
struct BackendWindow {
    samples: VecDeque<PerformanceSample>,
    lifetime_samples: u64,
    lifetime_failures: u64,
}

impl BackendWindow {
    fn push(&mut self, sample: PerformanceSample, capacity: usize) {
        if !sample.success {
            self.lifetime_failures += 1;
        }
        self.lifetime_samples += 1;
        while self.samples.len() >= capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    #[allow(clippy::cast_precision_loss)]
    fn metrics(&self, baseline_latency_ms: f64) -> PerformanceMetrics {
        let count = self.samples.len();
        if count == 0 {
            return PerformanceMetrics {
                success_rate: 1.0,
                avg_latency_ms: baseline_latency_ms,
                sample_count: 0,
            };
        }

        let successes = self.samples.iter().filter(|s| s.success).count();
        let total_latency: f64 = self.samples.iter().map(|s| s.latency_ms as f64).sum();

        PerformanceMetrics {
            success_rate: successes as f64 / count as f64,
            avg_latency_ms: total_latency / count as f64,
            sample_count: count,
        }
    }
}

// ============================================================================
// Tracker
// ============================================================================

/// Thread-safe rolling-window performance tracker
#[derive(Debug)]
pub struct PerformanceTracker {
    config: PerformanceConfig,
    windows: RwLock<[BackendWindow; 3]>,
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new(PerformanceConfig::default())
    }
}

impl PerformanceTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new(config: PerformanceConfig) -> Self {
        Self {
            config,
            windows: RwLock::new(Default::default()),
        }
    }

    /// Window capacity per backend
    #[must_use]
    pub fn window_size(&self) -> usize {
        self.config.window_size.max(1)
    }

    /// Record a call outcome timestamped now
    pub fn record(&self, backend: BackendId, success: bool, latency_ms: u64) {
        self.record_sample(PerformanceSample {
            backend,
            success,
            latency_ms,
            timestamp: Utc::now(),
        });
    }

    /// Record a prepared sample
    pub fn record_sample(&self, sample: PerformanceSample) {
        let capacity = self.window_size();
        let mut windows = self.windows.write();
        windows[sample.backend.index()].push(sample, capacity);
    }

    /// Windowed metrics for a backend
    #[must_use]
    pub fn metrics_for(&self, backend: BackendId) -> PerformanceMetrics {
        self.windows.read()[backend.index()].metrics(self.config.baseline_latency_ms)
    }

    /// Snapshot of every backend taken under one read lock
    #[must_use]
    pub fn snapshot(&self) -> Vec<BackendStats> {
        let windows = self.windows.read();
        BackendId::ALL
            .into_iter()
            .map(|backend| {
                let window = &windows[backend.index()];
                BackendStats {
                    backend,
                    metrics: window.metrics(self.config.baseline_latency_ms),
                    lifetime_samples: window.lifetime_samples,
                    lifetime_failures: window.lifetime_failures,
                }
            })
            .collect()
    }

    /// Samples ever recorded for a backend
    #[must_use]
    pub fn lifetime_samples(&self, backend: BackendId) -> u64 {
        self.windows.read()[backend.index()].lifetime_samples
    }

    /// Samples ever recorded across all backends
    #[must_use]
    pub fn total_samples(&self) -> u64 {
        self.windows.read().iter().map(|w| w.lifetime_samples).sum()
    }

    /// Most recent samples for a backend, oldest first
    #[must_use]
    pub fn recent_samples(&self, backend: BackendId) -> Vec<PerformanceSample> {
        self.windows.read()[backend.index()]
            .samples
            .iter()
            .cloned()
            .collect()
    }
}
