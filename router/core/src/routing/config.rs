//! Routing Configuration
//!
//! Configuration types for backend scoring, performance tracking, execution
//! timeouts and per-backend settings. These are the validated runtime values;
//! TOML loading and environment overrides live in [`crate::config`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::BackendId;
use crate::config::ConfigError;

// ============================================================================
// Defaults
// ============================================================================

/// Classifier confidence below which the keyword-only pass runs
pub const DEFAULT_CONFIDENCE_FLOOR: f32 = 0.3;

/// Top-two score gap at or below which routing is considered ambiguous
pub const DEFAULT_AMBIGUITY_EPSILON: f32 = 0.05;

/// Rolling window size per backend (samples)
pub const DEFAULT_WINDOW_SIZE: usize = 100;

/// Latency reported for a backend with no samples yet
pub const DEFAULT_BASELINE_LATENCY_MS: f64 = 100.0;

/// Latency at which the latency penalty saturates
pub const DEFAULT_LATENCY_CEILING_MS: f64 = 1000.0;

/// Calls slower than this emit a slow-operation event
pub const DEFAULT_SLOW_OPERATION_MS: u64 = 1000;

/// Per-backend call timeout
pub const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 5000;

/// Shared deadline for multi-backend parallel reads
pub const DEFAULT_READ_DEADLINE_MS: u64 = 2000;

// ============================================================================
// Scoring Weights
// ============================================================================

/// Weights of the composite backend score
///
/// ```text
/// score = intent * w_intent + entity * w_entity
///       + success_rate * w_performance - latency_penalty * w_latency
///       + context_adjustment * w_context
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Weight of the intent-to-backend affinity
    pub intent: f32,
    /// Weight of the entity-to-backend affinity
    pub entity: f32,
    /// Weight of the rolling success rate
    pub performance: f32,
    /// Weight of the normalized latency penalty
    pub latency: f32,
    /// Weight of the hint-driven context adjustment
    pub context: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            intent: 0.5,
            entity: 0.2,
            performance: 0.2,
            latency: 0.1,
            context: 0.5,
        }
    }
}

// ============================================================================
// Performance Tracking
// ============================================================================

/// Performance tracker settings
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Samples kept per backend
    pub window_size: usize,
    /// Average latency reported for cold backends
    pub baseline_latency_ms: f64,
    /// Threshold for slow-operation telemetry
    pub slow_operation_ms: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            baseline_latency_ms: DEFAULT_BASELINE_LATENCY_MS,
            slow_operation_ms: DEFAULT_SLOW_OPERATION_MS,
        }
    }
}

// ============================================================================
// Backend Settings
// ============================================================================

/// Settings for one memory backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Whether the backend may be routed to at all
    pub enabled: bool,
    /// Per-call timeout in milliseconds
    pub timeout_ms: u64,
    /// Base URL for HTTP adapters
    pub url: Option<String>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: DEFAULT_BACKEND_TIMEOUT_MS,
            url: None,
        }
    }
}

impl BackendSettings {
    fn with_url(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            ..Self::default()
        }
    }

    /// Per-call timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Settings for all three backends
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendTable {
    /// Graph store settings
    pub graph: BackendSettings,
    /// Document store settings
    pub document: BackendSettings,
    /// Semantic memory settings
    pub semantic_memory: BackendSettings,
}

impl Default for BackendTable {
    fn default() -> Self {
        Self {
            graph: BackendSettings::with_url("http://localhost:8001"),
            document: BackendSettings::with_url("http://localhost:8080"),
            semantic_memory: BackendSettings::with_url("http://localhost:8000"),
        }
    }
}

impl BackendTable {
    /// Settings for a backend
    #[must_use]
    pub fn get(&self, backend: BackendId) -> &BackendSettings {
        match backend {
            BackendId::Graph => &self.graph,
            BackendId::Document => &self.document,
            BackendId::SemanticMemory => &self.semantic_memory,
        }
    }

    /// Mutable settings for a backend
    pub fn get_mut(&mut self, backend: BackendId) -> &mut BackendSettings {
        match backend {
            BackendId::Graph => &mut self.graph,
            BackendId::Document => &mut self.document,
            BackendId::SemanticMemory => &mut self.semantic_memory,
        }
    }
}

// ============================================================================
// Router Configuration
// ============================================================================

/// Complete router configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Classifier confidence floor
    pub confidence_floor: f32,
    /// Ambiguity epsilon for multi-system routing
    pub ambiguity_epsilon: f32,
    /// Composite score weights
    pub weights: ScoringWeights,
    /// Latency at which the latency penalty saturates
    pub latency_ceiling_ms: f64,
    /// Performance tracker settings
    pub performance: PerformanceConfig,
    /// Shared deadline for parallel multi-backend reads
    pub read_deadline_ms: u64,
    /// Per-backend settings
    pub backends: BackendTable,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
            ambiguity_epsilon: DEFAULT_AMBIGUITY_EPSILON,
            weights: ScoringWeights::default(),
            latency_ceiling_ms: DEFAULT_LATENCY_CEILING_MS,
            performance: PerformanceConfig::default(),
            read_deadline_ms: DEFAULT_READ_DEADLINE_MS,
            backends: BackendTable::default(),
        }
    }
}

impl RouterConfig {
    /// Timeout for calls to a backend
    #[must_use]
    pub fn timeout_for(&self, backend: BackendId) -> Duration {
        self.backends.get(backend).timeout()
    }

    /// Shared deadline budget for parallel reads
    #[must_use]
    pub fn read_deadline(&self) -> Duration {
        Duration::from_millis(self.read_deadline_ms)
    }

    /// Enabled backends in canonical priority order
    #[must_use]
    pub fn enabled_backends(&self) -> Vec<BackendId> {
        BackendId::ALL
            .into_iter()
            .filter(|b| self.backends.get(*b).enabled)
            .collect()
    }

    /// Disable a backend (builder style)
    #[must_use]
    pub fn with_backend_disabled(mut self, backend: BackendId) -> Self {
        self.backends.get_mut(backend).enabled = false;
        self
    }

    /// Set a backend timeout (builder style)
    #[must_use]
    pub fn with_backend_timeout(mut self, backend: BackendId, timeout: Duration) -> Self {
        self.backends.get_mut(backend).timeout_ms =
            u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Check that the configuration can drive a router
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled_backends().is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one backend must be enabled".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_floor) {
            return Err(ConfigError::ValidationError(format!(
                "confidence_floor must be within [0, 1], got {}",
                self.confidence_floor
            )));
        }
        if self.ambiguity_epsilon < 0.0 {
            return Err(ConfigError::ValidationError(
                "ambiguity_epsilon must not be negative".to_string(),
            ));
        }
        let w = &self.weights;
        if [w.intent, w.entity, w.performance, w.latency, w.context]
            .iter()
            .any(|v| *v < 0.0 || !v.is_finite())
        {
            return Err(ConfigError::ValidationError(
                "scoring weights must be finite and non-negative".to_string(),
            ));
        }
        if !(self.latency_ceiling_ms.is_finite() && self.latency_ceiling_ms > 0.0) {
            return Err(ConfigError::ValidationError(
                "latency_ceiling_ms must be finite and positive".to_string(),
            ));
        }
        if self.performance.window_size == 0 {
            return Err(ConfigError::ValidationError(
                "performance.window_size must be at least 1".to_string(),
            ));
        }
        for backend in BackendId::ALL {
            if self.backends.get(backend).timeout_ms == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "backends.{backend}.timeout_ms must be positive"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RouterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.enabled_backends(), BackendId::ALL.to_vec());
        assert_eq!(config.performance.window_size, 100);
    }

    #[test]
    fn test_disabled_backends_are_excluded() {
        let config = RouterConfig::default().with_backend_disabled(BackendId::Document);
        assert_eq!(
            config.enabled_backends(),
            vec![BackendId::Graph, BackendId::SemanticMemory]
        );
    }

    #[test]
    fn test_all_disabled_is_rejected() {
        let config = RouterConfig::default()
            .with_backend_disabled(BackendId::Graph)
            .with_backend_disabled(BackendId::Document)
            .with_backend_disabled(BackendId::SemanticMemory);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = RouterConfig::default();
        config.confidence_floor = 1.5;
        assert!(config.validate().is_err());

        let mut config = RouterConfig::default();
        config.weights.entity = -0.1;
        assert!(config.validate().is_err());

        let mut config = RouterConfig::default();
        config.performance.window_size = 0;
        assert!(config.validate().is_err());

        let mut config = RouterConfig::default();
        config.weights.context = f32::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_latency_ceiling_must_be_a_positive_number() {
        for ceiling in [f64::NAN, f64::INFINITY, 0.0, -5.0] {
            let mut config = RouterConfig::default();
            config.latency_ceiling_ms = ceiling;
            assert!(
                matches!(config.validate(), Err(ConfigError::ValidationError(_))),
                "ceiling {ceiling} accepted"
            );
        }
    }

    #[test]
    fn test_backend_timeout_builder() {
        let config = RouterConfig::default()
            .with_backend_timeout(BackendId::Graph, Duration::from_millis(250));
        assert_eq!(config.timeout_for(BackendId::Graph), Duration::from_millis(250));
        assert_eq!(
            config.timeout_for(BackendId::Document),
            Duration::from_millis(DEFAULT_BACKEND_TIMEOUT_MS)
        );
    }
}
