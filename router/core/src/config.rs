//! TOML Configuration File Support
//!
//! Configuration loading for the memory router, supporting a TOML file at
//! `~/.config/memory-router/router.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/memory-router/router.toml` (typically `~/.config/memory-router/router.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [routing]
//! confidence_floor = 0.3
//! ambiguity_epsilon = 0.05
//! latency_ceiling_ms = 1000.0
//!
//! [routing.weights]
//! intent = 0.5
//! entity = 0.2
//! performance = 0.2
//! latency = 0.1
//! context = 0.5
//!
//! [performance]
//! window_size = 100
//! baseline_latency_ms = 100.0
//! slow_operation_ms = 1000
//!
//! [coordinator]
//! read_deadline_ms = 2000
//!
//! [backends.graph]
//! enabled = true
//! timeout_ms = 5000
//! url = "http://localhost:8001"
//!
//! [backends.document]
//! enabled = false
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendId;
use crate::routing::RouterConfig;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Scoring weights table under `[routing.weights]`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightsToml {
    /// Intent affinity weight
    pub intent: Option<f32>,
    /// Entity affinity weight
    pub entity: Option<f32>,
    /// Success-rate weight
    pub performance: Option<f32>,
    /// Latency penalty weight
    pub latency: Option<f32>,
    /// Context adjustment weight
    pub context: Option<f32>,
}

/// Routing section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingToml {
    /// Classifier confidence floor
    pub confidence_floor: Option<f32>,

    /// Top-two score gap treated as ambiguous
    pub ambiguity_epsilon: Option<f32>,

    /// Latency at which the latency penalty saturates
    pub latency_ceiling_ms: Option<f64>,

    /// Composite score weights
    pub weights: WeightsToml,
}

/// Performance section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceToml {
    /// Rolling window size per backend
    pub window_size: Option<usize>,

    /// Latency reported for backends without samples
    pub baseline_latency_ms: Option<f64>,

    /// Slow-operation threshold
    pub slow_operation_ms: Option<u64>,
}

/// Coordinator section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorToml {
    /// Shared deadline for parallel reads
    pub read_deadline_ms: Option<u64>,
}

/// One `[backends.<name>]` table
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// Whether the backend may be used
    pub enabled: Option<bool>,

    /// Per-call timeout
    pub timeout_ms: Option<u64>,

    /// Base URL for the HTTP adapter
    pub url: Option<String>,
}

/// The `[backends]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendsToml {
    /// Graph store
    pub graph: BackendToml,
    /// Document store
    pub document: BackendToml,
    /// Semantic memory store
    pub semantic_memory: BackendToml,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterToml {
    /// Routing configuration section
    pub routing: RoutingToml,

    /// Performance tracking section
    pub performance: PerformanceToml,

    /// Multi-system coordination section
    pub coordinator: CoordinatorToml,

    /// Per-backend sections
    pub backends: BackendsToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Loaded router configuration with provenance
#[derive(Clone, Debug, Default)]
pub struct RouterConfigFile {
    /// Effective router configuration
    pub router: RouterConfig,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl RouterConfigFile {
    /// Create a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/memory-router/router.toml` or
/// `~/.config/memory-router/router.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("memory-router").join("router.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the resulting configuration is invalid. A missing file is not an error.
pub fn load_config() -> Result<RouterConfigFile, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the resulting configuration is invalid.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<RouterConfigFile, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration using `env` to look up environment variables
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env<F>(
    path: Option<PathBuf>,
    env: F,
) -> Result<RouterConfigFile, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = RouterConfigFile::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: RouterToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.router.validate()?;

    Ok(config)
}

fn apply_backend_toml(config: &mut RouterConfig, backend: BackendId, toml: &BackendToml) {
    let settings = config.backends.get_mut(backend);
    if let Some(enabled) = toml.enabled {
        settings.enabled = enabled;
    }
    if let Some(timeout) = toml.timeout_ms {
        settings.timeout_ms = timeout;
    }
    if toml.url.is_some() {
        settings.url = toml.url.clone();
    }
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut RouterConfigFile, toml: &RouterToml) {
    let router = &mut config.router;

    // Routing settings
    if let Some(floor) = toml.routing.confidence_floor {
        router.confidence_floor = floor;
    }
    if let Some(epsilon) = toml.routing.ambiguity_epsilon {
        router.ambiguity_epsilon = epsilon;
    }
    if let Some(ceiling) = toml.routing.latency_ceiling_ms {
        router.latency_ceiling_ms = ceiling;
    }
    if let Some(w) = toml.routing.weights.intent {
        router.weights.intent = w;
    }
    if let Some(w) = toml.routing.weights.entity {
        router.weights.entity = w;
    }
    if let Some(w) = toml.routing.weights.performance {
        router.weights.performance = w;
    }
    if let Some(w) = toml.routing.weights.latency {
        router.weights.latency = w;
    }
    if let Some(w) = toml.routing.weights.context {
        router.weights.context = w;
    }

    // Performance settings
    if let Some(size) = toml.performance.window_size {
        router.performance.window_size = size;
    }
    if let Some(baseline) = toml.performance.baseline_latency_ms {
        router.performance.baseline_latency_ms = baseline;
    }
    if let Some(slow) = toml.performance.slow_operation_ms {
        router.performance.slow_operation_ms = slow;
    }

    // Coordinator settings
    if let Some(deadline) = toml.coordinator.read_deadline_ms {
        router.read_deadline_ms = deadline;
    }

    // Backend settings
    apply_backend_toml(router, BackendId::Graph, &toml.backends.graph);
    apply_backend_toml(router, BackendId::Document, &toml.backends.document);
    apply_backend_toml(
        router,
        BackendId::SemanticMemory,
        &toml.backends.semantic_memory,
    );
}

/// Environment variable prefix per backend
fn env_prefix(backend: BackendId) -> &'static str {
    match backend {
        BackendId::Graph => "MEMORY_ROUTER_GRAPH",
        BackendId::Document => "MEMORY_ROUTER_DOCUMENT",
        BackendId::SemanticMemory => "MEMORY_ROUTER_SEMANTIC",
    }
}

fn parse_flag(value: &str) -> bool {
    value != "0" && !value.eq_ignore_ascii_case("false")
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut RouterConfigFile, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    for backend in BackendId::ALL {
        let prefix = env_prefix(backend);
        if let Some(enabled) = env(&format!("{prefix}_ENABLED")) {
            config.router.backends.get_mut(backend).enabled = parse_flag(&enabled);
            config.source = ConfigSource::Env;
        }
        if let Some(url) = env(&format!("{prefix}_URL")) {
            config.router.backends.get_mut(backend).url = Some(url);
            config.source = ConfigSource::Env;
        }
    }

    if let Some(deadline) = env("MEMORY_ROUTER_READ_DEADLINE_MS") {
        if let Ok(ms) = deadline.parse::<u64>() {
            config.router.read_deadline_ms = ms;
            config.source = ConfigSource::Env;
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Backends to disable
    pub disabled_backends: Vec<BackendId>,

    /// Backend URL overrides
    pub urls: Vec<(BackendId, String)>,

    /// Confidence floor override
    pub confidence_floor: Option<f32>,

    /// Parallel read deadline override (milliseconds)
    pub read_deadline_ms: Option<u64>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable a backend
    #[must_use]
    pub fn with_backend_disabled(mut self, backend: BackendId) -> Self {
        self.disabled_backends.push(backend);
        self
    }

    /// Override a backend URL
    #[must_use]
    pub fn with_url(mut self, backend: BackendId, url: impl Into<String>) -> Self {
        self.urls.push((backend, url.into()));
        self
    }

    /// Override the confidence floor
    #[must_use]
    pub fn with_confidence_floor(mut self, floor: f32) -> Self {
        self.confidence_floor = Some(floor);
        self
    }

    /// Override the parallel read deadline
    #[must_use]
    pub fn with_read_deadline_ms(mut self, ms: u64) -> Self {
        self.read_deadline_ms = Some(ms);
        self
    }

    /// Whether any override is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.disabled_backends.is_empty()
            && self.urls.is_empty()
            && self.confidence_floor.is_none()
            && self.read_deadline_ms.is_none()
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the result is invalid.
    pub fn apply(&self, config: &mut RouterConfigFile) -> Result<(), ConfigError> {
        if !self.is_empty() {
            config.source = ConfigSource::Cli;
        }

        for backend in &self.disabled_backends {
            config.router.backends.get_mut(*backend).enabled = false;
        }
        for (backend, url) in &self.urls {
            config.router.backends.get_mut(*backend).url = Some(url.clone());
        }
        if let Some(floor) = self.confidence_floor {
            config.router.confidence_floor = floor;
        }
        if let Some(ms) = self.read_deadline_ms {
            config.router.read_deadline_ms = ms;
        }

        config.router.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.to_string_lossy().contains("memory-router"));
            assert!(p.to_string_lossy().ends_with("router.toml"));
        }
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config =
            load_config_with_env(Some(PathBuf::from("/nonexistent/router.toml")), no_env).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
        assert_eq!(config.router, RouterConfig::default());
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_parse_valid_toml() {
        let file = write_toml(
            r#"
[routing]
confidence_floor = 0.4
ambiguity_epsilon = 0.1

[routing.weights]
intent = 0.6
context = 0.25

[performance]
window_size = 50
slow_operation_ms = 250

[coordinator]
read_deadline_ms = 900

[backends.document]
enabled = false
timeout_ms = 1200
url = "http://docs.internal:9000"
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();
        let router = &config.router;
        assert_eq!(config.source(), ConfigSource::File);
        assert!((router.confidence_floor - 0.4).abs() < f32::EPSILON);
        assert!((router.ambiguity_epsilon - 0.1).abs() < f32::EPSILON);
        assert!((router.weights.intent - 0.6).abs() < f32::EPSILON);
        assert!((router.weights.entity - 0.2).abs() < f32::EPSILON);
        assert!((router.weights.context - 0.25).abs() < f32::EPSILON);
        assert_eq!(router.performance.window_size, 50);
        assert_eq!(router.performance.slow_operation_ms, 250);
        assert_eq!(router.read_deadline_ms, 900);
        assert!(!router.backends.document.enabled);
        assert_eq!(router.backends.document.timeout_ms, 1200);
        assert_eq!(
            router.backends.document.url.as_deref(),
            Some("http://docs.internal:9000")
        );
        assert!(router.backends.graph.enabled);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let file = write_toml("[routing\nconfidence_floor = ");
        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_all_backends_disabled_is_rejected() {
        let file = write_toml(
            r"
[backends.graph]
enabled = false
[backends.document]
enabled = false
[backends.semantic_memory]
enabled = false
",
        );
        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_toml(
            r#"
[backends.graph]
url = "http://from-file:1"
"#,
        );
        let env: HashMap<&str, &str> = HashMap::from([
            ("MEMORY_ROUTER_GRAPH_URL", "http://from-env:2"),
            ("MEMORY_ROUTER_DOCUMENT_ENABLED", "false"),
            ("MEMORY_ROUTER_READ_DEADLINE_MS", "750"),
        ]);
        let config = load_config_with_env(Some(file.path().to_path_buf()), |k| {
            env.get(k).map(|v| (*v).to_string())
        })
        .unwrap();

        assert_eq!(config.source(), ConfigSource::Env);
        assert_eq!(
            config.router.backends.graph.url.as_deref(),
            Some("http://from-env:2")
        );
        assert!(!config.router.backends.document.enabled);
        assert_eq!(config.router.read_deadline_ms, 750);
    }

    #[test]
    fn test_cli_overrides_apply_last() {
        let mut config = RouterConfigFile::default();
        ConfigOverrides::new()
            .with_backend_disabled(BackendId::SemanticMemory)
            .with_url(BackendId::Graph, "http://cli:3")
            .with_read_deadline_ms(100)
            .apply(&mut config)
            .unwrap();

        assert_eq!(config.source(), ConfigSource::Cli);
        assert!(!config.router.backends.semantic_memory.enabled);
        assert_eq!(config.router.backends.graph.url.as_deref(), Some("http://cli:3"));
        assert_eq!(config.router.read_deadline_ms, 100);
    }

    #[test]
    fn test_cli_overrides_are_validated() {
        let mut config = RouterConfigFile::default();
        let result = ConfigOverrides::new().with_confidence_floor(2.0).apply(&mut config);
        assert!(result.is_err());
    }

    #[test]
    fn test_flag_parsing() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("FALSE"));
    }
}
