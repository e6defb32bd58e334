//! Memory Router
//!
//! The main entry point for routing memory operations. Wires the routing
//! engine, fallback executor and multi-system coordinator around one
//! performance tracker and one telemetry sink.
//!
//! # Usage
//!
//! ```ignore
//! let router = MemoryRouter::builder(RouterConfig::default())
//!     .with_adapter(BackendId::Graph, Arc::new(HttpBackend::new("http://localhost:8001")))
//!     .with_adapter(BackendId::Document, Arc::new(HttpBackend::new("http://localhost:8080")))
//!     .build()?;
//!
//! let outcome = router
//!     .store_data(json!({"title": "API"}), "Create documentation for the API", ContextHints::new())
//!     .await?;
//! ```

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::config::RouterConfig;
use super::coordinator::MultiSystemCoordinator;
use super::fallback::{AdapterRegistry, ExecutionOutcome, FallbackExecutor};
use super::intent::SCORING_TABLE_VERSION;
use super::metrics::{BackendStats, PerformanceTracker};
use super::policy::{ContextHints, RoutingDecision, RoutingEngine, RoutingRequest};
use crate::backend::{BackendId, MemoryBackend, Operation};
use crate::error::RouterError;
use crate::events::{TelemetryEvent, TelemetrySink, TracingSink};

// ============================================================================
// Results
// ============================================================================

/// A decision together with what executing it produced
#[derive(Clone, Debug, Serialize)]
pub struct RoutedExecution {
    /// How the request was routed
    pub decision: RoutingDecision,
    /// What execution produced
    pub outcome: ExecutionOutcome,
}

/// Router statistics
#[derive(Clone, Debug, Serialize)]
pub struct RouterStats {
    /// Version of the intent scoring table in use
    pub scoring_table_version: u32,
    /// Backends that can be routed to
    pub available_backends: Vec<BackendId>,
    /// Per-backend windowed metrics and lifetime counters
    pub backends: Vec<BackendStats>,
    /// Samples recorded across all backends
    pub total_samples: u64,
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`MemoryRouter`]
pub struct MemoryRouterBuilder {
    config: RouterConfig,
    adapters: AdapterRegistry,
    telemetry: Option<Arc<dyn TelemetrySink>>,
}

impl MemoryRouterBuilder {
    /// Register the adapter for a backend
    #[must_use]
    pub fn with_adapter(mut self, backend: BackendId, adapter: Arc<dyn MemoryBackend>) -> Self {
        self.adapters.insert(backend, adapter);
        self
    }

    /// Send telemetry to `sink` instead of `tracing`
    #[must_use]
    pub fn with_telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    /// Validate the configuration and assemble the router
    ///
    /// Enabled backends without an adapter are treated as disabled.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Config`] for invalid configuration and
    /// [`RouterError::NoBackendsAvailable`] when nothing can be routed to.
    pub fn build(self) -> Result<MemoryRouter, RouterError> {
        self.config.validate()?;

        let mut available = Vec::new();
        for backend in self.config.enabled_backends() {
            if self.adapters.contains(backend) {
                available.push(backend);
            } else {
                warn!(backend = %backend, "Backend enabled but no adapter registered; skipping");
            }
        }

        let tracker = Arc::new(PerformanceTracker::new(self.config.performance));
        let telemetry = self
            .telemetry
            .unwrap_or_else(|| Arc::new(TracingSink) as Arc<dyn TelemetrySink>);

        let engine = RoutingEngine::new(self.config.clone(), Arc::clone(&tracker), available)?;
        let executor = Arc::new(FallbackExecutor::new(
            self.adapters,
            Arc::clone(&tracker),
            Arc::clone(&telemetry),
            self.config.clone(),
        ));
        let coordinator =
            MultiSystemCoordinator::new(Arc::clone(&executor), self.config.read_deadline());

        info!(
            backends = ?engine.available_backends(),
            scoring_table_version = SCORING_TABLE_VERSION,
            "Memory router ready"
        );

        Ok(MemoryRouter {
            config: self.config,
            engine,
            coordinator,
            tracker,
            telemetry,
        })
    }
}

// ============================================================================
// Memory Router
// ============================================================================

/// Routes memory operations to the best backend(s)
pub struct MemoryRouter {
    config: RouterConfig,
    engine: RoutingEngine,
    coordinator: MultiSystemCoordinator,
    tracker: Arc<PerformanceTracker>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl MemoryRouter {
    /// Start building a router
    #[must_use]
    pub fn builder(config: RouterConfig) -> MemoryRouterBuilder {
        MemoryRouterBuilder {
            config,
            adapters: AdapterRegistry::new(),
            telemetry: None,
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Performance tracker owned by this router
    #[must_use]
    pub fn performance(&self) -> &PerformanceTracker {
        &self.tracker
    }

    /// Route without executing
    #[must_use]
    pub fn route(&self, request: &RoutingRequest) -> RoutingDecision {
        let decision = self.engine.route(request);

        if decision.intent.confidence < self.config.confidence_floor {
            self.telemetry.emit(TelemetryEvent::unknown_pattern(
                request.request_id.clone(),
                &request.content,
            ));
        }
        self.telemetry.emit(TelemetryEvent::RoutingDecided {
            request_id: decision.request_id.clone(),
            category: decision.intent.category,
            confidence: decision.intent.confidence,
            primary: decision.primary,
            fallback_order: decision.fallback_order.clone(),
            is_multi_system: decision.is_multi_system,
        });

        decision
    }

    /// Route and execute a request
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::AllBackendsExhausted`] when no backend succeeded.
    pub async fn execute(
        &self,
        request: &RoutingRequest,
        payload: &Value,
    ) -> Result<RoutedExecution, RouterError> {
        let decision = self.route(request);
        let outcome = self
            .coordinator
            .execute_multi(&decision, request.operation, payload)
            .await?;
        Ok(RoutedExecution { decision, outcome })
    }

    /// Store a payload where `text` says it belongs
    ///
    /// An empty `text` is derived from the payload.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::AllBackendsExhausted`] when no backend accepted the write.
    pub async fn store_data(
        &self,
        payload: Value,
        text: &str,
        hints: ContextHints,
    ) -> Result<ExecutionOutcome, RouterError> {
        let request = RoutingRequest::new(Operation::Store, request_text(text, &payload))
            .with_hints(hints);
        Ok(self.execute(&request, &payload).await?.outcome)
    }

    /// Retrieve using `query` from wherever `text` points
    ///
    /// An empty `text` is derived from the query.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::AllBackendsExhausted`] when no backend answered.
    pub async fn retrieve_data(
        &self,
        query: Value,
        text: &str,
        hints: ContextHints,
    ) -> Result<ExecutionOutcome, RouterError> {
        let request = RoutingRequest::new(Operation::Retrieve, request_text(text, &query))
            .with_hints(hints);
        Ok(self.execute(&request, &query).await?.outcome)
    }

    /// Current routing statistics
    #[must_use]
    pub fn stats(&self) -> RouterStats {
        RouterStats {
            scoring_table_version: SCORING_TABLE_VERSION,
            available_backends: self.engine.available_backends().to_vec(),
            backends: self.tracker.snapshot(),
            total_samples: self.tracker.total_samples(),
        }
    }
}

/// Explicit text, else a `content`/`text`/`query` field, else the JSON itself
fn request_text(text: &str, payload: &Value) -> String {
    if !text.trim().is_empty() {
        return text.to_string();
    }
    ["content", "text", "query"]
        .iter()
        .find_map(|k| payload.get(*k).and_then(Value::as_str))
        .map_or_else(|| payload.to_string(), str::to_string)
}
