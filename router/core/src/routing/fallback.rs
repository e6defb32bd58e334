//! Fallback Execution
//!
//! Runs a routing decision against real adapters, walking the fallback
//! chain until one backend succeeds or every candidate has failed.
//!
//! # State Machine
//!
//! ```text
//! Pending
//!    |
//!    v
//! Trying(primary) --ok--> Success(primary)
//!    | fail
//!    v
//! Trying(fallback 1) --ok--> Success(fallback 1)
//!    | fail
//!    v
//!   ...
//!    | fail (nothing left)
//!    v
//! Exhausted -> RouterError::AllBackendsExhausted
//! ```
//!
//! Every attempt is bounded by the backend's configured timeout and records
//! exactly one performance sample once it resolves. A backend is never
//! attempted twice for the same request.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::config::RouterConfig;
use super::metrics::PerformanceTracker;
use super::policy::RoutingDecision;
use crate::backend::{AdapterError, BackendId, MemoryBackend, Operation};
use crate::error::{BackendFailure, RouterError};
use crate::events::{TelemetryEvent, TelemetrySink};

// ============================================================================
// Adapter Registry
// ============================================================================

/// Adapters registered per backend
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<BackendId, Arc<dyn MemoryBackend>>,
}

impl AdapterRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the adapter for a backend
    pub fn insert(&mut self, backend: BackendId, adapter: Arc<dyn MemoryBackend>) {
        self.adapters.insert(backend, adapter);
    }

    /// Adapter for a backend
    #[must_use]
    pub fn get(&self, backend: BackendId) -> Option<&Arc<dyn MemoryBackend>> {
        self.adapters.get(&backend)
    }

    /// Whether a backend has an adapter
    #[must_use]
    pub fn contains(&self, backend: BackendId) -> bool {
        self.adapters.contains_key(&backend)
    }

    /// Backends with adapters, in priority order
    #[must_use]
    pub fn backends(&self) -> Vec<BackendId> {
        self.adapters.keys().copied().collect()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.adapters.iter().map(|(b, a)| (b, a.name())))
            .finish()
    }
}

// ============================================================================
// Execution State
// ============================================================================

/// Where a request is in the fallback chain
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionState {
    /// Nothing attempted yet
    Pending,
    /// Waiting on a backend
    Trying(BackendId),
    /// A backend succeeded
    Success(BackendId),
    /// Every candidate failed
    Exhausted,
}

/// Tracks attempts for one request
#[derive(Clone, Debug)]
pub struct FallbackContext {
    /// Backend the decision ranked first
    pub original: BackendId,
    /// Backends attempted so far, in order
    pub tried: Vec<BackendId>,
    /// Current state
    pub state: ExecutionState,
}

impl FallbackContext {
    /// Start tracking a request whose decision ranked `original` first
    #[must_use]
    pub fn new(original: BackendId) -> Self {
        Self {
            original,
            tried: Vec::new(),
            state: ExecutionState::Pending,
        }
    }

    /// Move to `Trying(backend)`
    pub fn try_backend(&mut self, backend: BackendId) {
        self.tried.push(backend);
        self.state = ExecutionState::Trying(backend);
    }

    /// Whether a backend was already attempted
    #[must_use]
    pub fn has_tried(&self, backend: BackendId) -> bool {
        self.tried.contains(&backend)
    }

    /// Whether the current attempt is not the original backend
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self.state, ExecutionState::Trying(b) | ExecutionState::Success(b) if b != self.original)
    }

    /// Number of attempts beyond the first
    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.tried.len().saturating_sub(1)
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// Result of executing a routed request
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExecutionOutcome {
    /// Backend whose result was returned
    pub used_backend: BackendId,
    /// Backend result (merged for multi-system reads)
    pub result: Value,
    /// Whether the answer came from a backend other than the primary
    pub used_fallback: bool,
    /// Every backend attempted, in order
    pub attempted_backends: Vec<BackendId>,
    /// Secondaries whose results were merged in
    pub supplementary_backends: Vec<BackendId>,
    /// Secondaries the write is being propagated to
    pub propagated_to: Vec<BackendId>,
}

// ============================================================================
// Fallback Executor
// ============================================================================

/// Executes decisions with deterministic fallback
pub struct FallbackExecutor {
    adapters: AdapterRegistry,
    tracker: Arc<PerformanceTracker>,
    telemetry: Arc<dyn TelemetrySink>,
    config: RouterConfig,
}

impl FallbackExecutor {
    /// Create an executor
    pub fn new(
        adapters: AdapterRegistry,
        tracker: Arc<PerformanceTracker>,
        telemetry: Arc<dyn TelemetrySink>,
        config: RouterConfig,
    ) -> Self {
        Self {
            adapters,
            tracker,
            telemetry,
            config,
        }
    }

    /// Performance tracker samples are recorded into
    #[must_use]
    pub fn tracker(&self) -> &Arc<PerformanceTracker> {
        &self.tracker
    }

    pub(crate) fn emit(&self, event: TelemetryEvent) {
        self.telemetry.emit(event);
    }

    /// Execute the decision's candidates in order until one succeeds
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::AllBackendsExhausted`] when every candidate fails.
    pub async fn execute(
        &self,
        decision: &RoutingDecision,
        operation: Operation,
        payload: &Value,
    ) -> Result<ExecutionOutcome, RouterError> {
        self.execute_chain(
            &decision.request_id,
            decision.primary,
            &decision.candidates(),
            operation,
            payload,
            Vec::new(),
        )
        .await
    }

    /// Walk `chain` sequentially, continuing after earlier `prior` failures
    pub(crate) async fn execute_chain(
        &self,
        request_id: &str,
        original: BackendId,
        chain: &[BackendId],
        operation: Operation,
        payload: &Value,
        prior: Vec<BackendFailure>,
    ) -> Result<ExecutionOutcome, RouterError> {
        let mut ctx = FallbackContext::new(original);
        for failure in &prior {
            ctx.tried.push(failure.backend);
        }
        let mut failures = prior;

        let mut pending: Vec<BackendId> = Vec::with_capacity(chain.len());
        for backend in chain {
            if !ctx.has_tried(*backend) && !pending.contains(backend) {
                pending.push(*backend);
            }
        }

        for (i, backend) in pending.iter().copied().enumerate() {
            ctx.try_backend(backend);
            debug!(request_id, backend = %backend, attempt = ctx.tried.len(), "Trying backend");

            match self.attempt(request_id, backend, operation, payload).await {
                Ok(result) => {
                    ctx.state = ExecutionState::Success(backend);
                    return Ok(ExecutionOutcome {
                        used_backend: backend,
                        result,
                        used_fallback: backend != original,
                        attempted_backends: ctx.tried,
                        supplementary_backends: Vec::new(),
                        propagated_to: Vec::new(),
                    });
                }
                Err(failure) => {
                    let next = pending.get(i + 1).copied();
                    let remaining = pending.len() - i - 1;
                    warn!(
                        request_id,
                        backend = %backend,
                        error = %failure.error,
                        remaining,
                        "Backend attempt failed"
                    );
                    self.emit(TelemetryEvent::BackendFailed {
                        request_id: request_id.to_string(),
                        backend,
                        error: failure.error.to_string(),
                        remaining,
                    });
                    failures.push(failure);

                    if let Some(next) = next {
                        self.emit(TelemetryEvent::FallbackUsed {
                            request_id: request_id.to_string(),
                            from: backend,
                            to: next,
                        });
                    }
                }
            }
        }

        ctx.state = ExecutionState::Exhausted;
        error!(
            request_id,
            attempted = ctx.tried.len(),
            "All backends exhausted"
        );
        self.emit(TelemetryEvent::AllBackendsExhausted {
            request_id: request_id.to_string(),
            attempts: failures
                .iter()
                .map(|f| (f.backend, f.error.to_string()))
                .collect(),
        });

        Err(RouterError::AllBackendsExhausted {
            request_id: request_id.to_string(),
            attempts: failures,
        })
    }

    /// One bounded call to one backend, recorded as exactly one sample
    pub(crate) async fn attempt(
        &self,
        request_id: &str,
        backend: BackendId,
        operation: Operation,
        payload: &Value,
    ) -> Result<Value, BackendFailure> {
        let (outcome, latency_ms) = self.call(request_id, backend, operation, payload).await;
        outcome.map_err(|error| BackendFailure {
            backend,
            error,
            latency_ms,
        })
    }

    async fn call(
        &self,
        request_id: &str,
        backend: BackendId,
        operation: Operation,
        payload: &Value,
    ) -> (Result<Value, AdapterError>, u64) {
        let timeout = self.config.timeout_for(backend);
        let started = Instant::now();

        let outcome = match self.adapters.get(backend) {
            Some(adapter) => {
                match tokio::time::timeout(timeout, adapter.invoke(operation, payload, timeout))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(AdapterError::Timeout(timeout)),
                }
            }
            None => Err(AdapterError::Unavailable(format!(
                "no adapter registered for {backend}"
            ))),
        };

        let latency_ms = elapsed_ms(started);
        self.record(request_id, backend, outcome.is_ok(), latency_ms);
        (outcome, latency_ms)
    }

    /// Record a sample and flag slow calls
    pub(crate) fn record(&self, request_id: &str, backend: BackendId, success: bool, latency_ms: u64) {
        self.tracker.record(backend, success, latency_ms);
        if latency_ms > self.config.performance.slow_operation_ms {
            self.emit(TelemetryEvent::SlowOperation {
                request_id: request_id.to_string(),
                backend,
                latency_ms,
            });
        }
    }

    /// Send a write to a secondary; outcome goes to telemetry only
    pub(crate) async fn propagate(&self, request_id: &str, backend: BackendId, payload: &Value) {
        let (outcome, latency_ms) = self
            .call(request_id, backend, Operation::Store, payload)
            .await;
        match outcome {
            Ok(_) => {
                debug!(request_id, backend = %backend, latency_ms, "Propagated write");
                self.emit(TelemetryEvent::PropagationSucceeded {
                    request_id: request_id.to_string(),
                    backend,
                    latency_ms,
                });
            }
            Err(error) => {
                warn!(
                    request_id,
                    backend = %backend,
                    error = %error,
                    "Write propagation failed"
                );
                self.emit(TelemetryEvent::PropagationFailed {
                    request_id: request_id.to_string(),
                    backend,
                    error: error.to_string(),
                });
            }
        }
    }
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
