//! Multi-System Coordination
//!
//! Handles decisions that involve more than one backend.
//!
//! ```text
//! Retrieve (multi)                         Store (multi)
//! ----------------                         -------------
//! primary + secondaries in parallel        FallbackExecutor (sync)
//!   under one shared deadline                    |
//!         |                                      v
//!   merge: primary keys win,               spawn propagation to each
//!   secondary results -> _supplementary    secondary (detached)
//!         |
//!   all failed? walk remaining fallbacks
//! ```
//!
//! Single-system decisions go straight to the [`FallbackExecutor`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::fallback::{duration_ms, elapsed_ms, ExecutionOutcome, FallbackExecutor};
use super::policy::RoutingDecision;
use crate::backend::{AdapterError, BackendId, Operation};
use crate::error::{BackendFailure, RouterError};
use crate::events::TelemetryEvent;

/// Key under which secondary results are attached
pub const SUPPLEMENTARY_KEY: &str = "_supplementary";

/// Coordinates parallel reads and write propagation
pub struct MultiSystemCoordinator {
    executor: Arc<FallbackExecutor>,
    read_deadline: Duration,
}

impl MultiSystemCoordinator {
    /// Create a coordinator over an executor
    pub fn new(executor: Arc<FallbackExecutor>, read_deadline: Duration) -> Self {
        Self {
            executor,
            read_deadline,
        }
    }

    /// Execute a decision, fanning out when it is multi-system
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::AllBackendsExhausted`] when no backend produced a result.
    pub async fn execute_multi(
        &self,
        decision: &RoutingDecision,
        operation: Operation,
        payload: &Value,
    ) -> Result<ExecutionOutcome, RouterError> {
        if !decision.is_multi_system || decision.secondaries.is_empty() {
            return self.executor.execute(decision, operation, payload).await;
        }

        if operation.is_write() {
            self.store_and_propagate(decision, payload).await
        } else {
            self.parallel_read(decision, payload).await
        }
    }

    async fn parallel_read(
        &self,
        decision: &RoutingDecision,
        payload: &Value,
    ) -> Result<ExecutionOutcome, RouterError> {
        let request_id = decision.request_id.clone();
        let deadline = tokio::time::Instant::now() + self.read_deadline;
        let read_deadline = self.read_deadline;

        let participants: Vec<BackendId> = std::iter::once(decision.primary)
            .chain(decision.secondaries.iter().copied())
            .collect();

        debug!(
            request_id = %request_id,
            participants = participants.len(),
            deadline_ms = duration_ms(read_deadline),
            "Starting parallel read"
        );

        let handles: Vec<_> = participants
            .iter()
            .map(|backend| {
                let backend = *backend;
                let executor = Arc::clone(&self.executor);
                let payload = payload.clone();
                let request_id = request_id.clone();
                tokio::spawn(async move {
                    let started = Instant::now();
                    let attempt = executor.attempt(&request_id, backend, Operation::Retrieve, &payload);
                    match tokio::time::timeout_at(deadline, attempt).await {
                        Ok(result) => result,
                        Err(_) => {
                            // Cancelled before the attempt could record itself
                            let latency_ms = elapsed_ms(started);
                            executor.record(&request_id, backend, false, latency_ms);
                            Err(BackendFailure {
                                backend,
                                error: AdapterError::Timeout(read_deadline),
                                latency_ms,
                            })
                        }
                    }
                })
            })
            .collect();

        let joined = futures::future::join_all(handles).await;

        let mut successes: Vec<(BackendId, Value)> = Vec::new();
        let mut failures: Vec<BackendFailure> = Vec::new();
        for (backend, joined) in participants.iter().copied().zip(joined) {
            match joined {
                Ok(Ok(value)) => successes.push((backend, value)),
                Ok(Err(failure)) => failures.push(failure),
                Err(join_error) => failures.push(BackendFailure {
                    backend,
                    error: AdapterError::Transport(format!("read task failed: {join_error}")),
                    latency_ms: 0,
                }),
            }
        }

        let unused_fallbacks: Vec<BackendId> = decision
            .fallback_order
            .iter()
            .copied()
            .filter(|b| !participants.contains(b))
            .collect();
        for failure in &failures {
            self.executor.emit(TelemetryEvent::BackendFailed {
                request_id: request_id.clone(),
                backend: failure.backend,
                error: failure.error.to_string(),
                remaining: successes.len() + unused_fallbacks.len(),
            });
        }

        if successes.is_empty() {
            let remaining = unused_fallbacks;
            info!(
                request_id = %request_id,
                remaining = remaining.len(),
                "Parallel read failed everywhere, walking remaining fallbacks"
            );
            return self
                .executor
                .execute_chain(
                    &request_id,
                    decision.primary,
                    &remaining,
                    Operation::Retrieve,
                    payload,
                    failures,
                )
                .await;
        }

        let (used_backend, base) = successes.remove(0);
        let used_fallback = used_backend != decision.primary;
        if used_fallback {
            self.executor.emit(TelemetryEvent::FallbackUsed {
                request_id: request_id.clone(),
                from: decision.primary,
                to: used_backend,
            });
        }

        let supplementary_backends: Vec<BackendId> = successes.iter().map(|(b, _)| *b).collect();
        let result = merge_results(base, successes);

        Ok(ExecutionOutcome {
            used_backend,
            result,
            used_fallback,
            attempted_backends: participants,
            supplementary_backends,
            propagated_to: Vec::new(),
        })
    }

    async fn store_and_propagate(
        &self,
        decision: &RoutingDecision,
        payload: &Value,
    ) -> Result<ExecutionOutcome, RouterError> {
        let mut outcome = self
            .executor
            .execute(decision, Operation::Store, payload)
            .await?;

        let targets: Vec<BackendId> = decision
            .secondaries
            .iter()
            .copied()
            .filter(|b| *b != outcome.used_backend)
            .collect();

        for backend in &targets {
            let backend = *backend;
            let executor = Arc::clone(&self.executor);
            let payload = payload.clone();
            let request_id = decision.request_id.clone();
            tokio::spawn(async move {
                executor.propagate(&request_id, backend, &payload).await;
            });
        }

        debug!(
            request_id = %decision.request_id,
            served_by = %outcome.used_backend,
            propagating = targets.len(),
            "Write stored, propagation started"
        );
        outcome.propagated_to = targets;
        Ok(outcome)
    }
}

/// Merge secondary results into the primary result
///
/// Primary object keys win; secondary keys that do not collide are added.
/// Every secondary result is also listed under [`SUPPLEMENTARY_KEY`]. A
/// non-object primary is wrapped as `{"result": .., "_supplementary": [..]}`.
#[must_use]
pub fn merge_results(primary: Value, secondaries: Vec<(BackendId, Value)>) -> Value {
    if secondaries.is_empty() {
        return primary;
    }

    let mut supplementary = Vec::with_capacity(secondaries.len());
    let mut extra = Map::new();
    for (backend, result) in secondaries {
        if let Value::Object(fields) = &result {
            for (key, value) in fields {
                if key != SUPPLEMENTARY_KEY && !extra.contains_key(key) {
                    extra.insert(key.clone(), value.clone());
                }
            }
        }
        supplementary.push(json!({ "backend": backend, "result": result }));
    }

    match primary {
        Value::Object(mut fields) => {
            for (key, value) in extra {
                fields.entry(key).or_insert(value);
            }
            fields.insert(SUPPLEMENTARY_KEY.to_string(), Value::Array(supplementary));
            Value::Object(fields)
        }
        other => json!({ "result": other, SUPPLEMENTARY_KEY: supplementary }),
    }
}
