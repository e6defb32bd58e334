//! Routing Test Utilities
//!
//! Scriptable mock backend for exercising fallback and coordination paths
//! without a real store.
//!
//! # Usage
//!
//! ```ignore
//! let graph = Arc::new(MockBackend::failing(AdapterError::Unavailable("down".into())));
//! let docs = Arc::new(MockBackend::ok(json!({"status": "stored"})));
//!
//! // ... run the executor ...
//!
//! assert_eq!(graph.call_count(), 1);
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::backend::{AdapterError, MemoryBackend, Operation};

/// One captured call
#[derive(Clone, Debug)]
pub struct MockCall {
    /// Requested operation
    pub operation: Operation,
    /// Payload as received
    pub payload: Value,
}

/// Mock backend with scripted outcomes, delays and call recording
#[derive(Debug)]
pub struct MockBackend {
    /// One-shot outcomes consumed before the default
    script: Mutex<VecDeque<Result<Value, AdapterError>>>,
    /// Outcome once the script is empty
    default: Mutex<Result<Value, AdapterError>>,
    /// Simulated latency per call
    delay: Mutex<Duration>,
    /// Every call received
    calls: Mutex<Vec<MockCall>>,
}

impl MockBackend {
    fn with_default(default: Result<Value, AdapterError>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default: Mutex::new(default),
            delay: Mutex::new(Duration::ZERO),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `response`
    pub fn ok(response: Value) -> Self {
        Self::with_default(Ok(response))
    }

    /// Always fail with `error`
    pub fn failing(error: AdapterError) -> Self {
        Self::with_default(Err(error))
    }

    /// Delay every call
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock() = delay;
        self
    }

    /// Change the per-call delay
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// Queue a one-shot outcome
    pub fn push_outcome(&self, outcome: Result<Value, AdapterError>) {
        self.script.lock().push_back(outcome);
    }

    /// Replace the default outcome
    pub fn set_default(&self, outcome: Result<Value, AdapterError>) {
        *self.default.lock() = outcome;
    }

    /// Number of calls received
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Calls received, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl MemoryBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn invoke(
        &self,
        operation: Operation,
        payload: &Value,
        _timeout: Duration,
    ) -> Result<Value, AdapterError> {
        self.calls.lock().push(MockCall {
            operation,
            payload: payload.clone(),
        });

        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.script.lock().pop_front();
        scripted.unwrap_or_else(|| self.default.lock().clone())
    }
}
