//! In-Process Memory Backend
//!
//! A process-local store that satisfies the [`MemoryBackend`] contract
//! without any network. Used by the CLI's offline mode and by integration
//! tests that need a real adapter with switchable availability.
//!
//! Records are keyed by the payload's `id` (or `key`) field; payloads
//! without one get a generated UUID. Retrieval by `id`/`key` returns that
//! record, retrieval by `text` returns every record whose JSON contains the
//! text (case-insensitive), sorted by id.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Value};

use super::traits::{AdapterError, MemoryBackend, Operation};

/// Process-local memory backend
#[derive(Debug)]
pub struct InMemoryBackend {
    /// Label reported in receipts (usually the backend id)
    label: String,
    /// Stored records
    records: DashMap<String, Value>,
    /// Whether the backend answers calls
    available: AtomicBool,
    /// Number of invocations received (including refused ones)
    invocations: AtomicU64,
}

impl InMemoryBackend {
    /// Create an empty, available backend
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            records: DashMap::new(),
            available: AtomicBool::new(true),
            invocations: AtomicU64::new(0),
        }
    }

    /// Toggle availability; unavailable backends refuse every call
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get a stored record by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Value> {
        self.records.get(id).map(|r| r.value().clone())
    }

    /// Number of invocations received
    #[must_use]
    pub fn invocation_count(&self) -> u64 {
        self.invocations.load(Ordering::SeqCst)
    }

    fn record_key(payload: &Value) -> Option<String> {
        ["id", "key"].iter().find_map(|field| {
            payload.get(*field).and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
        })
    }

    fn store(&self, payload: &Value) -> Value {
        let id = Self::record_key(payload).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        self.records.insert(id.clone(), payload.clone());
        json!({
            "status": "stored",
            "id": id,
            "backend": self.label,
        })
    }

    fn retrieve(&self, query: &Value) -> Value {
        if let Some(id) = Self::record_key(query) {
            return match self.get(&id) {
                Some(record) => json!({ "id": id, "record": record, "backend": self.label }),
                None => json!({ "id": id, "record": Value::Null, "backend": self.label }),
            };
        }

        let needle = query
            .get("text")
            .or_else(|| query.get("query"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase();

        let mut matches: Vec<(String, Value)> = self
            .records
            .iter()
            .filter(|entry| {
                needle.is_empty() || entry.value().to_string().to_lowercase().contains(&needle)
            })
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        matches.sort_by(|a, b| a.0.cmp(&b.0));

        let matches: Vec<Value> = matches
            .into_iter()
            .map(|(id, record)| json!({ "id": id, "record": record }))
            .collect();

        json!({ "matches": matches, "backend": self.label })
    }
}

#[async_trait]
impl MemoryBackend for InMemoryBackend {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn invoke(
        &self,
        operation: Operation,
        payload: &Value,
        _timeout: Duration,
    ) -> Result<Value, AdapterError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);

        if !self.available.load(Ordering::SeqCst) {
            return Err(AdapterError::Unavailable(format!(
                "{} is switched off",
                self.label
            )));
        }

        Ok(match operation {
            Operation::Store => self.store(payload),
            Operation::Retrieve => self.retrieve(payload),
        })
    }
}
