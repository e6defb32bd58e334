//! Memory Backend Traits
//!
//! Trait definitions for the three memory systems the router can target.
//! The router never interprets payloads; it hands an opaque JSON value to
//! an adapter and gets an opaque JSON value (or an error) back.
//!
//! # Adapter Contract
//!
//! ```text
//! invoke(operation, payload, timeout) -> Result<Value, AdapterError>
//! ```
//!
//! Retries, connection pooling and query languages belong to the adapter,
//! not to the router.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// Backend Identity
// ============================================================================

/// The closed set of memory systems the router chooses between
///
/// Declaration order is the canonical priority used to break score ties:
/// `Graph > Document > SemanticMemory`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendId {
    /// Graph-relationship store (entities and edges)
    Graph,
    /// Document / markdown note store
    Document,
    /// Semantic key-value memory store (conversation context, preferences)
    SemanticMemory,
}

impl BackendId {
    /// All backends in canonical priority order
    pub const ALL: [BackendId; 3] = [Self::Graph, Self::Document, Self::SemanticMemory];

    /// Canonical priority rank (0 = highest)
    #[must_use]
    pub fn priority(self) -> usize {
        match self {
            Self::Graph => 0,
            Self::Document => 1,
            Self::SemanticMemory => 2,
        }
    }

    /// Stable index into per-backend arrays
    #[must_use]
    pub(crate) fn index(self) -> usize {
        self.priority()
    }

    /// Stable lowercase name, matching the serde and config key
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::Document => "document",
            Self::SemanticMemory => "semantic_memory",
        }
    }

    /// Parse a backend from its config / CLI name
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "graph" => Some(Self::Graph),
            "document" | "doc" => Some(Self::Document),
            "semantic_memory" | "semantic" | "memory" => Some(Self::SemanticMemory),
            _ => None,
        }
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Operations
// ============================================================================

/// What the caller wants done with the payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Persist the payload
    Store,
    /// Look something up using the payload as a query
    Retrieve,
}

impl Operation {
    /// Whether this operation mutates backend state
    #[must_use]
    pub fn is_write(self) -> bool {
        matches!(self, Self::Store)
    }

    /// Stable lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Retrieve => "retrieve",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Adapter Errors
// ============================================================================

/// Failure of a single adapter invocation
///
/// Every variant is treated the same way by the fallback chain: the backend
/// is marked failed for this request and the next one is tried.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AdapterError {
    /// The call did not complete within its timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The backend could not be reached
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with something the adapter could not decode
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The backend refused the request
    #[error("rejected with status {status}: {message}")]
    Rejected {
        /// Backend status code (HTTP status for HTTP adapters)
        status: u16,
        /// Backend-provided reason
        message: String,
    },

    /// Any other transport-level failure
    #[error("transport error: {0}")]
    Transport(String),
}

impl AdapterError {
    /// Whether the failure was a timeout
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

// ============================================================================
// Backend Trait
// ============================================================================

/// Memory backend adapter
///
/// Implement this trait to plug a concrete store (graph database, note
/// service, key-value memory) into the router.
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    /// Human-readable adapter name (e.g., "http", "in-memory")
    fn name(&self) -> &str;

    /// Perform one operation against the backend
    ///
    /// `timeout` is the router's budget for this call. Adapters may use it
    /// for their own transport timeouts; the router enforces it regardless.
    async fn invoke(
        &self,
        operation: Operation,
        payload: &Value,
        timeout: Duration,
    ) -> Result<Value, AdapterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_priority_order() {
        let mut backends = vec![
            BackendId::SemanticMemory,
            BackendId::Graph,
            BackendId::Document,
        ];
        backends.sort_by_key(|b| b.priority());
        assert_eq!(backends, BackendId::ALL.to_vec());
    }

    #[test]
    fn test_backend_names_round_trip_through_parse() {
        for backend in BackendId::ALL {
            assert_eq!(BackendId::parse(backend.as_str()), Some(backend));
        }
        assert_eq!(BackendId::parse("semantic"), Some(BackendId::SemanticMemory));
        assert_eq!(BackendId::parse("postgres"), None);
    }

    #[test]
    fn test_backend_serde_name() {
        let json = serde_json::to_string(&BackendId::SemanticMemory).unwrap();
        assert_eq!(json, "\"semantic_memory\"");
    }

    #[test]
    fn test_only_store_is_a_write() {
        assert!(Operation::Store.is_write());
        assert!(!Operation::Retrieve.is_write());
    }

    #[test]
    fn test_adapter_error_display() {
        let err = AdapterError::Rejected {
            status: 503,
            message: "overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "rejected with status 503: overloaded");
        assert!(AdapterError::Timeout(Duration::from_millis(5)).is_timeout());
        assert!(!err.is_timeout());
    }
}
