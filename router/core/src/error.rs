//! Router Errors
//!
//! Callers see either a successful outcome or one of these. Individual
//! backend failures only surface inside [`RouterError::AllBackendsExhausted`].

use serde::Serialize;
use thiserror::Error;

use crate::backend::{AdapterError, BackendId};
use crate::config::ConfigError;

/// One failed backend attempt
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BackendFailure {
    /// Backend that was attempted
    pub backend: BackendId,
    /// Why it failed
    #[serde(serialize_with = "serialize_error")]
    pub error: AdapterError,
    /// Time spent on the attempt
    pub latency_ms: u64,
}

fn serialize_error<S: serde::Serializer>(error: &AdapterError, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&error.to_string())
}

fn describe_attempts(attempts: &[BackendFailure]) -> String {
    attempts
        .iter()
        .map(|a| format!("{} ({})", a.backend, a.error))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors returned by the router
#[derive(Debug, Error)]
pub enum RouterError {
    /// Every candidate backend failed for this request
    #[error("all backends exhausted for request {request_id}: {}", describe_attempts(.attempts))]
    AllBackendsExhausted {
        /// Request id
        request_id: String,
        /// Every attempt in order, each with its error
        attempts: Vec<BackendFailure>,
    },

    /// No backend is both enabled and registered
    #[error("no memory backends are enabled and registered")]
    NoBackendsAvailable,

    /// Configuration could not be loaded or is invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl RouterError {
    /// Backends attempted before the request failed
    #[must_use]
    pub fn attempted_backends(&self) -> Vec<BackendId> {
        match self {
            Self::AllBackendsExhausted { attempts, .. } => {
                attempts.iter().map(|a| a.backend).collect()
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_exhausted_message_lists_every_backend() {
        let err = RouterError::AllBackendsExhausted {
            request_id: "req-1".to_string(),
            attempts: vec![
                BackendFailure {
                    backend: BackendId::Graph,
                    error: AdapterError::Timeout(Duration::from_millis(50)),
                    latency_ms: 50,
                },
                BackendFailure {
                    backend: BackendId::Document,
                    error: AdapterError::Unavailable("down".to_string()),
                    latency_ms: 1,
                },
            ],
        };
        let message = err.to_string();
        assert!(message.contains("req-1"));
        assert!(message.contains("graph (timed out after 50ms)"));
        assert!(message.contains("document (backend unavailable: down)"));
        assert_eq!(
            err.attempted_backends(),
            vec![BackendId::Graph, BackendId::Document]
        );
    }
}
