//! Routing Telemetry
//!
//! Write-only event stream describing what the router decided and how
//! execution went. Events never feed back into routing.
//!
//! # Sinks
//!
//! - [`TracingSink`]: structured `tracing` records (default)
//! - [`ChannelSink`]: forwards events over a tokio channel
//! - [`NullSink`]: drops everything

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::backend::BackendId;
use crate::routing::IntentCategory;

/// Longest request text preview carried by an event
const PREVIEW_CHARS: usize = 120;

/// Event severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational
    Low,
    /// Degraded but recovered
    Medium,
    /// Request failed or data may be missing
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// A routing telemetry event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// A routing decision was made
    RoutingDecided {
        /// Request id
        request_id: String,
        /// Classified intent
        category: IntentCategory,
        /// Classifier confidence
        confidence: f32,
        /// Chosen backend
        primary: BackendId,
        /// Remaining candidates in order
        fallback_order: Vec<BackendId>,
        /// Whether several backends will be involved
        is_multi_system: bool,
    },
    /// Execution moved past a failed backend
    FallbackUsed {
        /// Request id
        request_id: String,
        /// Backend that failed
        from: BackendId,
        /// Backend tried next
        to: BackendId,
    },
    /// Text could not be classified
    UnknownPattern {
        /// Request id
        request_id: String,
        /// Truncated request text
        preview: String,
    },
    /// A backend call failed
    BackendFailed {
        /// Request id
        request_id: String,
        /// Failed backend
        backend: BackendId,
        /// Adapter error text
        error: String,
        /// Backends still left to try
        remaining: usize,
    },
    /// A backend call was slower than the configured threshold
    SlowOperation {
        /// Request id
        request_id: String,
        /// Backend
        backend: BackendId,
        /// Observed latency
        latency_ms: u64,
    },
    /// Every candidate backend failed
    AllBackendsExhausted {
        /// Request id
        request_id: String,
        /// Attempted backends with their errors, in attempt order
        attempts: Vec<(BackendId, String)>,
    },
    /// A propagated write landed
    PropagationSucceeded {
        /// Request id
        request_id: String,
        /// Secondary backend
        backend: BackendId,
        /// Observed latency
        latency_ms: u64,
    },
    /// A propagated write failed
    PropagationFailed {
        /// Request id
        request_id: String,
        /// Secondary backend
        backend: BackendId,
        /// Adapter error text
        error: String,
    },
}

impl TelemetryEvent {
    /// Severity of this event
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::RoutingDecided { .. }
            | Self::UnknownPattern { .. }
            | Self::PropagationSucceeded { .. } => Severity::Low,
            Self::FallbackUsed { .. }
            | Self::SlowOperation { .. }
            | Self::PropagationFailed { .. } => Severity::Medium,
            Self::BackendFailed { remaining, .. } => {
                if *remaining == 0 {
                    Severity::High
                } else {
                    Severity::Medium
                }
            }
            Self::AllBackendsExhausted { .. } => Severity::High,
        }
    }

    /// Snake_case event name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoutingDecided { .. } => "routing_decided",
            Self::FallbackUsed { .. } => "fallback_used",
            Self::UnknownPattern { .. } => "unknown_pattern",
            Self::BackendFailed { .. } => "backend_failed",
            Self::SlowOperation { .. } => "slow_operation",
            Self::AllBackendsExhausted { .. } => "all_backends_exhausted",
            Self::PropagationSucceeded { .. } => "propagation_succeeded",
            Self::PropagationFailed { .. } => "propagation_failed",
        }
    }

    /// Request the event belongs to
    #[must_use]
    pub fn request_id(&self) -> &str {
        match self {
            Self::RoutingDecided { request_id, .. }
            | Self::FallbackUsed { request_id, .. }
            | Self::UnknownPattern { request_id, .. }
            | Self::BackendFailed { request_id, .. }
            | Self::SlowOperation { request_id, .. }
            | Self::AllBackendsExhausted { request_id, .. }
            | Self::PropagationSucceeded { request_id, .. }
            | Self::PropagationFailed { request_id, .. } => request_id,
        }
    }

    /// Build an unknown-pattern event with a bounded text preview
    #[must_use]
    pub fn unknown_pattern(request_id: impl Into<String>, text: &str) -> Self {
        Self::UnknownPattern {
            request_id: request_id.into(),
            preview: text.chars().take(PREVIEW_CHARS).collect(),
        }
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Destination for telemetry events
pub trait TelemetrySink: Send + Sync {
    /// Accept one event; must not block
    fn emit(&self, event: TelemetryEvent);
}

/// Emits events as `tracing` records
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn emit(&self, event: TelemetryEvent) {
        let name = event.name();
        let request_id = event.request_id().to_string();
        let details = serde_json::to_string(&event).unwrap_or_default();

        match event.severity() {
            Severity::Low => tracing::debug!(event = name, request_id = %request_id, %details, "routing telemetry"),
            Severity::Medium => tracing::warn!(event = name, request_id = %request_id, %details, "routing telemetry"),
            Severity::High => tracing::error!(event = name, request_id = %request_id, %details, "routing telemetry"),
        }
    }
}

/// Forwards events to an unbounded tokio channel
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<TelemetryEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver that observes it
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TelemetryEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl TelemetrySink for ChannelSink {
    fn emit(&self, event: TelemetryEvent) {
        // Receiver gone means nobody is listening any more
        let _ = self.tx.send(event);
    }
}

/// Discards every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn emit(&self, _event: TelemetryEvent) {}
}
