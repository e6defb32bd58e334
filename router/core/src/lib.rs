//! Memory Router Core - Intent-Driven Routing for Memory Backends
//!
//! This crate decides where a memory request should go. Callers hand it a
//! store or retrieve request with some free text and optional context
//! hints; the router classifies the intent, extracts entities, scores each
//! configured backend, and executes against the best one with ordered
//! fallback.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Callers                               │
//! │        store_data(payload, text, hints)  retrieve_data(...)   │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┼───────────────────────────────┐
//! │                        MEMORY ROUTER                          │
//! │  ┌─────────────┐  ┌─────────────┐  ┌────────────────────────┐ │
//! │  │  Intent     │  │  Entity     │  │  Performance Tracker   │ │
//! │  │  Classifier │  │  Extractor  │  │  (rolling windows)     │ │
//! │  └──────┬──────┘  └──────┬──────┘  └───────────┬────────────┘ │
//! │         └────────────────┼─────────────────────┘              │
//! │                   Routing Engine                              │
//! │                          │ RoutingDecision                    │
//! │        Multi-System Coordinator / Fallback Executor           │
//! └──────────────────────────┼────────────────────────────────────┘
//!                            │
//!          ┌─────────────────┼─────────────────┐
//!          v                 v                 v
//!     ┌─────────┐      ┌──────────┐      ┌──────────┐
//!     │  Graph  │      │ Document │      │ Semantic │
//!     └─────────┘      └──────────┘      └──────────┘
//! ```
//!
//! # Key Types
//!
//! - [`MemoryRouter`]: Facade that routes and executes requests
//! - [`RoutingEngine`]: Pure scoring of backends for one request
//! - [`FallbackExecutor`]: Ordered execution with per-call timeouts
//! - [`MultiSystemCoordinator`]: Parallel reads and write propagation
//! - [`MemoryBackend`]: Adapter trait implemented per storage system
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use memory_router_core::{BackendId, ContextHints, InMemoryBackend, MemoryRouter, RouterConfig};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), memory_router_core::RouterError> {
//!     let router = MemoryRouter::builder(RouterConfig::default())
//!         .with_adapter(BackendId::Graph, Arc::new(InMemoryBackend::new("graph")))
//!         .with_adapter(BackendId::Document, Arc::new(InMemoryBackend::new("document")))
//!         .with_adapter(BackendId::SemanticMemory, Arc::new(InMemoryBackend::new("semantic")))
//!         .build()?;
//!
//!     let outcome = router
//!         .store_data(json!({"text": "we met Alice"}), "Remember what we discussed yesterday", ContextHints::new())
//!         .await?;
//!     println!("stored in {}", outcome.used_backend);
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`backend`]: Backend identifiers and the adapter trait with HTTP and in-memory adapters
//! - [`config`]: TOML, environment and CLI configuration loading
//! - [`error`]: Router error types
//! - [`events`]: Telemetry events and sinks
//! - [`routing`]: Classification, scoring, fallback and coordination

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod routing;

// Backend exports
pub use backend::{AdapterError, BackendId, HttpBackend, InMemoryBackend, MemoryBackend, Operation};

// Error exports
pub use error::{BackendFailure, RouterError};

// Telemetry exports
pub use events::{ChannelSink, NullSink, Severity, TelemetryEvent, TelemetrySink, TracingSink};

// Routing exports
pub use routing::{
    merge_results, AdapterRegistry, BackendScore, BackendStats, ContextHints, Entity,
    EntityExtractor, EntityKind, EntitySet, ExecutionOutcome, FallbackExecutor, IntentCategory,
    IntentClassifier, IntentResult, MemoryRouter, MemoryRouterBuilder, MultiSystemCoordinator,
    PerformanceMetrics, PerformanceTracker, RoutedExecution, RouterConfig, RouterStats,
    RoutingDecision, RoutingEngine, RoutingRequest, SCORING_TABLE_VERSION,
};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, RouterConfigFile, RouterToml,
};
