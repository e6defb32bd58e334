//! Memory Request Routing
//!
//! Decides which storage backend should serve each memory request, executes
//! it with ordered fallback, and coordinates requests that span several
//! backends.
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |   MemoryRouter   |  <-- Entry point for store / retrieve
//! +--------+---------+
//!          |
//!          v
//! +------------------+     +-------------------+
//! |  RoutingEngine   | --> | IntentClassifier  |
//! |                  | --> | EntityExtractor   |
//! |                  | --> | PerformanceTracker|
//! +--------+---------+     +-------------------+
//!          |  RoutingDecision
//!          v
//! +------------------------+
//! | MultiSystemCoordinator |  <-- parallel reads, store + propagate
//! +--------+---------------+
//!          |
//!          v
//! +------------------+
//! | FallbackExecutor |  <-- primary, then fallbacks in order
//! +--------+---------+
//!          |
//!    +-----+------+
//!    |     |      |
//!    v     v      v
//! +-----+ +----+ +--------+
//! |Graph| |Docs| |Semantic|  <-- MemoryBackend adapters
//! +-----+ +----+ +--------+
//! ```
//!
//! Every attempt records exactly one sample in the shared
//! [`PerformanceTracker`], so routing adapts to observed success rate and
//! latency.

pub mod config;
pub mod coordinator;
pub mod entities;
pub mod fallback;
pub mod intent;
pub mod metrics;
pub mod policy;
pub mod router;

#[cfg(test)]
pub mod test_utils;

pub use config::*;
pub use coordinator::*;
pub use entities::*;
pub use fallback::*;
pub use intent::*;
pub use metrics::*;
pub use policy::*;
pub use router::*;
