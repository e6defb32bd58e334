//! Memory Backend Integration
//!
//! This module provides abstracted access to the three memory systems
//! (graph, document, semantic memory) through a common trait interface.
//!
//! # Available Adapters
//!
//! - **HTTP**: JSON-over-HTTP memory services
//! - **In-memory**: process-local store for offline use and tests
//!
//! # Usage
//!
//! ```ignore
//! use memory_router_core::backend::{HttpBackend, MemoryBackend, Operation};
//!
//! let backend = HttpBackend::new("http://localhost:8001");
//! let receipt = backend.invoke(Operation::Store, &payload, timeout).await?;
//! ```

mod http;
mod memory;
mod traits;

pub use http::HttpBackend;
pub use memory::InMemoryBackend;
pub use traits::{AdapterError, BackendId, MemoryBackend, Operation};
