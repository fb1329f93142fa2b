//! Liveness and readiness endpoints for a service backed by a Qdrant
//! vector store.

pub mod config;
pub mod context;
pub mod liveness;
pub mod logger;
pub mod metrics;
pub mod probe;
pub mod readiness;
pub mod server;
pub mod telemetry;
