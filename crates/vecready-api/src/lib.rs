//! Vector-store client used by the readiness probe.

pub mod client;
pub mod collection;
pub mod health;
pub mod qdrant;

pub use client::{ApiError, HttpClient};
pub use collection::CollectionInfo;
pub use health::{HealthCheck, VectorStore};
pub use qdrant::QdrantClient;
