use std::future::Future;

use crate::client::ApiError;
use crate::collection::CollectionInfo;

/// Uniform health-check interface for vector-store clients.
///
/// Implementations call the store's liveness endpoint. The readiness probe
/// uses this to gate traffic.
pub trait HealthCheck: Send + Sync {
    /// Returns `Ok(true)` if the store is healthy, `Ok(false)` if it
    /// responded but reported an unhealthy state, or `Err` on connection failure.
    fn is_healthy(&self) -> impl Future<Output = Result<bool, ApiError>> + Send;
}

/// A vector store that can describe the collection the service reads from.
pub trait VectorStore: HealthCheck {
    /// Fetch metadata for the configured collection.
    ///
    /// Unlike [`HealthCheck::is_healthy`], failures here are expected to
    /// surface to the caller.
    fn collection_info(&self) -> impl Future<Output = Result<CollectionInfo, ApiError>> + Send;
}
