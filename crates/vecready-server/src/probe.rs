use std::sync::Arc;
use std::time::Duration;

use vecready_api::{ApiError, CollectionInfo, VectorStore};

use crate::logger::{Logger, LoggerRegistry};

/// Upper bound on a single call to the vector store.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Vector store is not healthy")]
    Unhealthy,
    #[error("vector store did not answer within {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Api(ApiError),
}

impl From<ApiError> for ProbeError {
    /// A 503 is the store itself saying it is unavailable, not a new failure.
    fn from(err: ApiError) -> Self {
        if err.is_unavailable() {
            ProbeError::Unhealthy
        } else {
            ProbeError::Api(err)
        }
    }
}

/// Liveness and metadata checks against the vector store.
///
/// Holds the long-lived client shared by every request; each call is bounded
/// by the probe timeout.
pub struct DependencyProbe<C> {
    client: Arc<C>,
    timeout: Duration,
    log: Arc<Logger>,
}

impl<C: VectorStore> DependencyProbe<C> {
    pub fn new(client: Arc<C>, timeout: Duration, loggers: &LoggerRegistry) -> Self {
        Self {
            client,
            timeout,
            log: loggers.for_type::<Self>(),
        }
    }

    /// `true` only if the store answered in time and reported itself healthy.
    /// Errors and timeouts are logged at DEBUG and reported as `false`.
    pub async fn is_healthy(&self) -> bool {
        match tokio::time::timeout(self.timeout, self.client.is_healthy()).await {
            Ok(Ok(healthy)) => healthy,
            Ok(Err(e)) => {
                self.log
                    .debug(format_args!("vector store health check failed: {e}"));
                false
            }
            Err(_) => {
                self.log.debug(format_args!(
                    "vector store health check timed out after {:?}",
                    self.timeout
                ));
                false
            }
        }
    }

    /// Fetch the collection metadata.
    pub async fn snapshot(&self) -> Result<CollectionInfo, ProbeError> {
        let info = tokio::time::timeout(self.timeout, self.client.collection_info())
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))??;
        Ok(info)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }
}
