use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::client::{ApiError, HttpClient};
use crate::collection::CollectionInfo;
use crate::health::{HealthCheck, VectorStore};

/// Client for the Qdrant REST API, bound to a single collection.
///
/// Qdrant exposes `GET /healthz` (plain text, HTTP 200 when the node is up)
/// and `GET /collections/{name}`, which wraps the collection description in
/// a `{"result": ..., "status": ..., "time": ...}` envelope.
#[derive(Debug, Clone)]
pub struct QdrantClient {
    http: HttpClient,
    collection: String,
}

#[derive(Deserialize)]
struct Envelope {
    result: Option<serde_json::Value>,
}

impl QdrantClient {
    pub fn new(base_url: &str, api_key: Option<&str>, collection: &str) -> Result<Self, ApiError> {
        Ok(Self {
            http: HttpClient::new(base_url, api_key)?,
            collection: collection.to_string(),
        })
    }

    /// Build a client whose HTTP requests give up after `timeout`.
    pub fn with_timeout(
        base_url: &str,
        api_key: Option<&str>,
        collection: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            http: HttpClient::with_timeout(base_url, api_key, Some(timeout))?,
            collection: collection.to_string(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }
}

impl HealthCheck for QdrantClient {
    async fn is_healthy(&self) -> Result<bool, ApiError> {
        let status = self.http.get_status("healthz").await?;
        if !status.is_success() {
            debug!(%status, "qdrant health endpoint returned non-2xx");
        }
        Ok(status.is_success())
    }
}

impl VectorStore for QdrantClient {
    async fn collection_info(&self) -> Result<CollectionInfo, ApiError> {
        let envelope: Envelope = self
            .http
            .get_at(&["collections", self.collection.as_str()])
            .await?;

        let mut result = match envelope.result {
            Some(serde_json::Value::Object(map)) => map,
            Some(other) => {
                return Err(ApiError::MalformedResponse(format!(
                    "collection result is not an object: {other}"
                )));
            }
            None => {
                return Err(ApiError::MalformedResponse(
                    "collection response has no result".into(),
                ));
            }
        };

        result
            .entry("name")
            .or_insert_with(|| serde_json::Value::String(self.collection.clone()));

        Ok(CollectionInfo::new(serde_json::Value::Object(result)))
    }
}
