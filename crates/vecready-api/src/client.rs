use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("API returned {status}: {body}")]
    ApiResponse { status: u16, body: String },
    #[error("API key contains invalid characters (non-visible ASCII)")]
    InvalidApiKey,
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ApiError {
    /// Whether the remote service answered with `503 Service Unavailable`.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ApiError::ApiResponse { status: 503, .. })
    }
}

/// Shared HTTP client for vector-store API interactions.
///
/// Wraps [`reqwest::Client`] with a base URL, an optional API key header
/// and an optional per-request timeout. The underlying connection pool is
/// reused for every call, so one instance should live for the whole process.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: Url,
}

impl HttpClient {
    /// Create a new client for the given base URL and optional API key.
    ///
    /// The key is sent in the `api-key` header, which is what Qdrant expects.
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, api_key, None)
    }

    /// Like [`HttpClient::new`] but with a total request timeout.
    pub fn with_timeout(
        base_url: &str,
        api_key: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase.into());
        }

        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            headers.insert(
                "api-key",
                HeaderValue::from_str(key).map_err(|_| ApiError::InvalidApiKey)?,
            );
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let inner = builder.build()?;

        Ok(Self { inner, base_url })
    }

    /// GET `{base_url}/{path}` and deserialize the JSON response.
    ///
    /// `path` is split on `/` and appended below the base URL's own path, so
    /// a base of `http://host/qdrant` keeps its `/qdrant` prefix.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.get_at(&split_path(path)).await
    }

    /// GET the URL made of the base URL plus `segments` and deserialize the
    /// JSON response. Each segment is percent-encoded as a single path
    /// segment, so a `/` inside one never starts a new one.
    pub async fn get_at<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let resp = self.inner.get(self.endpoint(segments)?).send().await?;
        Self::handle_response(resp).await
    }

    /// GET `{base_url}/{path}` and return only the response status.
    ///
    /// Transport failures are errors; any HTTP status, including 5xx, is not.
    pub async fn get_status(&self, path: &str) -> Result<StatusCode, ApiError> {
        let url = self.endpoint(&split_path(path))?;
        let resp = self.inner.get(url).send().await?;
        Ok(resp.status())
    }

    /// The URL of `segments` below the base URL.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Return the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::ApiResponse { status, body });
        }
        Ok(resp.json().await?)
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}
