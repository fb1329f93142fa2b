use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use vecready_api::{CollectionInfo, VectorStore};

use crate::logger::{Logger, LoggerRegistry};
use crate::metrics;
use crate::probe::{DependencyProbe, ProbeError};

/// Detail returned when the store reports itself unhealthy.
pub const UNHEALTHY_DETAIL: &str = "Vector store is not healthy";

/// Outcome of one readiness evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Readiness {
    /// The store is up and described its collection.
    Ready(CollectionInfo),
    /// The store said no, either through its health endpoint or a 503.
    DependencyUnhealthy,
    /// Anything else went wrong; carries the cause.
    ProbeFailed(String),
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Readiness::Ready(_) => StatusCode::OK,
            Readiness::DependencyUnhealthy | Readiness::ProbeFailed(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    /// Label used for the `result` metric dimension.
    pub fn outcome(&self) -> &'static str {
        match self {
            Readiness::Ready(_) => "ready",
            Readiness::DependencyUnhealthy => "unhealthy",
            Readiness::ProbeFailed(_) => "failed",
        }
    }

    pub fn report(&self) -> ReadinessReport {
        match self {
            Readiness::Ready(info) => ReadinessReport {
                status: ReadinessState::Ready,
                qdrant_connected: true,
                collection_info: Some(info.clone()),
                detail: None,
            },
            Readiness::DependencyUnhealthy => ReadinessReport::not_ready(UNHEALTHY_DETAIL.into()),
            Readiness::ProbeFailed(cause) => {
                ReadinessReport::not_ready(format!("Service not ready: {cause}"))
            }
        }
    }
}

impl IntoResponse for Readiness {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.report())).into_response()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadinessState {
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "not ready")]
    NotReady,
}

/// JSON body of `GET /health/ready`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub status: ReadinessState,
    pub qdrant_connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_info: Option<CollectionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ReadinessReport {
    fn not_ready(detail: String) -> Self {
        Self {
            status: ReadinessState::NotReady,
            qdrant_connected: false,
            collection_info: None,
            detail: Some(detail),
        }
    }
}

/// Classifies the vector store's state into a [`Readiness`].
pub struct ReadinessCheck<C> {
    probe: DependencyProbe<C>,
    log: Arc<Logger>,
}

impl<C: VectorStore> ReadinessCheck<C> {
    pub fn new(probe: DependencyProbe<C>, loggers: &LoggerRegistry) -> Self {
        Self {
            probe,
            log: loggers.get_logger(module_path!()),
        }
    }

    /// Probe the store once and classify the result.
    ///
    /// Unexpected failures are logged at ERROR; an unhealthy store is not.
    pub async fn evaluate(&self) -> Readiness {
        self.log.debug("Readiness check requested");
        let start = Instant::now();

        let readiness = self.classify().await;
        if let Readiness::ProbeFailed(cause) = &readiness {
            self.log
                .error(format_args!("Readiness check failed: {cause}"));
        }

        metrics::observe_readiness(readiness.outcome(), start.elapsed().as_secs_f64());
        readiness
    }

    async fn classify(&self) -> Readiness {
        if !self.probe.is_healthy().await {
            return Readiness::DependencyUnhealthy;
        }

        match self.probe.snapshot().await {
            Ok(info) => Readiness::Ready(info),
            Err(ProbeError::Unhealthy) => Readiness::DependencyUnhealthy,
            Err(e) => Readiness::ProbeFailed(e.to_string()),
        }
    }
}
