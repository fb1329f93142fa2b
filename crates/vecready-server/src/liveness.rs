use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logger::{Logger, LoggerRegistry};
use crate::metrics;

/// Build version reported by `GET /health`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LivenessState {
    Healthy,
}

/// JSON body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: LivenessState,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Liveness responder. Never touches the vector store.
pub struct Liveness {
    version: &'static str,
    clock: MonotonicClock,
    log: Arc<Logger>,
}

impl Liveness {
    pub fn new(version: &'static str, loggers: &LoggerRegistry) -> Self {
        Self {
            version,
            clock: MonotonicClock::default(),
            log: loggers.get_logger(module_path!()),
        }
    }

    pub fn check(&self) -> HealthStatus {
        self.log.info("Health check requested");
        metrics::increment_liveness();
        HealthStatus {
            status: LivenessState::Healthy,
            timestamp: self.clock.now(),
            version: self.version.to_string(),
        }
    }
}

/// Wall-clock UTC time that never goes backwards within the process.
///
/// Values are truncated to microseconds and clamped to the latest one
/// handed out, so a system clock step back does not reorder responses.
#[derive(Debug, Default)]
struct MonotonicClock {
    last_micros: AtomicI64,
}

impl MonotonicClock {
    fn now(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let micros = now.timestamp_micros();
        let latest = self.last_micros.fetch_max(micros, Ordering::AcqRel).max(micros);
        DateTime::<Utc>::from_timestamp_micros(latest).unwrap_or(now)
    }
}
