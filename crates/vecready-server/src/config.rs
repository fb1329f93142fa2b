use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, warn};

use crate::probe::DEFAULT_PROBE_TIMEOUT;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_LEVEL: &str = "INFO";
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6333";
pub const DEFAULT_COLLECTION: &str = "documents";

/// Startup configuration, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    /// Severity name handed to the log sink; unknown names mean INFO.
    pub log_level: String,
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub collection: String,
    pub probe_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            log_level: DEFAULT_LOG_LEVEL.into(),
            qdrant_url: DEFAULT_QDRANT_URL.into(),
            qdrant_api_key: None,
            collection: DEFAULT_COLLECTION.into(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Read `HEALTH_PORT`, `LOG_LEVEL`, `QDRANT_URL`, `QDRANT_API_KEY`,
    /// `QDRANT_COLLECTION` and `PROBE_TIMEOUT_SECS`.
    ///
    /// Unparseable values are logged and replaced by their default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let probe_timeout = match parse_var::<f64>("PROBE_TIMEOUT_SECS") {
            Some(secs) => match Duration::try_from_secs_f64(secs) {
                Ok(timeout) if !timeout.is_zero() => timeout,
                _ => {
                    warn!(
                        value = secs,
                        "PROBE_TIMEOUT_SECS must be a positive number of seconds, using default {:?}",
                        defaults.probe_timeout
                    );
                    defaults.probe_timeout
                }
            },
            None => defaults.probe_timeout,
        };

        Self {
            port: parse_var("HEALTH_PORT").unwrap_or(defaults.port),
            log_level: non_empty_var("LOG_LEVEL").unwrap_or(defaults.log_level),
            qdrant_url: non_empty_var("QDRANT_URL").unwrap_or(defaults.qdrant_url),
            qdrant_api_key: non_empty_var("QDRANT_API_KEY"),
            collection: non_empty_var("QDRANT_COLLECTION").unwrap_or(defaults.collection),
            probe_timeout,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(key: &str) -> Option<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    let raw = non_empty_var(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => {
            debug!(%key, value = %v, "using value from env");
            Some(v)
        }
        Err(e) => {
            warn!(%key, value = %raw, error = %e, "invalid value, using default");
            None
        }
    }
}
