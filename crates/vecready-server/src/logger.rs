use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, error, info, warn};

use crate::telemetry::QUIET_TARGETS;

/// A named logger handle.
///
/// Every event it emits carries the logger name, which the text formatter
/// prints in place of the event target. The sink filters on the callsite
/// target, not on this name, so a logger named after a dependency namespace
/// (`qdrant_client`, `hyper::proto`, `reqwest.connect`) drops its own DEBUG
/// and INFO events to stay at the same WARNING floor.
#[derive(Debug)]
pub struct Logger {
    name: String,
    quiet: bool,
}

impl Logger {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            quiet: is_quiet(name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn debug(&self, message: impl fmt::Display) {
        if !self.quiet {
            debug!(logger = %self.name, "{message}");
        }
    }

    pub fn info(&self, message: impl fmt::Display) {
        if !self.quiet {
            info!(logger = %self.name, "{message}");
        }
    }

    pub fn warning(&self, message: impl fmt::Display) {
        warn!(logger = %self.name, "{message}");
    }

    pub fn error(&self, message: impl fmt::Display) {
        error!(logger = %self.name, "{message}");
    }
}

/// Name-to-handle cache shared by every component.
///
/// Asking twice for the same name returns the same [`Arc`]. The first lookup
/// of a name is guarded by the write lock, so racing callers still end up
/// with a single handle.
#[derive(Debug, Default)]
pub struct LoggerRegistry {
    loggers: RwLock<HashMap<String, Arc<Logger>>>,
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_logger(&self, name: &str) -> Arc<Logger> {
        if let Some(logger) = self
            .loggers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Arc::clone(logger);
        }

        let mut loggers = self.loggers.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            loggers
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Logger::new(name))),
        )
    }

    /// Logger named after a type, e.g. `ReadinessCheck` for
    /// `vecready_server::readiness::ReadinessCheck<QdrantClient>`.
    pub fn for_type<T: ?Sized>(&self) -> Arc<Logger> {
        self.get_logger(short_type_name::<T>())
    }

    /// Number of distinct loggers handed out so far.
    pub fn len(&self) -> usize {
        self.loggers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_quiet(name: &str) -> bool {
    QUIET_TARGETS.iter().any(|target| {
        name.strip_prefix(*target)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::") || rest.starts_with('.'))
    })
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}
