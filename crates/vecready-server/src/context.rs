use std::sync::Arc;
use std::time::Duration;

use vecready_api::VectorStore;

use crate::liveness::{Liveness, VERSION};
use crate::logger::LoggerRegistry;
use crate::probe::DependencyProbe;
use crate::readiness::ReadinessCheck;

/// Everything the health endpoints need, built once at startup.
pub struct Context<C> {
    pub readiness: ReadinessCheck<C>,
    pub liveness: Liveness,
    /// Loggers handed to the components above; shared with the rest of the
    /// application.
    pub loggers: Arc<LoggerRegistry>,
}

impl<C: VectorStore> Context<C> {
    pub fn new(client: Arc<C>, probe_timeout: Duration, loggers: Arc<LoggerRegistry>) -> Self {
        let probe = DependencyProbe::new(client, probe_timeout, &loggers);
        Self {
            readiness: ReadinessCheck::new(probe, &loggers),
            liveness: Liveness::new(VERSION, &loggers),
            loggers,
        }
    }
}
