//! Shared fixtures: an in-memory log capture and a scripted vector store.

#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::Dispatch;
use vecready_api::{ApiError, CollectionInfo, HealthCheck, VectorStore};
use vecready_server::telemetry::{LogFormat, LogOutput, LogSink};

// ---------------------------------------------------------------------------
// Log capture
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn output(&self) -> LogOutput {
        LogOutput::Writer(Box::new(self.clone()))
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Lines whose level column is `level`.
    pub fn lines_at(&self, level: &str) -> Vec<String> {
        let needle = format!(" - {level} - ");
        self.lines()
            .into_iter()
            .filter(|l| l.contains(&needle))
            .collect()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A text sink writing only to a fresh [`Capture`] at `level`.
pub fn captured_sink(level: &str) -> (LogSink, Dispatch, Capture) {
    let (sink, dispatch) = LogSink::new(LogFormat::Text);
    let capture = Capture::default();
    sink.reconfigure(level, capture.output());
    (sink, dispatch, capture)
}

// ---------------------------------------------------------------------------
// Scripted vector store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Health {
    Up,
    Down,
    /// The health call itself errors (connection refused and the like).
    Broken,
    /// Never answers within any sensible timeout.
    Hangs,
}

#[derive(Debug, Clone)]
pub enum Snapshot {
    Info(serde_json::Value),
    /// The store answers with this status and body.
    Fails(u16, &'static str),
    Hangs,
}

pub struct FakeStore {
    health: Health,
    snapshot: Snapshot,
    pub health_calls: AtomicUsize,
    pub snapshot_calls: AtomicUsize,
}

impl FakeStore {
    pub fn new(health: Health, snapshot: Snapshot) -> Self {
        Self {
            health,
            snapshot,
            health_calls: AtomicUsize::new(0),
            snapshot_calls: AtomicUsize::new(0),
        }
    }

    pub fn ready(info: serde_json::Value) -> Self {
        Self::new(Health::Up, Snapshot::Info(info))
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }
}

impl HealthCheck for FakeStore {
    async fn is_healthy(&self) -> Result<bool, ApiError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        match self.health {
            Health::Up => Ok(true),
            Health::Down => Ok(false),
            Health::Broken => Err(ApiError::ApiResponse {
                status: 502,
                body: "bad gateway".into(),
            }),
            Health::Hangs => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(true)
            }
        }
    }
}

impl VectorStore for FakeStore {
    async fn collection_info(&self) -> Result<CollectionInfo, ApiError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        match &self.snapshot {
            Snapshot::Info(value) => Ok(CollectionInfo::new(value.clone())),
            Snapshot::Fails(status, body) => Err(ApiError::ApiResponse {
                status: *status,
                body: body.to_string(),
            }),
            Snapshot::Hangs => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(CollectionInfo::new(serde_json::Value::Null))
            }
        }
    }
}
