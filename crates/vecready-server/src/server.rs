use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use prometheus::Encoder;
use tracing::info;
use vecready_api::VectorStore;

use crate::context::Context;
use crate::liveness::HealthStatus;
use crate::readiness::Readiness;

/// Build the health/metrics router.
///
/// Exposes:
/// - `GET /metrics`: Prometheus text format
/// - `GET /health`: liveness probe (always 200)
/// - `GET /health/ready`: readiness probe (200 when the vector store is usable, else 503)
pub fn router<C: VectorStore + 'static>(ctx: Arc<Context<C>>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(liveness_handler::<C>))
        .route("/health/ready", get(readiness_handler::<C>))
        .with_state(ctx)
}

/// Start the HTTP server on the given port.
pub async fn run<C: VectorStore + 'static>(port: u16, ctx: Arc<Context<C>>) -> anyhow::Result<()> {
    let app = router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting health server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Evaluate readiness once and write the report to `out` as pretty JSON.
pub async fn check<C: VectorStore>(ctx: &Context<C>, mut out: impl Write) -> anyhow::Result<Readiness> {
    let readiness = ctx.readiness.evaluate().await;
    serde_json::to_writer_pretty(&mut out, &readiness.report())?;
    writeln!(out)?;
    out.flush()?;
    Ok(readiness)
}

async fn metrics_handler() -> impl IntoResponse {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics".to_string(),
        );
    }
    (
        StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}

async fn liveness_handler<C: VectorStore>(State(ctx): State<Arc<Context<C>>>) -> Json<HealthStatus> {
    Json(ctx.liveness.check())
}

async fn readiness_handler<C: VectorStore>(State(ctx): State<Arc<Context<C>>>) -> Readiness {
    ctx.readiness.evaluate().await
}
