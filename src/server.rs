//! HTTP surface: one GET route per report.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::error::Result;
use crate::report::{Rendered, ReportKind};
use crate::PortalStats;

pub fn router(engine: PortalStats) -> Router {
    Router::new()
        .route("/api/training-stats", get(training_stats))
        .route("/api/webinar-stats", get(webinar_stats))
        .route("/api/webinar-analytics", get(webinar_analytics))
        .with_state(Arc::new(engine))
}

/// Bind and serve until the process is stopped.
pub async fn serve(engine: PortalStats, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Serving reports on http://{}", listener.local_addr()?);
    axum::serve(listener, router(engine)).await?;
    Ok(())
}

async fn training_stats(State(engine): State<Arc<PortalStats>>) -> Response {
    respond(&engine, ReportKind::TrainingStats).await
}

async fn webinar_stats(State(engine): State<Arc<PortalStats>>) -> Response {
    respond(&engine, ReportKind::WebinarStats).await
}

async fn webinar_analytics(State(engine): State<Arc<PortalStats>>) -> Response {
    respond(&engine, ReportKind::WebinarAnalytics).await
}

async fn respond(engine: &PortalStats, kind: ReportKind) -> Response {
    match engine.render(kind).await {
        Ok(Rendered { ok: true, body }) => (StatusCode::OK, Json(body)).into_response(),
        Ok(Rendered { ok: false, body }) => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
        // Propagated failures surface as an opaque server error.
        Err(e) => {
            log::error!("{kind} failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Server Error" })),
            )
                .into_response()
        }
    }
}
