//! HTTP trigger surface.
//!
//! - `POST /sync` runs a pass and returns its report
//! - `GET /status` returns the outcome of the last pass
//! - `GET /health` answers while the process is up

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bookingsync_engine::{LastPass, PassReport, PassStatus, SharedSyncService, SyncError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Standard API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A pass that could not read its source, rendered as a 500.
pub struct ApiError(SyncError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        Self(err)
    }
}

/// A pass report with its derived status.
#[derive(Debug, Serialize)]
pub struct ReportBody {
    pub status: PassStatus,
    #[serde(flatten)]
    pub report: PassReport,
}

impl From<PassReport> for ReportBody {
    fn from(report: PassReport) -> Self {
        Self {
            status: report.status(),
            report,
        }
    }
}

/// Body of `GET /status`.
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StatusBody {
    /// No pass has finished since startup.
    Idle,
    Completed(ReportBody),
    Failed { at: DateTime<Utc>, error: String },
}

impl From<Option<LastPass>> for StatusBody {
    fn from(last: Option<LastPass>) -> Self {
        match last {
            None => Self::Idle,
            Some(LastPass::Completed(report)) => Self::Completed(report.into()),
            Some(LastPass::Failed { at, error }) => Self::Failed { at, error },
        }
    }
}

/// Builds the router over a shared service.
pub fn router(service: SharedSyncService) -> Router {
    Router::new()
        .route("/sync", post(sync))
        .route("/status", get(status))
        .route("/health", get(health))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}

/// POST /sync - run a pass now
async fn sync(State(service): State<SharedSyncService>) -> Result<Json<ReportBody>, ApiError> {
    let report = service.run_pass().await.map_err(|e| {
        error!(error = %e, "triggered pass failed");
        ApiError::from(e)
    })?;
    Ok(Json(report.into()))
}

/// GET /status - last pass outcome
async fn status(State(service): State<SharedSyncService>) -> Json<StatusBody> {
    Json(service.last_pass().await.into())
}

/// GET /health - liveness
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use bookingsync_core::{Booking, Unit};
    use bookingsync_engine::{Reconciler, SyncOptions, SyncService};
    use bookingsync_providers::{MemoryCalendar, MemorySource};
    use chrono::NaiveDate;
    use tower::ServiceExt;

    fn setup() -> (Arc<MemorySource>, Router) {
        let checkin = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let checkout = NaiveDate::from_ymd_opt(2024, 5, 12).unwrap();
        let source = Arc::new(MemorySource::new(
            vec![Unit::new("u1", "Loft").with_calendar("cal")],
            vec![Booking::new("b1", "u1").with_stay(checkin, checkout)],
        ));
        let reconciler = Reconciler::new(
            Arc::new(MemoryCalendar::new()),
            source.clone(),
            SyncOptions::default(),
        );
        (source, router(Arc::new(SyncService::new(reconciler))))
    }

    async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (_, app) = setup();
        let (status, body) = call(&app, "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn sync_returns_report_and_updates_status() {
        let (_, app) = setup();

        let (status, body) = call(&app, "GET", "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "idle");

        let (status, body) = call(&app, "POST", "/sync").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["inserted"], 1);
        assert_eq!(body["failures"], serde_json::json!([]));

        let (_, body) = call(&app, "GET", "/status").await;
        assert_eq!(body["state"], "completed");
        assert_eq!(body["inserted"], 1);
    }

    #[tokio::test]
    async fn unreadable_source_is_a_500() {
        let (source, app) = setup();
        source.set_unreadable(true);

        let (status, body) = call(&app, "POST", "/sync").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));

        let (_, body) = call(&app, "GET", "/status").await;
        assert_eq!(body["state"], "failed");
    }

    #[tokio::test]
    async fn partial_pass_is_still_a_200() {
        let (source, app) = setup();
        source.upsert_booking(Booking::new("broken", "u1"));

        let (status, body) = call(&app, "POST", "/sync").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "partial");
        assert_eq!(body["failures"][0]["kind"], "validation");
        assert_eq!(body["failures"][0]["booking_id"], "broken");
    }
}
