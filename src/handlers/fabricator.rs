//! Event fabricator handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::AppState;
use crate::fabricator::{fabricate, EventPlan, FabricationReport, FabricationStep};

pub const PATH: &str = "/functions/v1/generate-threat";
pub const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

#[derive(Debug, Serialize)]
pub struct FabricateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub partial_success: bool,
    pub alert_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_steps: Vec<FabricationStep>,
}

#[derive(Debug, Serialize)]
pub struct FabricateFailure {
    pub success: bool,
    pub error: &'static str,
    pub failed_steps: Vec<FabricationStep>,
}

impl From<FabricationReport> for FabricateResponse {
    fn from(report: FabricationReport) -> Self {
        let complete = report.is_complete();
        Self {
            success: complete,
            partial_success: !complete,
            alert_id: report.alert_id,
            failed_steps: report.failed_steps,
        }
    }
}

/// Pre-flight: empty body, CORS headers only
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Fabricate one threat event; the request body is ignored
pub async fn generate(State(state): State<AppState>) -> Response {
    let plan = EventPlan::draw(&mut rand::thread_rng());

    match fabricate(&state.pool, &plan).await {
        Ok(report) => {
            tracing::debug!(
                alert_id = %report.alert_id,
                stats_updated = report.stats_updated,
                honeypot_created = report.honeypot_created,
                "Fabrication finished"
            );
            let status = if report.is_complete() {
                StatusCode::OK
            } else {
                StatusCode::MULTI_STATUS
            };
            (status, Json(FabricateResponse::from(report))).into_response()
        }
        Err(e) => {
            tracing::error!("Threat event insert failed: {}", e);
            let body = FabricateFailure {
                success: false,
                error: "Failed to record threat event",
                failed_steps: vec![FabricationStep::ThreatEvent],
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}
