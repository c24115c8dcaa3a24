//! Health check handler

use std::time::Duration;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

const DB_PING_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: &'static str,
    version: &'static str,
    timestamp: i64,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ping = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&state.pool);
    let reachable = matches!(tokio::time::timeout(DB_PING_TIMEOUT, ping).await, Ok(Ok(_)));

    Json(HealthResponse {
        status: if reachable { "healthy" } else { "degraded" },
        database: if reachable { "reachable" } else { "unreachable" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
    })
}
