//! Dashboard data feeds

use axum::{extract::{State, Query}, Json};

use crate::{AppState, AppResult, AppError};
use crate::models::{HoneypotEvent, HoneypotFilter, ThreatEvent, ThreatFilter, ThreatStats};
use crate::middleware::auth::UserContext;

/// Most recent threat, or `null` before the first one
pub async fn live(
    State(state): State<AppState>,
    _user: UserContext,
) -> AppResult<Json<Option<ThreatEvent>>> {
    let latest = ThreatEvent::latest(&state.pool).await?;
    Ok(Json(latest))
}

/// List threat events, newest first
pub async fn list(
    State(state): State<AppState>,
    _user: UserContext,
    Query(filter): Query<ThreatFilter>,
) -> AppResult<Json<Vec<ThreatEvent>>> {
    let events = ThreatEvent::list(&state.pool, &filter).await?;
    Ok(Json(events))
}

/// Aggregate statistics row
pub async fn stats(
    State(state): State<AppState>,
    _user: UserContext,
) -> AppResult<Json<ThreatStats>> {
    let stats = ThreatStats::current(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Threat statistics not initialized".to_string()))?;

    Ok(Json(stats))
}

/// List honeypot interactions, newest first
pub async fn honeypot(
    State(state): State<AppState>,
    _user: UserContext,
    Query(filter): Query<HoneypotFilter>,
) -> AppResult<Json<Vec<HoneypotEvent>>> {
    let events = HoneypotEvent::list(&state.pool, &filter).await?;
    Ok(Json(events))
}
