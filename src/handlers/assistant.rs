//! Threat assistant handler

use axum::Json;
use validator::Validate;

use crate::AppResult;
use crate::assistant::{analyze, AssistantAnalysis, ThreatInput};
use crate::middleware::auth::UserContext;

pub async fn analyze_threat(
    user: UserContext,
    Json(threat): Json<ThreatInput>,
) -> AppResult<Json<AssistantAnalysis>> {
    threat.validate()?;

    tracing::debug!(
        "Assistant analysis for {} requested by {}",
        threat.alert_id.as_deref().unwrap_or("unsaved threat"),
        user.user_id
    );

    Ok(Json(analyze(&threat)))
}
