//! Analyst progress handlers

use axum::{extract::State, Json};

use crate::{AppError, AppState, AppResult};
use crate::models::{ProgressEventRequest, User, UserProgress};
use crate::middleware::auth::UserContext;

pub async fn get(
    State(state): State<AppState>,
    user: UserContext,
) -> AppResult<Json<UserProgress>> {
    ensure_active(&state, &user).await?;
    let progress = UserProgress::get_or_create(&state.pool, user.user_id).await?;
    Ok(Json(progress))
}

pub async fn record(
    State(state): State<AppState>,
    user: UserContext,
    Json(req): Json<ProgressEventRequest>,
) -> AppResult<Json<UserProgress>> {
    ensure_active(&state, &user).await?;
    let progress = UserProgress::record_event(&state.pool, user.user_id, req.event).await?;

    tracing::info!(
        user_id = %user.user_id,
        event = ?req.event,
        threat_id = req.threat_id.as_deref().unwrap_or("-"),
        level = progress.level,
        "Progress recorded"
    );

    Ok(Json(progress))
}

/// Tokens outlive accounts; progress rows need a live user
async fn ensure_active(state: &AppState, user: &UserContext) -> AppResult<()> {
    match User::find_active(&state.pool, user.user_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::{run_migrations, test_support::ScratchDb};
    use crate::models::{CreateUser, ProgressEvent};
    use uuid::Uuid;

    fn state(pool: sqlx::PgPool) -> AppState {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://aegis@localhost/aegis".to_string()),
            "SERVICE_ROLE_KEY" => Some("service-role-key-for-tests-0123456789".to_string()),
            _ => None,
        })
        .unwrap();
        AppState { pool, config }
    }

    #[tokio::test]
    async fn test_deleted_user_is_unauthorized() {
        let Some(db) = ScratchDb::create().await else { return };
        run_migrations(&db.pool).await.unwrap();
        let state = state(db.pool.clone());

        let ghost = UserContext { user_id: Uuid::new_v4() };
        let result = get(State(state.clone()), ghost.clone()).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));

        let req = ProgressEventRequest { event: ProgressEvent::ReducedThreat, threat_id: None };
        let result = record(State(state), ghost, Json(req)).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));

        db.cleanup().await;
    }

    #[tokio::test]
    async fn test_active_user_gets_progress() {
        let Some(db) = ScratchDb::create().await else { return };
        run_migrations(&db.pool).await.unwrap();
        let state = state(db.pool.clone());

        let new_user = CreateUser {
            email: "ana@aegis.local".to_string(),
            password: "correct-horse".to_string(),
            name: None,
        };
        let created = User::create(&db.pool, &new_user, "hash".to_string()).await.unwrap();
        let ctx = UserContext { user_id: created.id };

        let Json(fresh) = get(State(state.clone()), ctx.clone()).await.unwrap();
        assert_eq!(fresh.xp, 0);

        let req = ProgressEventRequest { event: ProgressEvent::ReducedThreat, threat_id: None };
        let Json(after) = record(State(state), ctx, Json(req)).await.unwrap();
        assert_eq!(after.xp, 80);
        assert_eq!(after.badges, vec!["First Response".to_string()]);

        db.cleanup().await;
    }
}
