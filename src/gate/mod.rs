//! Session gate
//!
//! Decides which page a request may see. The session passes through three
//! phases:
//!
//! ```text
//! Loading ──► Unauthenticated   (no / invalid token, unknown user)
//!        └──► Authenticated     (active user behind a valid token)
//! ```
//!
//! Resolution is bounded by `Config::session_timeout`. A lookup that does
//! not finish in time leaves the session in `Loading`, which the page layer
//! answers with a retry response instead of waiting.

pub mod routes;

use std::future::Future;
use std::time::Duration;

use axum::http::HeaderMap;
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::auth::{decode_claims, extract_session_token};
use crate::models::User;
use crate::AppState;
pub use routes::{decide, AppRoute, Navigation, LOGIN_PATH};

/// Signed-in identity as the pages see it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        }
    }
}

impl SessionUser {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    Loading,
    Unauthenticated,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub user: Option<SessionUser>,
    pub loading: bool,
}

impl Session {
    pub fn loading() -> Self {
        Self { user: None, loading: true }
    }

    pub fn resolved(user: Option<SessionUser>) -> Self {
        Self { user, loading: false }
    }

    pub fn phase(&self) -> GatePhase {
        match (self.loading, &self.user) {
            (true, _) => GatePhase::Loading,
            (false, None) => GatePhase::Unauthenticated,
            (false, Some(_)) => GatePhase::Authenticated,
        }
    }
}

/// Wait up to `deadline` for a user lookup; still `Loading` if it overruns
pub async fn settle<F>(deadline: Duration, lookup: F) -> Result<Session, sqlx::Error>
where
    F: Future<Output = Result<Option<User>, sqlx::Error>>,
{
    match tokio::time::timeout(deadline, lookup).await {
        Ok(found) => Ok(Session::resolved(found?.map(SessionUser::from))),
        Err(_) => {
            tracing::warn!("Session resolution exceeded {:?}", deadline);
            Ok(Session::loading())
        }
    }
}

/// Resolve the caller's session from its bearer token or session cookie
pub async fn resolve_session(state: &AppState, headers: &HeaderMap) -> Result<Session, sqlx::Error> {
    let Some(token) = extract_session_token(headers) else {
        return Ok(Session::resolved(None));
    };

    let user_id = match decode_claims(&token, &state.config.jwt_secret)
        .ok()
        .and_then(|claims| Uuid::parse_str(&claims.sub).ok())
    {
        Some(id) => id,
        None => {
            tracing::debug!("Ignoring invalid session token");
            return Ok(Session::resolved(None));
        }
    };

    settle(state.config.session_timeout, User::find_active(&state.pool, user_id)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "analyst@aegis.local".to_string(),
            password_hash: String::new(),
            name: Some("Ana".to_string()),
            role: "analyst".to_string(),
            is_active: true,
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_phases() {
        assert_eq!(Session::loading().phase(), GatePhase::Loading);
        assert_eq!(Session::resolved(None).phase(), GatePhase::Unauthenticated);
        assert_eq!(Session::resolved(Some(user().into())).phase(), GatePhase::Authenticated);
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut u: SessionUser = user().into();
        assert_eq!(u.display_name(), "Ana");
        u.name = None;
        assert_eq!(u.display_name(), "analyst@aegis.local");
    }

    #[tokio::test]
    async fn test_settle_resolves_found_user() {
        let found = user();
        let id = found.id;
        let session = settle(Duration::from_secs(1), async move { Ok(Some(found)) }).await.unwrap();
        assert_eq!(session.phase(), GatePhase::Authenticated);
        assert_eq!(session.user.unwrap().id, id);
    }

    #[tokio::test]
    async fn test_settle_missing_user_is_signed_out() {
        let session = settle(Duration::from_secs(1), async { Ok(None) }).await.unwrap();
        assert_eq!(session.phase(), GatePhase::Unauthenticated);
    }

    #[tokio::test]
    async fn test_settle_times_out_instead_of_hanging() {
        let lookup = std::future::pending::<Result<Option<User>, sqlx::Error>>();
        let session = settle(Duration::from_millis(20), lookup).await.unwrap();
        assert_eq!(session.phase(), GatePhase::Loading);
    }

    #[tokio::test]
    async fn test_settle_propagates_database_errors() {
        let result = settle(Duration::from_secs(1), async { Err(sqlx::Error::PoolTimedOut) }).await;
        assert!(result.is_err());
    }
}
