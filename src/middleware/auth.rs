//! Authentication middleware

use axum::{
    extract::{State, Request},
    middleware::Next,
    response::Response,
    http::{HeaderMap, Method, header::{AUTHORIZATION, COOKIE}},
};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, DecodingKey, Validation};
use sha2::{Sha256, Digest};
use uuid::Uuid;

use crate::{AppState, AppError};
use crate::handlers::auth::Claims;

pub const SESSION_COOKIE: &str = "aegis_session";
pub const APIKEY_HEADER: &str = "apikey";

/// User context extracted from JWT
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: Uuid,
}

/// Middleware: Require user JWT authentication
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_session_token(req.headers()).ok_or(AppError::Unauthorized)?;
    let user_ctx = user_context(&token, &state.config.jwt_secret)?;

    req.extensions_mut().insert(user_ctx);

    Ok(next.run(req).await)
}

/// Middleware: Allow the service role key or a signed-in user
pub async fn require_invoker(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let expected = hash_token(&state.config.service_role_key);

    let api_key = req.headers()
        .get(APIKEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bearer = bearer_token(req.headers());

    let is_service = [api_key.as_deref(), bearer.as_deref()]
        .into_iter()
        .flatten()
        .any(|candidate| hash_token(candidate) == expected);

    if !is_service {
        let token = bearer.ok_or(AppError::Unauthorized)?;
        let user = user_context(&token, &state.config.jwt_secret)?;
        tracing::debug!("Fabricator invoked by user {}", user.user_id);
    }

    Ok(next.run(req).await)
}

/// Decode and validate a session JWT
pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default()
    )?;
    Ok(token_data.claims)
}

fn user_context(token: &str, secret: &str) -> Result<UserContext, AppError> {
    let claims = decode_claims(token, secret)?;
    Ok(UserContext {
        user_id: Uuid::parse_str(&claims.sub).map_err(|_| AppError::TokenInvalid)?,
    })
}

/// Bearer token, falling back to the session cookie
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| session_cookie(headers))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|v| !v.is_empty())
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

// Implement FromRequestParts for UserContext
#[axum::async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions
            .get::<UserContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_preferred_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        headers.insert(COOKIE, HeaderValue::from_static("aegis_session=from-cookie"));
        assert_eq!(extract_session_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_cookie_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; aegis_session=tok123; other=1"));
        assert_eq!(extract_session_token(&headers).as_deref(), Some("tok123"));
    }

    #[test]
    fn test_missing_or_malformed_token() {
        let mut headers = HeaderMap::new();
        assert!(extract_session_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert!(extract_session_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        headers.insert(COOKIE, HeaderValue::from_static("aegis_session="));
        assert!(extract_session_token(&headers).is_none());
    }

    #[test]
    fn test_decode_rejects_wrong_secret() {
        let token = crate::handlers::auth::generate_jwt(Uuid::new_v4(), "analyst", "a".repeat(32).as_str(), 1).unwrap();
        assert!(decode_claims(&token, &"a".repeat(32)).is_ok());
        assert!(matches!(decode_claims(&token, &"b".repeat(32)), Err(AppError::TokenInvalid)));
    }

    #[test]
    fn test_hash_is_stable_hex() {
        let digest = hash_token("service-key");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, hash_token("service-key"));
        assert_ne!(digest, hash_token("service-kez"));
    }
}
