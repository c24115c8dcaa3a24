//! Authentication handlers

use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse},
    Json,
};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use jsonwebtoken::{encode, Header, EncodingKey};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{Utc, Duration};
use validator::Validate;

use crate::{AppState, AppError, AppResult};
use crate::config::Config;
use crate::middleware::auth::SESSION_COOKIE;
use crate::models::{User, LoginRequest, LoginResponse, CreateUser, UserInfo};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // User ID
    pub role: String,     // User role
    pub exp: usize,       // Expiration timestamp
    pub iat: usize,       // Issued at
}

/// Login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;

    // Find user by email
    let user = User::find_by_email(&state.pool, &req.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::InternalError("Invalid password hash".to_string()))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::InvalidCredentials)?;

    // Update last login
    User::update_last_login(&state.pool, user.id).await?;

    let token = generate_jwt(user.id, &user.role, &state.config.jwt_secret, state.config.jwt_expiration_hours)?;
    let cookie = session_cookie(&token, &state.config);

    tracing::info!("User signed in: {}", user.id);

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(LoginResponse {
            token,
            user: user.to_info(),
        }),
    ))
}

/// Register a new analyst account
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CreateUser>,
) -> AppResult<Json<UserInfo>> {
    req.validate()?;

    // Check if email already exists
    if User::find_by_email(&state.pool, &req.email).await?.is_some() {
        return Err(AppError::AlreadyExists("Email already registered".to_string()));
    }

    // Hash password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .to_string();

    let user = User::create(&state.pool, &req, password_hash).await?;

    tracing::info!("New analyst registered: {}", user.id);

    Ok(Json(user.to_info()))
}

/// Generate JWT token
pub fn generate_jwt(user_id: Uuid, role: &str, secret: &str, expiration_hours: u64) -> AppResult<String> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiration_hours as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: exp.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes())
    ).map_err(|e| AppError::InternalError(e.to_string()))
}

fn session_cookie(token: &str, config: &Config) -> String {
    let max_age = config.jwt_expiration_hours * 3600;
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age
    );
    if config.is_production() {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::decode_claims;

    fn config(environment: &str) -> Config {
        Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/aegis".to_string()),
            "SERVICE_ROLE_KEY" => Some("k".repeat(40)),
            "JWT_SECRET" => Some("j".repeat(40)),
            "ENVIRONMENT" => Some(environment.to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_jwt_roundtrip_claims() {
        let id = Uuid::new_v4();
        let token = generate_jwt(id, "analyst", &"j".repeat(40), 2).unwrap();
        let claims = decode_claims(&token, &"j".repeat(40)).unwrap();
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.role, "analyst");
        assert_eq!(claims.exp - claims.iat, 7200);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let dev = session_cookie("tok", &config("development"));
        assert_eq!(dev, "aegis_session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=86400");

        let prod = session_cookie("tok", &config("production"));
        assert!(prod.ends_with("; Secure"));
    }
}
