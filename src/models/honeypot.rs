//! Honeypot interaction model

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HoneypotEvent {
    pub id: Uuid,
    pub ip_address: String,
    pub payload: String,
    pub attempt_type: String,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHoneypotEvent {
    pub ip_address: String,
    pub payload: &'static str,
    pub attempt_type: &'static str,
    pub attempts: i32,
}

#[derive(Debug, Deserialize, Default)]
pub struct HoneypotFilter {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl HoneypotEvent {
    pub async fn insert(pool: &PgPool, data: &NewHoneypotEvent) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, HoneypotEvent>(
            r#"
            INSERT INTO honeypot_events (ip_address, payload, attempt_type, attempts)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#
        )
        .bind(&data.ip_address)
        .bind(data.payload)
        .bind(data.attempt_type)
        .bind(data.attempts)
        .fetch_one(pool)
        .await
    }

    pub async fn list(pool: &PgPool, filter: &HoneypotFilter) -> Result<Vec<Self>, sqlx::Error> {
        let limit = filter.limit.unwrap_or(50).clamp(1, 200);
        let offset = filter.offset.unwrap_or(0).max(0);

        sqlx::query_as::<_, HoneypotEvent>(
            "SELECT * FROM honeypot_events ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }
}
