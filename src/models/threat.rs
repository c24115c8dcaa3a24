//! Threat event model

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Severity of a threat event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ThreatEvent {
    pub id: Uuid,
    pub alert_id: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub threat_type: String,
    pub module: String,
    pub risk_level: String,
    pub confidence: i32,
    pub explanation: Option<String>,
    pub source_ip: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Row to insert; the alert id is assigned at insertion time
#[derive(Debug, Clone)]
pub struct NewThreatEvent {
    pub threat_type: &'static str,
    pub module: &'static str,
    pub risk_level: RiskLevel,
    pub confidence: i32,
    pub explanation: &'static str,
    pub source_ip: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ThreatFilter {
    pub risk_level: Option<RiskLevel>,
    pub module: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ThreatFilter {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 200;

    pub fn page(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// `ALT-` followed by the alert number, zero-padded to three digits
pub fn format_alert_id(number: i64) -> String {
    format!("ALT-{:03}", number)
}

impl ThreatEvent {
    /// Draw the next alert number from the database sequence
    pub async fn next_alert_number(tx: &mut Transaction<'_, Postgres>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT nextval('threat_alert_seq')")
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        alert_id: &str,
        data: &NewThreatEvent,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ThreatEvent>(
            r#"
            INSERT INTO threat_events (alert_id, type, module, risk_level, confidence, explanation, source_ip, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'active')
            RETURNING *
            "#
        )
        .bind(alert_id)
        .bind(data.threat_type)
        .bind(data.module)
        .bind(data.risk_level.as_str())
        .bind(data.confidence)
        .bind(data.explanation)
        .bind(&data.source_ip)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn latest(pool: &PgPool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ThreatEvent>(
            "SELECT * FROM threat_events ORDER BY created_at DESC LIMIT 1"
        )
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &PgPool, filter: &ThreatFilter) -> Result<Vec<Self>, sqlx::Error> {
        let (limit, offset) = filter.page();

        sqlx::query_as::<_, ThreatEvent>(
            r#"
            SELECT * FROM threat_events
            WHERE ($1::text IS NULL OR risk_level = $1)
              AND ($2::text IS NULL OR module = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        )
        .bind(filter.risk_level.map(|r| r.as_str()))
        .bind(filter.module.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }
}
