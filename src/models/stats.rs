//! Threat statistics model

use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use chrono::{DateTime, Utc};

pub const RISK_SCORE_MIN: i32 = 0;
pub const RISK_SCORE_MAX: i32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ThreatStats {
    pub id: i32,
    pub total_threats: i64,
    pub blocked_attacks: i64,
    pub active_alerts: i64,
    pub risk_score: i32,
    pub updated_at: DateTime<Utc>,
}

/// Change produced by one fabricated threat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsDelta {
    pub blocked: bool,
    pub risk_delta: i32,
}

pub fn clamp_risk_score(score: i32) -> i32 {
    score.clamp(RISK_SCORE_MIN, RISK_SCORE_MAX)
}

impl ThreatStats {
    /// Apply one threat to the aggregate
    pub fn apply(&self, delta: StatsDelta, now: DateTime<Utc>) -> Self {
        let blocked = i64::from(delta.blocked);
        Self {
            id: self.id,
            total_threats: self.total_threats + 1,
            blocked_attacks: self.blocked_attacks + blocked,
            active_alerts: self.active_alerts + (1 - blocked),
            risk_score: clamp_risk_score(self.risk_score.saturating_add(delta.risk_delta)),
            updated_at: now,
        }
    }

    pub async fn current(pool: &PgPool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ThreatStats>("SELECT * FROM threat_stats ORDER BY id LIMIT 1")
            .fetch_optional(pool)
            .await
    }

    /// First stats row, locked until the transaction ends
    pub async fn lock_current(tx: &mut Transaction<'_, Postgres>) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ThreatStats>("SELECT * FROM threat_stats ORDER BY id LIMIT 1 FOR UPDATE")
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn save(&self, tx: &mut Transaction<'_, Postgres>) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE threat_stats
            SET total_threats = $2, blocked_attacks = $3, active_alerts = $4,
                risk_score = $5, updated_at = $6
            WHERE id = $1
            "#
        )
        .bind(self.id)
        .bind(self.total_threats)
        .bind(self.blocked_attacks)
        .bind(self.active_alerts)
        .bind(self.risk_score)
        .bind(self.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(risk_score: i32) -> ThreatStats {
        ThreatStats {
            id: 1,
            total_threats: 10,
            blocked_attacks: 8,
            active_alerts: 2,
            risk_score,
            updated_at: DateTime::from_timestamp(0, 0).unwrap(),
        }
    }

    #[test]
    fn test_blocked_threat_increments_blocked() {
        let now = Utc::now();
        let next = stats(50).apply(StatsDelta { blocked: true, risk_delta: 2 }, now);
        assert_eq!(next.total_threats, 11);
        assert_eq!(next.blocked_attacks, 9);
        assert_eq!(next.active_alerts, 2);
        assert_eq!(next.risk_score, 52);
        assert_eq!(next.updated_at, now);
    }

    #[test]
    fn test_unblocked_threat_raises_active_alerts() {
        let next = stats(50).apply(StatsDelta { blocked: false, risk_delta: -3 }, Utc::now());
        assert_eq!(next.total_threats, 11);
        assert_eq!(next.blocked_attacks, 8);
        assert_eq!(next.active_alerts, 3);
        assert_eq!(next.risk_score, 47);
    }

    #[test]
    fn test_risk_score_clamped_at_bounds() {
        let low = stats(1).apply(StatsDelta { blocked: true, risk_delta: -3 }, Utc::now());
        assert_eq!(low.risk_score, 0);

        let high = stats(99).apply(StatsDelta { blocked: true, risk_delta: 3 }, Utc::now());
        assert_eq!(high.risk_score, 100);
    }

    #[test]
    fn test_risk_score_always_in_range() {
        // Includes out-of-range priors a hand-edited row could hold
        for prior in [-50, -1, 0, 1, 50, 99, 100, 101, 250, i32::MAX, i32::MIN] {
            for risk_delta in -3..=3 {
                let next = stats(prior).apply(StatsDelta { blocked: false, risk_delta }, Utc::now());
                assert!((RISK_SCORE_MIN..=RISK_SCORE_MAX).contains(&next.risk_score));
            }
        }
    }
}
