//! Analyst progress model (XP, levels, badges)

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Minimum XP for each level, ascending
const LEVEL_THRESHOLDS: [(i32, i32); 5] = [(1, 0), (2, 300), (3, 800), (4, 1600), (5, 2800)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressEvent {
    ReadPreventionTips,
    CompletedImmediateActions,
    ReducedThreat,
    UpdatedSettings,
}

impl ProgressEvent {
    pub fn xp(&self) -> i32 {
        match self {
            Self::ReadPreventionTips => 25,
            Self::CompletedImmediateActions => 60,
            Self::ReducedThreat => 80,
            Self::UpdatedSettings => 40,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProgressEventRequest {
    pub event: ProgressEvent,
    pub threat_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct UserProgress {
    pub xp: i32,
    pub level: i32,
    pub badges: Vec<String>,
    pub total_actions: i32,
}

pub fn compute_level(xp: i32) -> i32 {
    LEVEL_THRESHOLDS
        .iter()
        .filter(|(_, threshold)| xp >= *threshold)
        .map(|(level, _)| *level)
        .last()
        .unwrap_or(1)
}

impl Default for UserProgress {
    fn default() -> Self {
        Self { xp: 0, level: 1, badges: Vec::new(), total_actions: 0 }
    }
}

impl UserProgress {
    /// Progress after one recorded event
    pub fn record(&self, event: ProgressEvent) -> Self {
        let xp = self.xp + event.xp();
        let level = compute_level(xp);
        let total_actions = self.total_actions + 1;

        let mut badges = self.badges.clone();
        let earned = [
            ("First Response", total_actions >= 1),
            ("Playbook Follower", total_actions >= 10),
            ("Incident Wrangler", total_actions >= 25),
            ("Threat Hunter", level >= 3),
            ("SOC Commander", level >= 5),
        ];
        for (badge, unlocked) in earned {
            if unlocked && !badges.iter().any(|b| b == badge) {
                badges.push(badge.to_string());
            }
        }

        Self { xp, level, badges, total_actions }
    }

    pub async fn get_or_create(pool: &PgPool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query("INSERT INTO user_progress (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(pool)
            .await?;

        sqlx::query_as::<_, UserProgress>(
            "SELECT xp, level, badges, total_actions FROM user_progress WHERE user_id = $1"
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn record_event(pool: &PgPool, user_id: Uuid, event: ProgressEvent) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("INSERT INTO user_progress (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let current = sqlx::query_as::<_, UserProgress>(
            "SELECT xp, level, badges, total_actions FROM user_progress WHERE user_id = $1 FOR UPDATE"
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let next = current.record(event);

        sqlx::query(
            r#"
            UPDATE user_progress
            SET xp = $2, level = $3, badges = $4, total_actions = $5, updated_at = NOW()
            WHERE user_id = $1
            "#
        )
        .bind(user_id)
        .bind(next.xp)
        .bind(next.level)
        .bind(&next.badges)
        .bind(next.total_actions)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_thresholds() {
        assert_eq!(compute_level(0), 1);
        assert_eq!(compute_level(299), 1);
        assert_eq!(compute_level(300), 2);
        assert_eq!(compute_level(799), 2);
        assert_eq!(compute_level(800), 3);
        assert_eq!(compute_level(1600), 4);
        assert_eq!(compute_level(2800), 5);
        assert_eq!(compute_level(100_000), 5);
    }

    #[test]
    fn test_first_action_awards_first_response() {
        let next = UserProgress::default().record(ProgressEvent::ReadPreventionTips);
        assert_eq!(next.xp, 25);
        assert_eq!(next.level, 1);
        assert_eq!(next.total_actions, 1);
        assert_eq!(next.badges, vec!["First Response".to_string()]);
    }

    #[test]
    fn test_badges_not_duplicated() {
        let mut progress = UserProgress::default();
        for _ in 0..30 {
            progress = progress.record(ProgressEvent::ReducedThreat);
        }
        // 30 * 80 = 2400 XP -> level 4
        assert_eq!(progress.xp, 2400);
        assert_eq!(progress.level, 4);
        assert_eq!(
            progress.badges,
            vec!["First Response", "Playbook Follower", "Threat Hunter", "Incident Wrangler"]
        );
    }

    #[test]
    fn test_commander_at_level_five() {
        let progress = UserProgress { xp: 2790, level: 4, badges: vec![], total_actions: 3 }
            .record(ProgressEvent::UpdatedSettings);
        assert_eq!(progress.level, 5);
        assert!(progress.badges.contains(&"SOC Commander".to_string()));
        assert!(progress.badges.contains(&"Threat Hunter".to_string()));
    }

    #[test]
    fn test_unknown_event_rejected() {
        let parsed = serde_json::from_str::<ProgressEventRequest>(r#"{"event": "hacked_the_planet"}"#);
        assert!(parsed.is_err());

        let parsed: ProgressEventRequest =
            serde_json::from_str(r#"{"event": "completed_immediate_actions", "threat_id": "ALT-007"}"#).unwrap();
        assert_eq!(parsed.event.xp(), 60);
    }
}
