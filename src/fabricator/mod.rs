//! Event Fabricator
//!
//! Synthesizes one random threat event per invocation and folds it into the
//! dashboard's aggregate statistics, occasionally adding a honeypot hit.
//!
//! ```text
//! EventPlan::draw ──► threat_event  (sequence + insert, one tx)   mandatory
//!                 ├─► threat_stats  (row lock + update, one tx)   best effort
//!                 └─► honeypot_event (insert, 30% of plans)       best effort
//! ```
//!
//! A failure in the mandatory step fails the invocation. Best-effort steps
//! are reported back in [`FabricationReport::failed_steps`].

pub mod catalog;
pub mod plan;

use serde::Serialize;
use sqlx::PgPool;

use crate::models::{format_alert_id, HoneypotEvent, ThreatEvent, ThreatStats};
pub use plan::EventPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FabricationStep {
    ThreatEvent,
    ThreatStats,
    HoneypotEvent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FabricationReport {
    pub alert_id: String,
    pub stats_updated: bool,
    pub honeypot_created: bool,
    pub failed_steps: Vec<FabricationStep>,
}

impl FabricationReport {
    pub fn is_complete(&self) -> bool {
        self.failed_steps.is_empty()
    }
}

/// Persist a drawn plan
pub async fn fabricate(pool: &PgPool, plan: &EventPlan) -> Result<FabricationReport, sqlx::Error> {
    let alert_id = insert_threat(pool, plan).await?;
    tracing::info!(
        alert_id = %alert_id,
        threat_type = plan.threat.threat_type,
        risk_level = plan.threat.risk_level.as_str(),
        "Threat event fabricated"
    );

    let mut failed_steps = Vec::new();

    let stats_updated = match update_stats(pool, plan).await {
        Ok(updated) => {
            if !updated {
                tracing::debug!("No threat_stats row present, skipping stats update");
            }
            updated
        }
        Err(e) => {
            tracing::warn!(alert_id = %alert_id, "threat_stats update failed: {}", e);
            failed_steps.push(FabricationStep::ThreatStats);
            false
        }
    };

    let mut honeypot_created = false;
    if let Some(hp) = &plan.honeypot {
        match HoneypotEvent::insert(pool, hp).await {
            Ok(event) => {
                tracing::debug!(attempt_type = %event.attempt_type, attempts = event.attempts, "Honeypot event fabricated");
                honeypot_created = true;
            }
            Err(e) => {
                tracing::warn!(alert_id = %alert_id, "honeypot_events insert failed: {}", e);
                failed_steps.push(FabricationStep::HoneypotEvent);
            }
        }
    }

    Ok(FabricationReport {
        alert_id,
        stats_updated,
        honeypot_created,
        failed_steps,
    })
}

async fn insert_threat(pool: &PgPool, plan: &EventPlan) -> Result<String, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let number = ThreatEvent::next_alert_number(&mut tx).await?;
    let alert_id = format_alert_id(number);
    ThreatEvent::insert(&mut tx, &alert_id, &plan.threat).await?;
    tx.commit().await?;
    Ok(alert_id)
}

/// Returns false when there is no stats row to update
async fn update_stats(pool: &PgPool, plan: &EventPlan) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let Some(current) = ThreatStats::lock_current(&mut tx).await? else {
        tx.rollback().await?;
        return Ok(false);
    };

    let next = current.apply(plan.stats, chrono::Utc::now());
    next.save(&mut tx).await?;
    tx.commit().await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{run_migrations, test_support::ScratchDb};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn plan(seed: u64, with_honeypot: bool) -> EventPlan {
        let mut plan = EventPlan::draw(&mut StdRng::seed_from_u64(seed));
        if !with_honeypot {
            plan.honeypot = None;
        }
        plan
    }

    async fn count(pool: &PgPool, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[test]
    fn test_report_completeness() {
        let mut report = FabricationReport {
            alert_id: "ALT-001".to_string(),
            stats_updated: true,
            honeypot_created: false,
            failed_steps: vec![],
        };
        assert!(report.is_complete());

        report.failed_steps.push(FabricationStep::HoneypotEvent);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_step_names() {
        let json = serde_json::to_string(&[
            FabricationStep::ThreatEvent,
            FabricationStep::ThreatStats,
            FabricationStep::HoneypotEvent,
        ])
        .unwrap();
        assert_eq!(json, r#"["threat_event","threat_stats","honeypot_event"]"#);
    }

    #[tokio::test]
    async fn test_missing_stats_row_is_skipped() {
        let Some(db) = ScratchDb::create().await else { return };
        run_migrations(&db.pool).await.unwrap();

        let report = fabricate(&db.pool, &plan(7, false)).await.unwrap();
        assert_eq!(report.alert_id, "ALT-001");
        assert!(!report.stats_updated);
        assert!(!report.honeypot_created);
        assert!(report.is_complete());

        assert_eq!(count(&db.pool, "threat_events").await, 1);
        assert_eq!(count(&db.pool, "threat_stats").await, 0);

        db.cleanup().await;
    }

    #[tokio::test]
    async fn test_honeypot_step_runs_when_planned() {
        let Some(db) = ScratchDb::create().await else { return };
        run_migrations(&db.pool).await.unwrap();

        let mut planned = plan(11, false);
        planned.honeypot = Some(crate::models::NewHoneypotEvent {
            ip_address: "10.0.xxx.xxx".to_string(),
            payload: "' OR 1=1 --",
            attempt_type: "SQL Injection",
            attempts: 3,
        });

        let report = fabricate(&db.pool, &planned).await.unwrap();
        assert!(report.honeypot_created);
        assert_eq!(count(&db.pool, "honeypot_events").await, 1);

        db.cleanup().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_invocations_lose_nothing() {
        const INVOCATIONS: u64 = 40;

        let Some(db) = ScratchDb::create().await else { return };
        run_migrations(&db.pool).await.unwrap();
        sqlx::query("INSERT INTO threat_stats (risk_score) VALUES (50)")
            .execute(&db.pool)
            .await
            .unwrap();

        let plans: Vec<EventPlan> = (0..INVOCATIONS).map(|seed| plan(seed, true)).collect();
        let handles: Vec<_> = plans
            .iter()
            .cloned()
            .map(|p| {
                let pool = db.pool.clone();
                tokio::spawn(async move { fabricate(&pool, &p).await })
            })
            .collect();

        let mut alert_ids = HashSet::new();
        for handle in handles {
            let report = handle.await.unwrap().unwrap();
            assert!(report.is_complete(), "{:?}", report.failed_steps);
            assert!(report.stats_updated);
            alert_ids.insert(report.alert_id);
        }
        assert_eq!(alert_ids.len() as u64, INVOCATIONS);
        for n in 1..=INVOCATIONS {
            assert!(alert_ids.contains(&format_alert_id(n as i64)));
        }

        let stats = ThreatStats::current(&db.pool).await.unwrap().unwrap();
        let blocked = plans.iter().filter(|p| p.stats.blocked).count() as i64;
        assert_eq!(stats.total_threats, INVOCATIONS as i64);
        assert_eq!(stats.blocked_attacks, blocked);
        assert_eq!(stats.active_alerts, INVOCATIONS as i64 - blocked);
        assert!((0..=100).contains(&stats.risk_score));

        let honeypots = plans.iter().filter(|p| p.honeypot.is_some()).count() as i64;
        assert_eq!(count(&db.pool, "honeypot_events").await, honeypots);

        db.cleanup().await;
    }
}
