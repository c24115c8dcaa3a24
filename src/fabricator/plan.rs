//! Random draws for one fabricated event
//!
//! All randomness happens here, before any database call, so the
//! distribution can be checked with a seeded RNG.

use rand::seq::SliceRandom;
use rand::Rng;

use super::catalog::{ThreatKind, EXPLANATIONS, HONEYPOT_PAYLOADS, THREAT_KINDS};
use crate::models::{NewHoneypotEvent, NewThreatEvent, RiskLevel, StatsDelta};

pub const CONFIDENCE_MIN: i32 = 70;
pub const CONFIDENCE_MAX: i32 = 99;
pub const BLOCK_PROBABILITY: f64 = 0.85;
pub const RISK_DRIFT: i32 = 3;
pub const HONEYPOT_PROBABILITY: f64 = 0.3;
pub const HONEYPOT_MAX_ATTEMPTS: i32 = 50;

#[derive(Debug, Clone)]
pub struct EventPlan {
    pub threat: NewThreatEvent,
    pub stats: StatsDelta,
    pub honeypot: Option<NewHoneypotEvent>,
}

/// Source address with the host half hidden: `{10-209}.{0-254}.xxx.xxx`
pub fn masked_ip<R: Rng + ?Sized>(rng: &mut R) -> String {
    let a: u8 = rng.gen_range(10..=209);
    let b: u8 = rng.gen_range(0..=254);
    format!("{}.{}.xxx.xxx", a, b)
}

impl EventPlan {
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let kind: ThreatKind = THREAT_KINDS[rng.gen_range(0..THREAT_KINDS.len())];
        let risk_level = RiskLevel::ALL[rng.gen_range(0..RiskLevel::ALL.len())];
        let confidence = rng.gen_range(CONFIDENCE_MIN..=CONFIDENCE_MAX);
        // Drawn separately from the threat kind, so it may not match the type
        let explanation = EXPLANATIONS.choose(rng).copied().unwrap_or(EXPLANATIONS[0]);

        let threat = NewThreatEvent {
            threat_type: kind.threat_type,
            module: kind.module,
            risk_level,
            confidence,
            explanation,
            source_ip: masked_ip(rng),
        };

        let stats = StatsDelta {
            blocked: rng.gen_bool(BLOCK_PROBABILITY),
            risk_delta: rng.gen_range(-RISK_DRIFT..=RISK_DRIFT),
        };

        let honeypot = if rng.gen_bool(HONEYPOT_PROBABILITY) {
            let hp = HONEYPOT_PAYLOADS[rng.gen_range(0..HONEYPOT_PAYLOADS.len())];
            Some(NewHoneypotEvent {
                ip_address: masked_ip(rng),
                payload: hp.payload,
                attempt_type: hp.attempt_type,
                attempts: rng.gen_range(1..=HONEYPOT_MAX_ATTEMPTS),
            })
        } else {
            None
        };

        Self { threat, stats, honeypot }
    }
}
