//! Threat assistant
//!
//! Turns a threat record into plain-language guidance. Playbooks are picked
//! by keyword in the threat type; anything unrecognized gets the generic
//! review playbook.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::RiskLevel;

/// Threat as the dashboard sends it; extra fields are ignored
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ThreatInput {
    pub alert_id: Option<String>,
    #[serde(rename = "type")]
    #[validate(length(max = 100))]
    pub threat_type: String,
    pub risk_level: RiskLevel,
    #[validate(range(min = 0, max = 100))]
    pub confidence: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistantAnalysis {
    pub explanation: String,
    pub severity_level: RiskLevel,
    pub immediate_actions: Vec<String>,
    pub prevention_tips: Vec<String>,
    pub technical_mitigation: Vec<String>,
    pub estimated_risk: i32,
}

struct Playbook {
    keyword: &'static str,
    explanation: &'static str,
    immediate_actions: [&'static str; 3],
    prevention_tips: [&'static str; 3],
    technical_mitigation: [&'static str; 3],
}

const PLAYBOOKS: [Playbook; 5] = [
    Playbook {
        keyword: "ddos",
        explanation: "A DDoS (Distributed Denial of Service) attack attempts to overwhelm your \
            public-facing services with large volumes of traffic so legitimate users cannot reach them.",
        immediate_actions: [
            "Validate current impact on critical services and notify the on-call responder.",
            "Tighten or enable rate limiting and connection caps at your edge or load balancer.",
            "Activate any DDoS protection or scrubbing profiles offered by your provider.",
        ],
        prevention_tips: [
            "Keep internet-facing services behind a WAF or CDN that supports DDoS protection.",
            "Define traffic baselines and alerts for abnormal spikes per region and per IP.",
            "Regularly review exposed services and remove or restrict anything non-essential.",
        ],
        technical_mitigation: [
            "Introduce network ACLs or firewall rules to block obviously abusive IP ranges.",
            "Tune SYN and connection limits and apply per-source quotas on critical endpoints.",
            "Use autoscaling with safeguards so surges do not collapse core infrastructure.",
        ],
    },
    Playbook {
        keyword: "brute",
        explanation: "A brute force or credential-stuffing attack repeatedly tries passwords \
            to break into accounts, often using leaked credential lists.",
        immediate_actions: [
            "Temporarily block the attacking IP or IP range at your firewall or WAF.",
            "Enforce multi-factor authentication on the targeted accounts.",
            "Audit recent logins for suspicious successes around the time of this alert.",
        ],
        prevention_tips: [
            "Require strong passwords and mandatory MFA, especially for privileged accounts.",
            "Configure lockout or step-up verification after several failed attempts.",
            "Monitor for sign-ins from impossible travel locations or unusual devices.",
        ],
        technical_mitigation: [
            "Apply IP- and user-based rate limits on authentication endpoints.",
            "Integrate breached-password screening before accepting new passwords.",
            "Centralize authentication logs and correlate for distributed password-spraying.",
        ],
    },
    Playbook {
        keyword: "port scan",
        explanation: "A port scan systematically checks which ports are open on your systems, \
            similar to an intruder testing which doors and windows are unlocked.",
        immediate_actions: [
            "Block or throttle the source IP if the scan is aggressive or repeated.",
            "Confirm that only required services and ports are exposed to the internet.",
            "Investigate whether any unexpected services are listening externally.",
        ],
        prevention_tips: [
            "Maintain a strict allowlist of exposed ports and services by asset.",
            "Place critical systems behind additional firewalls, VPNs, or zero-trust access.",
            "Run regular internal vulnerability and port scans to discover misconfigurations.",
        ],
        technical_mitigation: [
            "Enable IDS/IPS rules that detect and dampen scan behavior.",
            "Use port-knocking or single-port gateways for sensitive management services.",
            "Ensure that administrative interfaces are never directly exposed to the internet.",
        ],
    },
    Playbook {
        keyword: "botnet",
        explanation: "Botnet traffic indicates many compromised machines being remotely controlled \
            to attack or probe your infrastructure in a coordinated way.",
        immediate_actions: [
            "Check for signs of compromise on internal hosts that might be participating.",
            "Block known command-and-control domains and IPs used by the botnet.",
            "Increase monitoring of targeted services for lateral movement or data theft.",
        ],
        prevention_tips: [
            "Keep endpoint protection, OS patches, and browsers up to date on all devices.",
            "Filter malicious email attachments and URLs to prevent initial compromise.",
            "Educate users to recognize phishing and suspicious downloads.",
        ],
        technical_mitigation: [
            "Apply outbound filtering and DNS security to restrict connections to known-good destinations.",
            "Use threat intelligence feeds to automatically block emerging botnet infrastructure.",
            "Continuously hunt for persistence mechanisms and unusual outbound beacons on endpoints.",
        ],
    },
    Playbook {
        keyword: "anomaly",
        explanation: "An anomaly means behavior was detected that significantly deviates from your \
            normal baseline and may represent a new or stealthy attack.",
        immediate_actions: [
            "Correlate this anomaly with recent changes, deployments, or access grants.",
            "Inspect logs for strange access patterns, data transfers, or privilege changes.",
            "If compromise is suspected, isolate impacted systems and begin an incident investigation.",
        ],
        prevention_tips: [
            "Refine baselines and thresholds so anomaly alerts stay meaningful.",
            "Ensure critical assets log to a central SIEM with adequate retention.",
            "Practice incident response around low-and-slow or novel attack patterns.",
        ],
        technical_mitigation: [
            "Augment SIEM detection rules based on this new behavior.",
            "Increase telemetry (process, DNS, network flow) on suspicious assets.",
            "Adopt just-in-time and least-privilege access to minimize blast radius.",
        ],
    },
];

const GENERIC_ACTIONS: [&str; 3] = [
    "Review the full alert details and affected assets in the dashboard.",
    "Validate whether this behavior is expected for the impacted systems.",
    "If uncertain, treat as suspicious and restrict access until validated.",
];

const GENERIC_TIPS: [&str; 3] = [
    "Document expected behaviors for critical systems so anomalies stand out.",
    "Regularly review account permissions and apply least privilege.",
    "Maintain an up-to-date asset inventory with clear ownership.",
];

const GENERIC_MITIGATION: [&str; 3] = [
    "Tune detection rules to better classify similar events in the future.",
    "Correlate with endpoint, identity, and network telemetry to improve signal.",
    "If this pattern persists, codify it as a dedicated detection rule.",
];

fn risk_boost(level: RiskLevel) -> i32 {
    match level {
        RiskLevel::Critical => 10,
        RiskLevel::High => 5,
        RiskLevel::Medium => 0,
        RiskLevel::Low => -5,
    }
}

pub fn estimate_risk(confidence: i32, level: RiskLevel) -> i32 {
    let base = confidence.clamp(10, 99);
    (base + risk_boost(level)).clamp(0, 99)
}

fn owned(items: [&str; 3]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn analyze(threat: &ThreatInput) -> AssistantAnalysis {
    let estimated_risk = estimate_risk(threat.confidence, threat.risk_level);
    let kind = threat.threat_type.to_lowercase();

    match PLAYBOOKS.iter().find(|p| kind.contains(p.keyword)) {
        Some(playbook) => AssistantAnalysis {
            explanation: playbook.explanation.to_string(),
            severity_level: threat.risk_level,
            immediate_actions: owned(playbook.immediate_actions),
            prevention_tips: owned(playbook.prevention_tips),
            technical_mitigation: owned(playbook.technical_mitigation),
            estimated_risk,
        },
        None => AssistantAnalysis {
            explanation: format!(
                "The system detected a {} event which may indicate malicious activity \
                 and should be reviewed in context.",
                threat.threat_type
            ),
            severity_level: threat.risk_level,
            immediate_actions: owned(GENERIC_ACTIONS),
            prevention_tips: owned(GENERIC_TIPS),
            technical_mitigation: owned(GENERIC_MITIGATION),
            estimated_risk,
        },
    }
}
