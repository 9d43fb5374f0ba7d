use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resource::{ResourceKind, ResourceRecord};

/// A misconfiguration found on one resource by one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Name of the rule that produced this finding (e.g., "public-access").
    pub rule_name: String,
    /// Kind of the offending resource.
    pub resource_kind: ResourceKind,
    /// Identifier of the offending resource.
    pub resource_id: String,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable description of the finding.
    pub message: String,
    /// Suggested remediation.
    pub remediation: Option<String>,
    /// Stable identity across runs: sha256 of kind, resource id and rule.
    pub fingerprint: String,
}

impl Finding {
    /// Create a finding for `record` carrying the rule's default severity
    /// and remediation.
    pub fn for_record(
        meta: &RuleMetadata,
        record: &ResourceRecord,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_name: meta.name.clone(),
            resource_kind: record.kind,
            resource_id: record.id.clone(),
            severity: meta.default_severity,
            message: message.into(),
            remediation: meta.remediation.clone(),
            fingerprint: fingerprint(record.kind, &record.id, &meta.name),
        }
    }
}

/// Stable hex digest identifying a (kind, resource, rule) triple.
pub fn fingerprint(kind: ResourceKind, resource_id: &str, rule_name: &str) -> String {
    let digest = Sha256::new()
        .chain_update(kind.as_str().as_bytes())
        .chain_update(b"|")
        .chain_update(resource_id.as_bytes())
        .chain_update(b"|")
        .chain_update(rule_name.as_bytes())
        .finalize();
    hex::encode(digest)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" => Some(Self::Info),
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Metadata about a rule, used for registration and `list-rules` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMetadata {
    pub name: String,
    pub kind: ResourceKind,
    pub description: String,
    pub default_severity: Severity,
    pub remediation: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_and_distinguishes_rules() {
        let a = fingerprint(ResourceKind::StorageBucket, "logs", "public-access");
        let b = fingerprint(ResourceKind::StorageBucket, "logs", "public-access");
        let c = fingerprint(ResourceKind::StorageBucket, "logs", "logging-disabled");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Info < Severity::Low);
        assert_eq!(Severity::from_str_lenient("CRIT"), Some(Severity::Critical));
        assert_eq!(Severity::from_str_lenient("urgent"), None);
    }
}
