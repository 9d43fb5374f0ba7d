use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{Finding, Severity};
use crate::engine::RunResult;
use crate::error::{AuditError, Result};

/// Policy verdict: the final pass/fail decision after applying
/// suppressions and severity overrides to a run result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyVerdict {
    pub pass: bool,
    pub total_findings: usize,
    pub effective_findings: usize,
    pub error_count: usize,
    pub highest_severity: Option<Severity>,
    pub fail_threshold: Option<Severity>,
    pub fail_on_errors: bool,
}

/// Policy configuration loaded from `.cloudauditor.toml`.
///
/// The default policy never fails: findings and errors are reported and
/// the process still exits 0. Failing is opt-in through `fail_on` and
/// `fail_on_errors`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Policy {
    /// Minimum severity that fails the audit. Unset means never.
    #[serde(default)]
    pub fail_on: Option<Severity>,
    /// Fail when any fetch or rule error was recorded.
    #[serde(default)]
    pub fail_on_errors: bool,
    /// Rule names to ignore entirely.
    #[serde(default)]
    pub ignore_rules: HashSet<String>,
    /// Glob patterns on resource ids to ignore (e.g. "sandbox-*").
    #[serde(default)]
    pub ignore_resources: Vec<String>,
    /// Per-rule severity overrides.
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
}

impl Policy {
    /// Reject malformed resource patterns up front.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignore_resources {
            glob::Pattern::new(pattern).map_err(|e| {
                AuditError::Config(format!("invalid ignore_resources pattern '{pattern}': {e}"))
            })?;
        }
        Ok(())
    }

    fn resource_patterns(&self) -> Vec<glob::Pattern> {
        self.ignore_resources
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .collect()
    }

    fn is_suppressed(&self, finding: &Finding, patterns: &[glob::Pattern]) -> bool {
        self.ignore_rules.contains(&finding.rule_name)
            || patterns.iter().any(|p| p.matches(&finding.resource_id))
    }

    /// Evaluate a run result against this policy and produce a verdict.
    pub fn evaluate(&self, result: &RunResult) -> PolicyVerdict {
        let effective = self.apply(&result.findings);

        let highest = effective.iter().map(|f| f.severity).max();
        let findings_fail = self
            .fail_on
            .is_some_and(|threshold| effective.iter().any(|f| f.severity >= threshold));
        let errors_fail = self.fail_on_errors && result.has_errors();

        PolicyVerdict {
            pass: !(findings_fail || errors_fail),
            total_findings: result.findings.len(),
            effective_findings: effective.len(),
            error_count: result.errors.len(),
            highest_severity: highest,
            fail_threshold: self.fail_on,
            fail_on_errors: self.fail_on_errors,
        }
    }

    /// Filter findings: remove suppressed ones, apply overrides.
    pub fn apply(&self, findings: &[Finding]) -> Vec<Finding> {
        let patterns = self.resource_patterns();
        findings
            .iter()
            .filter(|f| !self.is_suppressed(f, &patterns))
            .map(|f| {
                let mut f = f.clone();
                if let Some(&override_sev) = self.overrides.get(&f.rule_name) {
                    f.severity = override_sev;
                }
                f
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RunError;
    use crate::resource::ResourceKind;
    use crate::rules::finding::fingerprint;

    fn make_finding(rule_name: &str, resource_id: &str, severity: Severity) -> Finding {
        Finding {
            rule_name: rule_name.into(),
            resource_kind: ResourceKind::StorageBucket,
            resource_id: resource_id.into(),
            severity,
            message: "test".into(),
            remediation: None,
            fingerprint: fingerprint(ResourceKind::StorageBucket, resource_id, rule_name),
        }
    }

    fn result_with(findings: Vec<Finding>) -> RunResult {
        RunResult {
            findings,
            ..Default::default()
        }
    }

    #[test]
    fn default_policy_never_fails() {
        let policy = Policy::default();
        let mut result = result_with(vec![make_finding("public-access", "b", Severity::Critical)]);
        result.errors.push(RunError::Fetch {
            kind: ResourceKind::SecurityGroup,
            cause: "timeout".into(),
        });
        let verdict = policy.evaluate(&result);
        assert!(verdict.pass);
        assert_eq!(verdict.highest_severity, Some(Severity::Critical));
        assert_eq!(verdict.error_count, 1);
    }

    #[test]
    fn fail_on_high_fails_on_critical() {
        let policy = Policy {
            fail_on: Some(Severity::High),
            ..Default::default()
        };
        let verdict = policy.evaluate(&result_with(vec![make_finding(
            "public-access",
            "b",
            Severity::Critical,
        )]));
        assert!(!verdict.pass);
    }

    #[test]
    fn fail_on_high_passes_on_medium() {
        let policy = Policy {
            fail_on: Some(Severity::High),
            ..Default::default()
        };
        let verdict = policy.evaluate(&result_with(vec![make_finding(
            "logging-disabled",
            "b",
            Severity::Medium,
        )]));
        assert!(verdict.pass);
    }

    #[test]
    fn fail_on_errors_fails_without_findings() {
        let policy = Policy {
            fail_on_errors: true,
            ..Default::default()
        };
        let mut result = RunResult::default();
        assert!(policy.evaluate(&result).pass);
        result.errors.push(RunError::Fetch {
            kind: ResourceKind::StorageBucket,
            cause: "AccessDenied".into(),
        });
        assert!(!policy.evaluate(&result).pass);
    }

    #[test]
    fn ignore_rule_removes_finding() {
        let mut policy = Policy {
            fail_on: Some(Severity::Low),
            ..Default::default()
        };
        policy.ignore_rules.insert("public-access".into());
        let verdict = policy.evaluate(&result_with(vec![make_finding(
            "public-access",
            "b",
            Severity::Critical,
        )]));
        assert!(verdict.pass);
        assert_eq!(verdict.total_findings, 1);
        assert_eq!(verdict.effective_findings, 0);
    }

    #[test]
    fn ignore_resources_glob() {
        let policy = Policy {
            ignore_resources: vec!["sandbox-*".into()],
            ..Default::default()
        };
        let kept = policy.apply(&[
            make_finding("no-backup", "sandbox-db", Severity::High),
            make_finding("no-backup", "prod-db", Severity::High),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].resource_id, "prod-db");
    }

    #[test]
    fn override_downgrades_severity() {
        let mut policy = Policy {
            fail_on: Some(Severity::High),
            ..Default::default()
        };
        policy.overrides.insert("public-access".into(), Severity::Info);
        let result = result_with(vec![make_finding("public-access", "b", Severity::Critical)]);
        let verdict = policy.evaluate(&result);
        assert!(verdict.pass);
        assert_eq!(policy.apply(&result.findings)[0].severity, Severity::Info);
    }

    #[test]
    fn invalid_pattern_rejected() {
        let policy = Policy {
            ignore_resources: vec!["[unclosed".into()],
            ..Default::default()
        };
        assert!(matches!(policy.validate(), Err(AuditError::Config(_))));
    }
}
