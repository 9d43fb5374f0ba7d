use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::FetchError;
use crate::resource::ResourceKind;
use crate::rules::Finding;

/// Outcome of one engine run.
///
/// Findings are in (kind, record, rule) encounter order. Runtime failures
/// sit beside them in `errors`; nothing here depends on wall-clock time, so
/// identical input serialises identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub findings: Vec<Finding>,
    pub errors: Vec<RunError>,
    pub summaries: Vec<KindSummary>,
}

impl RunResult {
    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn findings_for(&self, kind: ResourceKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.resource_kind == kind)
    }

    /// Total records evaluated across all kinds.
    pub fn records_evaluated(&self) -> usize {
        self.summaries.iter().map(|s| s.records_evaluated).sum()
    }
}

/// Per-kind counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindSummary {
    pub kind: ResourceKind,
    pub records_evaluated: usize,
    pub findings: usize,
    pub fetch_failed: bool,
}

impl KindSummary {
    pub(crate) fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            records_evaluated: 0,
            findings: 0,
            fetch_failed: false,
        }
    }
}

/// A runtime failure downgraded to a result entry.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunError {
    /// Records for a kind could not be fetched.
    #[error("failed to fetch {kind}: {cause}")]
    Fetch { kind: ResourceKind, cause: String },
    /// A rule failed on one record.
    #[error("rule '{rule_name}' failed on {resource_kind} '{resource_id}': {message}")]
    RuleEvaluation {
        rule_name: String,
        resource_kind: ResourceKind,
        resource_id: String,
        message: String,
    },
    /// The run hit its deadline; listed kinds were not fully evaluated.
    #[error("deadline exceeded; unfinished: {}", join_kinds(.unfinished_kinds))]
    DeadlineExceeded { unfinished_kinds: Vec<ResourceKind> },
}

impl From<FetchError> for RunError {
    fn from(e: FetchError) -> Self {
        Self::Fetch {
            kind: e.kind,
            cause: e.cause,
        }
    }
}

fn join_kinds(kinds: &[ResourceKind]) -> String {
    kinds
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_errors_describe_themselves() {
        let fetch: RunError = FetchError::new(ResourceKind::StorageBucket, "AccessDenied").into();
        assert_eq!(fetch.to_string(), "failed to fetch storage_bucket: AccessDenied");

        let deadline = RunError::DeadlineExceeded {
            unfinished_kinds: vec![ResourceKind::DatabaseInstance, ResourceKind::SecurityGroup],
        };
        assert_eq!(
            deadline.to_string(),
            "deadline exceeded; unfinished: database_instance, security_group"
        );

        let as_error: &dyn std::error::Error = &deadline;
        assert!(as_error.source().is_none());
    }
}
