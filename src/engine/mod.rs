//! Evaluation engine: fetch → rule application → finding collection.
//!
//! Runs are sequential and stateless. Fetch failures and rule failures are
//! recorded in the `RunResult` and never abort the run; only setup mistakes
//! (a kind with no fetcher) are raised, and they are raised before anything
//! is fetched.

pub mod result;

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use crate::error::ConfigurationError;
use crate::fetch::ResourceFetcher;
use crate::resource::{ResourceKind, ResourceRecord};
use crate::rules::{Finding, Rule, RuleRegistry};

pub use result::{KindSummary, RunError, RunResult};

/// Drives rules over fetched records.
pub struct Engine {
    registry: RuleRegistry,
    fetchers: BTreeMap<ResourceKind, Box<dyn ResourceFetcher>>,
}

impl Engine {
    /// Take ownership of a fully built registry. It is read-only from here.
    pub fn new(registry: RuleRegistry) -> Self {
        Self {
            registry,
            fetchers: BTreeMap::new(),
        }
    }

    /// Install the fetcher for its kind, replacing any previous one.
    pub fn add_fetcher(&mut self, fetcher: Box<dyn ResourceFetcher>) {
        self.fetchers.insert(fetcher.kind(), fetcher);
    }

    pub fn with_fetcher(mut self, fetcher: Box<dyn ResourceFetcher>) -> Self {
        self.add_fetcher(fetcher);
        self
    }

    pub fn with_fetchers(mut self, fetchers: Vec<Box<dyn ResourceFetcher>>) -> Self {
        for fetcher in fetchers {
            self.add_fetcher(fetcher);
        }
        self
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Kinds that have a fetcher, in kind order.
    pub fn kinds(&self) -> Vec<ResourceKind> {
        self.fetchers.keys().copied().collect()
    }

    /// Audit every kind that has a fetcher.
    pub fn run_all(&self) -> RunResult {
        self.evaluate(&self.kinds(), None)
    }

    /// Audit `kinds` in the given order.
    pub fn run(&self, kinds: &[ResourceKind]) -> Result<RunResult, ConfigurationError> {
        self.run_with_deadline(kinds, None)
    }

    /// Audit `kinds`, stopping at `deadline` if one is given.
    ///
    /// The deadline is checked before each kind and each record. Findings
    /// collected before it trips are kept and a `DeadlineExceeded` entry
    /// lists the kinds left unfinished.
    pub fn run_with_deadline(
        &self,
        kinds: &[ResourceKind],
        deadline: Option<Instant>,
    ) -> Result<RunResult, ConfigurationError> {
        let mut ordered: Vec<ResourceKind> = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            if !self.fetchers.contains_key(&kind) {
                return Err(ConfigurationError::UnknownKind(kind));
            }
            if !ordered.contains(&kind) {
                ordered.push(kind);
            }
        }
        Ok(self.evaluate(&ordered, deadline))
    }

    fn evaluate(&self, kinds: &[ResourceKind], deadline: Option<Instant>) -> RunResult {
        let mut result = RunResult::default();
        let expired = || deadline.is_some_and(|d| Instant::now() >= d);

        for (position, &kind) in kinds.iter().enumerate() {
            if expired() {
                record_deadline(&mut result, &kinds[position..]);
                return result;
            }

            let Some(fetcher) = self.fetchers.get(&kind) else {
                continue;
            };
            let rules = self.registry.rules_for(kind);
            let mut summary = KindSummary::new(kind);

            let records = match fetcher.fetch() {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(kind = %kind, error = %e, "fetch failed, skipping kind");
                    summary.fetch_failed = true;
                    result.summaries.push(summary);
                    result.errors.push(e.into());
                    continue;
                }
            };
            tracing::debug!(
                kind = %kind,
                records = records.len(),
                rules = rules.len(),
                "evaluating kind"
            );

            for record in &records {
                if expired() {
                    result.summaries.push(summary);
                    record_deadline(&mut result, &kinds[position..]);
                    return result;
                }

                for rule in rules {
                    match apply_rule(rule.as_ref(), record) {
                        Ok(findings) => {
                            summary.findings += findings.len();
                            result.findings.extend(findings);
                        }
                        Err(error) => {
                            tracing::warn!(%error, "rule evaluation failed");
                            result.errors.push(error);
                        }
                    }
                }
                summary.records_evaluated += 1;
            }

            result.summaries.push(summary);
        }

        result
    }
}

fn record_deadline(result: &mut RunResult, unfinished: &[ResourceKind]) {
    tracing::warn!(unfinished = unfinished.len(), "audit deadline exceeded");
    result.errors.push(RunError::DeadlineExceeded {
        unfinished_kinds: unfinished.to_vec(),
    });
}

/// Run one rule on one record, turning failures and panics into a
/// `RuleEvaluation` entry. Findings that do not point at `record` are
/// rejected as a rule defect.
fn apply_rule(rule: &dyn Rule, record: &ResourceRecord) -> Result<Vec<Finding>, RunError> {
    let rule_error = |message: String| RunError::RuleEvaluation {
        rule_name: rule.metadata().name,
        resource_kind: record.kind,
        resource_id: record.id.clone(),
        message,
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(record)))
        .map_err(|payload| rule_error(format!("rule panicked: {}", panic_message(&*payload))))?;
    let findings = outcome.map_err(|failure| rule_error(failure.to_string()))?;

    if let Some(stray) = findings
        .iter()
        .find(|f| f.resource_id != record.id || f.resource_kind != record.kind)
    {
        return Err(rule_error(format!(
            "produced a finding for {} '{}' while evaluating this record",
            stray.resource_kind, stray.resource_id
        )));
    }

    Ok(findings)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".into()
    }
}
