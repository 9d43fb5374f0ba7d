use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConfigurationError;
use crate::resource::ResourceKind;

use super::{Rule, RuleMetadata};

static RULE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid rule name pattern"));

/// Rules per resource kind, in registration order.
///
/// Built once at startup and then handed to the engine, which only ever
/// reads it.
#[derive(Default)]
pub struct RuleRegistry {
    rules: BTreeMap<ResourceKind, Vec<Box<dyn Rule>>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with every builtin rule.
    pub fn with_builtin_rules() -> Result<Self, ConfigurationError> {
        let mut registry = Self::new();
        super::builtin::register_all(&mut registry)?;
        Ok(registry)
    }

    /// Add a rule for `kind`.
    pub fn register(
        &mut self,
        kind: ResourceKind,
        rule: Box<dyn Rule>,
    ) -> Result<(), ConfigurationError> {
        let meta = rule.metadata();

        if !RULE_NAME_RE.is_match(&meta.name) {
            return Err(ConfigurationError::InvalidRuleName(meta.name));
        }
        if meta.kind != kind {
            return Err(ConfigurationError::KindMismatch {
                kind,
                rule_kind: meta.kind,
                rule: meta.name,
            });
        }

        let slot = self.rules.entry(kind).or_default();
        if slot.iter().any(|r| r.metadata().name == meta.name) {
            return Err(ConfigurationError::DuplicateRule {
                kind,
                rule: meta.name,
            });
        }

        tracing::debug!(kind = %kind, rule = %meta.name, "registered rule");
        slot.push(rule);
        Ok(())
    }

    /// Rules registered for `kind`, in registration order. Empty when none.
    pub fn rules_for(&self, kind: ResourceKind) -> &[Box<dyn Rule>] {
        self.rules.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Metadata for all registered rules, by kind then registration order.
    pub fn list_rules(&self) -> Vec<RuleMetadata> {
        self.rules
            .values()
            .flat_map(|rules| rules.iter().map(|r| r.metadata()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
