use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::resource::ResourceKind;
use crate::rules::policy::Policy;

/// Top-level configuration from `.cloudauditor.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub audit: AuditSettings,
    #[serde(default)]
    pub policy: Policy,
}

/// What to audit and how long to spend on it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditSettings {
    /// Inventory export to read (defaults to `cloud-inventory.json`).
    #[serde(default)]
    pub inventory: Option<PathBuf>,
    /// Resource kinds to audit, in order. Unset means all.
    #[serde(default)]
    pub kinds: Option<Vec<String>>,
    /// Wall-clock budget for the whole run.
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

impl AuditSettings {
    /// Resolve configured kind names. Unknown names are configuration errors.
    pub fn resolved_kinds(&self) -> Result<Vec<ResourceKind>> {
        match &self.kinds {
            None => Ok(ResourceKind::ALL.to_vec()),
            Some(names) => names
                .iter()
                .map(|n| ResourceKind::parse(n).map_err(Into::into))
                .collect(),
        }
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.policy.validate()?;
        Ok(config)
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# cloud-auditor configuration

[audit]
# Inventory export produced by your collector.
inventory = "cloud-inventory.json"

# Resource kinds to audit, in order (storage_bucket, database_instance,
# security_group). Omit to audit everything.
# kinds = ["storage_bucket", "security_group"]

# Abort evaluation after this many seconds; findings so far are kept.
# deadline_secs = 300

[policy]
# Minimum severity that fails the audit (info, low, medium, high, critical).
# Leave unset to always exit 0.
# fail_on = "high"

# Fail when a resource kind could not be fetched or a rule errored.
fail_on_errors = false

# Rule names to ignore entirely.
# ignore_rules = ["logging-disabled"]

# Resource id patterns to ignore.
# ignore_resources = ["sandbox-*"]

# Per-rule severity overrides.
# [policy.overrides]
# "no-deletion-protection" = "low"
"#
    }
}
