//! cloud-auditor: read-only cloud configuration auditor.
//!
//! Reads an inventory of cloud resources, runs independent rules over each
//! record and reports misconfigurations: public exposure, missing logging
//! or versioning, missing backups or deletion protection, administrative
//! ports open to the internet.
//!
//! # Quick Start
//!
//! ```no_run
//! use cloudauditor::{audit, AuditOptions};
//!
//! let report = audit(&AuditOptions::default()).unwrap();
//! println!("Pass: {}, Findings: {}", report.verdict.pass, report.result.findings.len());
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod output;
pub mod resource;
pub mod rules;

use std::path::{Path, PathBuf};
use std::time::Instant;

use config::Config;
use engine::{Engine, RunResult};
use error::Result;
use fetch::Inventory;
use output::OutputFormat;
use resource::ResourceKind;
use rules::policy::PolicyVerdict;
use rules::RuleRegistry;

/// Default inventory export, relative to the working directory.
pub const DEFAULT_INVENTORY: &str = "cloud-inventory.json";

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG: &str = ".cloudauditor.toml";

/// Options for an audit invocation.
#[derive(Debug, Clone, Default)]
pub struct AuditOptions {
    /// Inventory export (overrides config, defaults to `cloud-inventory.json`).
    pub inventory_path: Option<PathBuf>,
    /// Path to config file (defaults to `.cloudauditor.toml`).
    pub config_path: Option<PathBuf>,
    /// Kinds to audit (overrides config).
    pub kinds: Option<Vec<ResourceKind>>,
    /// CLI override for fail_on threshold.
    pub fail_on_override: Option<rules::Severity>,
}

/// Complete audit report.
#[derive(Debug)]
pub struct AuditReport {
    pub target_name: String,
    /// Findings after suppressions and overrides, with the run's errors.
    /// Summary finding counts are recomputed to match the kept findings.
    pub result: RunResult,
    pub verdict: PolicyVerdict,
}

/// Run a complete audit: load config and inventory, evaluate every rule,
/// apply policy.
pub fn audit(options: &AuditOptions) -> Result<AuditReport> {
    let config_path = options
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let mut config = Config::load(&config_path)?;

    if let Some(fail_on) = options.fail_on_override {
        config.policy.fail_on = Some(fail_on);
    }

    let inventory_path = options
        .inventory_path
        .clone()
        .or_else(|| config.audit.inventory.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INVENTORY));

    let kinds = match &options.kinds {
        Some(kinds) => kinds.clone(),
        None => config.audit.resolved_kinds()?,
    };

    let registry = RuleRegistry::with_builtin_rules()?;
    let inventory = Inventory::load(&inventory_path)?;
    let engine = Engine::new(registry).with_fetchers(inventory.fetchers());

    audit_with_engine(&engine, &kinds, &config, &target_name(&inventory_path))
}

/// Run an audit on a prepared engine. Useful when fetchers come from
/// somewhere other than an inventory file.
pub fn audit_with_engine(
    engine: &Engine,
    kinds: &[ResourceKind],
    config: &Config,
    target_name: &str,
) -> Result<AuditReport> {
    let deadline = config.audit.deadline().map(|d| Instant::now() + d);
    let raw = engine.run_with_deadline(kinds, deadline)?;

    tracing::info!(
        rules = engine.registry().len(),
        findings = raw.findings.len(),
        errors = raw.errors.len(),
        records = raw.records_evaluated(),
        "audit complete"
    );

    let verdict = config.policy.evaluate(&raw);
    let findings = config.policy.apply(&raw.findings);
    let summaries = raw
        .summaries
        .into_iter()
        .map(|mut summary| {
            summary.findings = findings
                .iter()
                .filter(|f| f.resource_kind == summary.kind)
                .count();
            summary
        })
        .collect();
    let result = RunResult {
        findings,
        errors: raw.errors,
        summaries,
    };

    Ok(AuditReport {
        target_name: target_name.to_string(),
        result,
        verdict,
    })
}

/// Render an audit report in the specified format.
pub fn render_report(report: &AuditReport, format: OutputFormat) -> Result<String> {
    output::render(&report.result, &report.verdict, format, &report.target_name)
}

fn target_name(inventory_path: &Path) -> String {
    inventory_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "inventory".into())
}
