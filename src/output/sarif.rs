use std::collections::BTreeMap;

use crate::engine::RunResult;
use crate::error::Result;
use crate::rules::{Finding, Severity};

use serde_json::{json, Value};

/// Render a run as SARIF 2.1.0.
///
/// Cloud resources have no source location, so each result carries a
/// logical location (`kind/resource_id`) and the finding fingerprint.
/// Fetch and rule errors become tool execution notifications.
pub fn render(result: &RunResult, target_name: &str) -> Result<String> {
    let mut first_by_rule: BTreeMap<String, &Finding> = BTreeMap::new();
    for finding in &result.findings {
        first_by_rule
            .entry(sarif_rule_id(finding))
            .or_insert(finding);
    }

    let rules: Vec<Value> = first_by_rule
        .iter()
        .map(|(id, finding)| {
            json!({
                "id": id,
                "name": finding.rule_name,
                "shortDescription": { "text": finding.rule_name },
                "defaultConfiguration": {
                    "level": severity_to_sarif_level(finding.severity),
                },
                "properties": {
                    "tags": [finding.resource_kind.as_str()],
                },
            })
        })
        .collect();

    let results: Vec<Value> = result
        .findings
        .iter()
        .map(|f| {
            let mut entry = json!({
                "ruleId": sarif_rule_id(f),
                "level": severity_to_sarif_level(f.severity),
                "message": { "text": f.message },
                "locations": [{
                    "logicalLocations": [{
                        "name": f.resource_id,
                        "fullyQualifiedName": format!("{}/{}", f.resource_kind, f.resource_id),
                        "kind": f.resource_kind.as_str(),
                    }],
                }],
                "partialFingerprints": {
                    "resourceRule/v1": f.fingerprint,
                },
            });

            if let Some(remediation) = &f.remediation {
                entry["fixes"] = json!([{
                    "description": { "text": remediation },
                }]);
            }

            entry
        })
        .collect();

    let notifications: Vec<Value> = result
        .errors
        .iter()
        .map(|e| {
            json!({
                "level": "warning",
                "message": { "text": e.to_string() },
            })
        })
        .collect();

    let sarif = json!({
        "$schema": "https://docs.oasis-open.org/sarif/sarif/v2.1.0/errata01/os/schemas/sarif-schema-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "cloud-auditor",
                    "version": env!("CARGO_PKG_VERSION"),
                    "semanticVersion": env!("CARGO_PKG_VERSION"),
                    "rules": rules,
                },
            },
            "invocations": [{
                "executionSuccessful": result.errors.is_empty(),
                "toolExecutionNotifications": notifications,
            }],
            "results": results,
            "automationDetails": {
                "id": format!("cloud-auditor/{}", target_name),
            },
        }],
    });

    let output = serde_json::to_string_pretty(&sarif)?;
    Ok(output)
}

/// Rule names are only unique per kind, so SARIF ids are qualified.
fn sarif_rule_id(finding: &Finding) -> String {
    format!("{}/{}", finding.resource_kind, finding.rule_name)
}

fn severity_to_sarif_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical | Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low | Severity::Info => "note",
    }
}
