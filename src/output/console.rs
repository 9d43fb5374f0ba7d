use crate::engine::RunResult;
use crate::rules::policy::PolicyVerdict;
use crate::rules::Severity;

/// Render a run as plain console text, grouped by resource kind in run order.
pub fn render(result: &RunResult, verdict: &PolicyVerdict, target_name: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n  Audited {} resource(s) from {}\n",
        result.records_evaluated(),
        target_name
    ));

    if result.has_findings() {
        output.push_str(&format!(
            "\n  {} finding(s) detected:\n",
            result.findings.len()
        ));
    } else {
        output.push_str("\n  No misconfigurations detected.\n");
    }

    for summary in &result.summaries {
        let mut findings = result.findings_for(summary.kind).peekable();
        if findings.peek().is_none() {
            continue;
        }

        output.push_str(&format!(
            "\n  {} ({} record(s))\n\n",
            summary.kind, summary.records_evaluated
        ));
        for finding in findings {
            output.push_str(&format!(
                "  {} {} {}\n",
                severity_tag(finding.severity),
                finding.rule_name,
                finding.resource_id
            ));
            output.push_str(&format!("             {}\n", finding.message));
            if let Some(remediation) = &finding.remediation {
                output.push_str(&format!("             fix: {}\n", remediation));
            }
            output.push('\n');
        }
    }

    if !result.errors.is_empty() {
        output.push_str(&format!("\n  {} error(s) during audit:\n", result.errors.len()));
        for error in &result.errors {
            output.push_str(&format!("  warning: {}\n", error));
        }
    }

    let status = if verdict.pass { "PASS" } else { "FAIL" };
    output.push_str(&format!(
        "\n  Result: {} (threshold: {}, highest: {})\n\n",
        status,
        verdict
            .fail_threshold
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".into()),
        verdict
            .highest_severity
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".into()),
    ));

    output
}

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "[CRITICAL]",
        Severity::High => "[HIGH]    ",
        Severity::Medium => "[MEDIUM]  ",
        Severity::Low => "[LOW]     ",
        Severity::Info => "[INFO]    ",
    }
}
