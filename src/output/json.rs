use crate::engine::{KindSummary, RunError, RunResult};
use crate::error::Result;
use crate::rules::policy::PolicyVerdict;
use crate::rules::Finding;

use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    findings: &'a [Finding],
    errors: &'a [RunError],
    summaries: &'a [KindSummary],
    verdict: &'a PolicyVerdict,
}

/// Render a run as a JSON report.
pub fn render(result: &RunResult, verdict: &PolicyVerdict) -> Result<String> {
    let report = JsonReport {
        findings: &result.findings,
        errors: &result.errors,
        summaries: &result.summaries,
        verdict,
    };
    let json = serde_json::to_string_pretty(&report)?;
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceKind;
    use crate::rules::policy::Policy;

    #[test]
    fn errors_are_tagged_by_type() {
        let result = RunResult {
            errors: vec![RunError::DeadlineExceeded {
                unfinished_kinds: vec![ResourceKind::SecurityGroup],
            }],
            ..Default::default()
        };
        let verdict = Policy::default().evaluate(&result);
        let json: serde_json::Value =
            serde_json::from_str(&render(&result, &verdict).unwrap()).unwrap();
        assert_eq!(json["errors"][0]["type"], "deadline_exceeded");
        assert_eq!(json["errors"][0]["unfinished_kinds"][0], "security_group");
        assert_eq!(json["verdict"]["pass"], true);
    }
}
