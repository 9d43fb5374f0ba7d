use crate::error::RuleFailure;
use crate::resource::{ResourceKind, ResourceRecord};
use crate::rules::{Finding, Rule, RuleMetadata, Severity};

/// Grantee URIs that open a bucket beyond the owning account.
const PUBLIC_GRANTEES: &[&str] = &["AllUsers", "AuthenticatedUsers"];

/// public-access: Bucket ACL grants access to a global group.
///
/// Flags the first grant whose grantee URI names `AllUsers` or
/// `AuthenticatedUsers`. Grants without a URI (canonical user grants) are
/// ignored.
pub struct PublicAccessRule;

impl Rule for PublicAccessRule {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            name: "public-access".into(),
            kind: ResourceKind::StorageBucket,
            description: "Bucket ACL grants access to everyone".into(),
            default_severity: Severity::Critical,
            remediation: Some(
                "Remove AllUsers/AuthenticatedUsers grants and enable \
                 Block Public Access on the bucket."
                    .into(),
            ),
        }
    }

    fn evaluate(&self, record: &ResourceRecord) -> Result<Vec<Finding>, RuleFailure> {
        let Some(grants) = record.array_field("acl_grants") else {
            return Ok(vec![]);
        };

        let public_uri = grants
            .iter()
            .filter_map(|g| g.get("grantee_uri").and_then(|u| u.as_str()))
            .find(|uri| PUBLIC_GRANTEES.iter().any(|group| uri.contains(group)));

        Ok(public_uri
            .map(|uri| {
                Finding::for_record(
                    &self.metadata(),
                    record,
                    format!("Bucket is publicly accessible via grant to {uri}"),
                )
            })
            .into_iter()
            .collect())
    }
}

/// logging-disabled: Server access logging is off.
pub struct LoggingDisabledRule;

impl Rule for LoggingDisabledRule {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            name: "logging-disabled".into(),
            kind: ResourceKind::StorageBucket,
            description: "Bucket server access logging is disabled".into(),
            default_severity: Severity::Medium,
            remediation: Some("Enable server access logging to a dedicated log bucket.".into()),
        }
    }

    fn evaluate(&self, record: &ResourceRecord) -> Result<Vec<Finding>, RuleFailure> {
        match record.bool_field("logging_enabled") {
            Some(false) => Ok(vec![Finding::for_record(
                &self.metadata(),
                record,
                "Logging is disabled",
            )]),
            _ => Ok(vec![]),
        }
    }
}

/// versioning-disabled: Object versioning is not enabled.
///
/// Any reported status other than `Enabled` (`Disabled`, `Suspended`)
/// counts. A record with no status at all is not applicable.
pub struct VersioningDisabledRule;

impl Rule for VersioningDisabledRule {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            name: "versioning-disabled".into(),
            kind: ResourceKind::StorageBucket,
            description: "Bucket versioning is not enabled".into(),
            default_severity: Severity::Medium,
            remediation: Some(
                "Enable versioning to protect objects from accidental overwrite and deletion."
                    .into(),
            ),
        }
    }

    fn evaluate(&self, record: &ResourceRecord) -> Result<Vec<Finding>, RuleFailure> {
        match record.str_field("versioning_status") {
            Some(status) if status != "Enabled" => Ok(vec![Finding::for_record(
                &self.metadata(),
                record,
                format!("Versioning is disabled (status: {status})"),
            )]),
            _ => Ok(vec![]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bucket(fields: serde_json::Value) -> ResourceRecord {
        let mut value = fields;
        value["name"] = json!("assets");
        ResourceRecord::from_value(ResourceKind::StorageBucket, value).unwrap()
    }

    #[test]
    fn flags_all_users_grant() {
        let record = bucket(json!({
            "acl_grants": [
                { "grantee_id": "owner" },
                { "grantee_uri": "http://acs.amazonaws.com/groups/global/AllUsers" }
            ]
        }));
        let findings = PublicAccessRule.evaluate(&record).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_name, "public-access");
        assert_eq!(findings[0].resource_id, "assets");
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[test]
    fn one_finding_for_several_public_grants() {
        let record = bucket(json!({
            "acl_grants": [
                { "grantee_uri": "http://acs.amazonaws.com/groups/global/AllUsers" },
                { "grantee_uri": "http://acs.amazonaws.com/groups/global/AuthenticatedUsers" }
            ]
        }));
        assert_eq!(PublicAccessRule.evaluate(&record).unwrap().len(), 1);
    }

    #[test]
    fn private_grants_pass() {
        let record = bucket(json!({
            "acl_grants": [
                { "grantee_uri": "http://acs.amazonaws.com/groups/s3/LogDelivery" }
            ]
        }));
        assert!(PublicAccessRule.evaluate(&record).unwrap().is_empty());
    }

    #[test]
    fn missing_fields_are_not_applicable() {
        let record = bucket(json!({}));
        assert!(PublicAccessRule.evaluate(&record).unwrap().is_empty());
        assert!(LoggingDisabledRule.evaluate(&record).unwrap().is_empty());
        assert!(VersioningDisabledRule.evaluate(&record).unwrap().is_empty());
    }

    #[test]
    fn logging_disabled_flagged() {
        let record = bucket(json!({ "logging_enabled": false }));
        assert_eq!(LoggingDisabledRule.evaluate(&record).unwrap().len(), 1);
        let record = bucket(json!({ "logging_enabled": true }));
        assert!(LoggingDisabledRule.evaluate(&record).unwrap().is_empty());
    }

    #[test]
    fn suspended_versioning_flagged() {
        let record = bucket(json!({ "versioning_status": "Suspended" }));
        let findings = VersioningDisabledRule.evaluate(&record).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("Suspended"));

        let record = bucket(json!({ "versioning_status": "Enabled" }));
        assert!(VersioningDisabledRule.evaluate(&record).unwrap().is_empty());
    }
}
