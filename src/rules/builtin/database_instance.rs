use crate::error::RuleFailure;
use crate::resource::{ResourceKind, ResourceRecord};
use crate::rules::{Finding, Rule, RuleMetadata, Severity};

/// public-instance: Database instance has a public endpoint.
pub struct PublicInstanceRule;

impl Rule for PublicInstanceRule {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            name: "public-instance".into(),
            kind: ResourceKind::DatabaseInstance,
            description: "Database instance is publicly accessible".into(),
            default_severity: Severity::High,
            remediation: Some(
                "Disable public accessibility and reach the instance through private \
                 subnets or a bastion."
                    .into(),
            ),
        }
    }

    fn evaluate(&self, record: &ResourceRecord) -> Result<Vec<Finding>, RuleFailure> {
        match record.bool_field("publicly_accessible") {
            Some(true) => Ok(vec![Finding::for_record(
                &self.metadata(),
                record,
                "Database instance is publicly accessible",
            )]),
            _ => Ok(vec![]),
        }
    }
}

/// no-deletion-protection: Instance can be deleted without a safeguard.
pub struct NoDeletionProtectionRule;

impl Rule for NoDeletionProtectionRule {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            name: "no-deletion-protection".into(),
            kind: ResourceKind::DatabaseInstance,
            description: "Database instance has deletion protection disabled".into(),
            default_severity: Severity::Medium,
            remediation: Some("Enable deletion protection on the instance.".into()),
        }
    }

    fn evaluate(&self, record: &ResourceRecord) -> Result<Vec<Finding>, RuleFailure> {
        match record.bool_field("deletion_protection") {
            Some(false) => Ok(vec![Finding::for_record(
                &self.metadata(),
                record,
                "Deletion protection is disabled",
            )]),
            _ => Ok(vec![]),
        }
    }
}

/// no-backup: Automated backups are turned off.
///
/// A retention period of zero days disables automated backups.
pub struct NoBackupRule;

impl Rule for NoBackupRule {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            name: "no-backup".into(),
            kind: ResourceKind::DatabaseInstance,
            description: "Database instance has automated backups disabled".into(),
            default_severity: Severity::High,
            remediation: Some("Set a backup retention period of at least 7 days.".into()),
        }
    }

    fn evaluate(&self, record: &ResourceRecord) -> Result<Vec<Finding>, RuleFailure> {
        match record.i64_field("backup_retention_period") {
            Some(0) => Ok(vec![Finding::for_record(
                &self.metadata(),
                record,
                "Backup is disabled (retention period is 0 days)",
            )]),
            _ => Ok(vec![]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instance(fields: serde_json::Value) -> ResourceRecord {
        let mut value = fields;
        value["db_instance_identifier"] = json!("orders-db");
        ResourceRecord::from_value(ResourceKind::DatabaseInstance, value).unwrap()
    }

    #[test]
    fn hardened_instance_passes() {
        let record = instance(json!({
            "publicly_accessible": false,
            "deletion_protection": true,
            "backup_retention_period": 7
        }));
        assert!(PublicInstanceRule.evaluate(&record).unwrap().is_empty());
        assert!(NoDeletionProtectionRule.evaluate(&record).unwrap().is_empty());
        assert!(NoBackupRule.evaluate(&record).unwrap().is_empty());
    }

    #[test]
    fn exposed_instance_flagged_by_each_rule() {
        let record = instance(json!({
            "publicly_accessible": true,
            "deletion_protection": false,
            "backup_retention_period": 0
        }));
        let public = PublicInstanceRule.evaluate(&record).unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].resource_id, "orders-db");
        assert_eq!(NoDeletionProtectionRule.evaluate(&record).unwrap().len(), 1);
        assert_eq!(NoBackupRule.evaluate(&record).unwrap().len(), 1);
    }

    #[test]
    fn missing_fields_are_not_applicable() {
        let record = instance(json!({}));
        assert!(PublicInstanceRule.evaluate(&record).unwrap().is_empty());
        assert!(NoDeletionProtectionRule.evaluate(&record).unwrap().is_empty());
        assert!(NoBackupRule.evaluate(&record).unwrap().is_empty());
    }
}
