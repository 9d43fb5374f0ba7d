mod database_instance;
mod security_group;
mod storage_bucket;

use crate::error::ConfigurationError;

use super::{Rule, RuleRegistry};

pub use security_group::OpenPortRule;

/// Returns all builtin rules, bucket checks first.
pub fn all_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(storage_bucket::PublicAccessRule),
        Box::new(storage_bucket::LoggingDisabledRule),
        Box::new(storage_bucket::VersioningDisabledRule),
        Box::new(database_instance::PublicInstanceRule),
        Box::new(database_instance::NoDeletionProtectionRule),
        Box::new(database_instance::NoBackupRule),
        Box::new(OpenPortRule::ssh()),
        Box::new(OpenPortRule::mongodb()),
    ]
}

/// Register every builtin rule under the kind it declares.
pub fn register_all(registry: &mut RuleRegistry) -> Result<(), ConfigurationError> {
    for rule in all_rules() {
        let kind = rule.metadata().kind;
        registry.register(kind, rule)?;
    }
    Ok(())
}
