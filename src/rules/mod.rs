pub mod builtin;
pub mod finding;
pub mod policy;
pub mod registry;

use crate::error::RuleFailure;
use crate::resource::ResourceRecord;

pub use finding::{Finding, RuleMetadata, Severity};
pub use registry::RuleRegistry;

/// A rule checks one `ResourceRecord` and produces findings.
///
/// Rules are pure: no I/O, no shared mutable state. A record missing the
/// fields a rule depends on yields no findings rather than an error.
pub trait Rule: Send + Sync {
    /// Metadata about this rule (name, kind, severity, remediation).
    fn metadata(&self) -> RuleMetadata;

    /// Evaluate the rule against one record.
    fn evaluate(&self, record: &ResourceRecord) -> Result<Vec<Finding>, RuleFailure>;
}
