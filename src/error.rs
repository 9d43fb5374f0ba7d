use thiserror::Error;

use crate::resource::ResourceKind;

pub type Result<T> = std::result::Result<T, AuditError>;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Config file error: {0}")]
    Config(String),

    #[error("Inventory error in {path}: {message}")]
    Inventory { path: String, message: String },

    #[error("Output error: {0}")]
    Output(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AuditError {
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Setup mistakes. Raised before any fetch or evaluation begins.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Rule '{rule}' is already registered for {kind}")]
    DuplicateRule { kind: ResourceKind, rule: String },

    #[error("Rule '{rule}' applies to {rule_kind} but was registered for {kind}")]
    KindMismatch {
        kind: ResourceKind,
        rule_kind: ResourceKind,
        rule: String,
    },

    #[error("Invalid rule name '{0}': expected lowercase kebab-case")]
    InvalidRuleName(String),

    #[error("Unknown resource kind '{name}'{}", did_you_mean(.suggestion))]
    UnknownKindName {
        name: String,
        suggestion: Option<String>,
    },

    #[error("No fetcher registered for resource kind {0}")]
    UnknownKind(ResourceKind),
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(" (did you mean '{s}'?)"))
        .unwrap_or_default()
}

/// Fetching records for one kind failed. Recorded in the run result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Fetch error ({kind}): {cause}")]
pub struct FetchError {
    pub kind: ResourceKind,
    pub cause: String,
}

impl FetchError {
    pub fn new(kind: ResourceKind, cause: impl Into<String>) -> Self {
        Self {
            kind,
            cause: cause.into(),
        }
    }
}

/// A rule predicate could not evaluate a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct RuleFailure(pub String);
