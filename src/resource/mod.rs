//! Resource model shared by fetchers, rules and the engine.
//!
//! Fetchers produce `ResourceRecord`s. Rules read them. Records stay opaque
//! key-value documents in the provider's own shape; rules pull typed fields
//! out through the accessors below and treat anything absent or ill-typed
//! as "not applicable".

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigurationError;

/// Category of cloud resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    StorageBucket,
    DatabaseInstance,
    SecurityGroup,
}

impl ResourceKind {
    /// Every kind, in audit order.
    pub const ALL: [ResourceKind; 3] = [
        Self::StorageBucket,
        Self::DatabaseInstance,
        Self::SecurityGroup,
    ];

    /// Canonical snake_case name, also the inventory section key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StorageBucket => "storage_bucket",
            Self::DatabaseInstance => "database_instance",
            Self::SecurityGroup => "security_group",
        }
    }

    /// Field holding the resource identifier in provider records.
    pub fn id_field(&self) -> &'static str {
        match self {
            Self::StorageBucket => "name",
            Self::DatabaseInstance => "db_instance_identifier",
            Self::SecurityGroup => "group_id",
        }
    }

    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "storage_bucket" | "bucket" | "buckets" | "s3" => Some(Self::StorageBucket),
            "database_instance" | "database" | "db" | "rds" => Some(Self::DatabaseInstance),
            "security_group" | "sg" | "security_groups" | "firewall" => Some(Self::SecurityGroup),
            _ => None,
        }
    }

    /// Parse a user-supplied kind name, suggesting the closest canonical
    /// name when it is not recognised.
    pub fn parse(s: &str) -> Result<Self, ConfigurationError> {
        Self::from_str_lenient(s).ok_or_else(|| {
            let needle = s.trim().to_lowercase();
            let suggestion = Self::ALL
                .iter()
                .map(|k| (levenshtein::levenshtein(&needle, k.as_str()), k.as_str()))
                .filter(|(distance, _)| *distance <= 3)
                .min_by_key(|(distance, _)| *distance)
                .map(|(_, name)| name.to_string());
            ConfigurationError::UnknownKindName {
                name: s.to_string(),
                suggestion,
            }
        })
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cloud resource as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub kind: ResourceKind,
    pub id: String,
    pub fields: Map<String, Value>,
}

impl ResourceRecord {
    pub fn new(kind: ResourceKind, id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            kind,
            id: id.into(),
            fields,
        }
    }

    /// Build a record from a provider document, taking the id from the
    /// kind's id field. Returns `None` when the value is not an object or
    /// the id is missing.
    pub fn from_value(kind: ResourceKind, value: Value) -> Option<Self> {
        let Value::Object(fields) = value else {
            return None;
        };
        let id = fields.get(kind.id_field())?.as_str()?.to_string();
        Some(Self::new(kind, id, fields))
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.field(name).and_then(Value::as_bool)
    }

    pub fn i64_field(&self, name: &str) -> Option<i64> {
        self.field(name).and_then(Value::as_i64)
    }

    pub fn array_field(&self, name: &str) -> Option<&Vec<Value>> {
        self.field(name).and_then(Value::as_array)
    }
}
