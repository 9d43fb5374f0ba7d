use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::error::{AuditError, FetchError, Result};
use crate::resource::{ResourceKind, ResourceRecord};

use super::ResourceFetcher;

/// A parsed inventory export.
///
/// The document is a JSON object keyed by resource kind, each section an
/// array of provider records:
///
/// ```json
/// { "storage_bucket": [ { "name": "assets", "logging_enabled": true } ] }
/// ```
#[derive(Debug, Clone)]
pub struct Inventory {
    source: PathBuf,
    document: Arc<Value>,
}

impl Inventory {
    /// Read and parse an inventory file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AuditError::Inventory {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(path, &content)
    }

    /// Parse inventory JSON. `source` is only used in messages.
    pub fn parse(source: &Path, content: &str) -> Result<Self> {
        let document: Value =
            serde_json::from_str(content).map_err(|e| AuditError::Inventory {
                path: source.display().to_string(),
                message: e.to_string(),
            })?;
        if !document.is_object() {
            return Err(AuditError::Inventory {
                path: source.display().to_string(),
                message: "top level must be an object keyed by resource kind".into(),
            });
        }
        Ok(Self {
            source: source.to_path_buf(),
            document: Arc::new(document),
        })
    }

    /// One fetcher per resource kind, all sharing this document.
    pub fn fetchers(&self) -> Vec<Box<dyn ResourceFetcher>> {
        ResourceKind::ALL
            .iter()
            .map(|&kind| Box::new(self.fetcher(kind)) as Box<dyn ResourceFetcher>)
            .collect()
    }

    pub fn fetcher(&self, kind: ResourceKind) -> InventoryFetcher {
        InventoryFetcher {
            kind,
            source: self.source.clone(),
            document: Arc::clone(&self.document),
        }
    }
}

/// Serves one kind's section of an `Inventory`.
#[derive(Debug, Clone)]
pub struct InventoryFetcher {
    kind: ResourceKind,
    source: PathBuf,
    document: Arc<Value>,
}

impl ResourceFetcher for InventoryFetcher {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn fetch(&self) -> std::result::Result<Vec<ResourceRecord>, FetchError> {
        let section = match self.document.get(self.kind.as_str()) {
            None | Some(Value::Null) => return Ok(vec![]),
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                return Err(FetchError::new(
                    self.kind,
                    format!(
                        "section '{}' in {} is not an array",
                        self.kind,
                        self.source.display()
                    ),
                ))
            }
        };

        let mut records = Vec::with_capacity(section.len());
        for (index, entry) in section.iter().enumerate() {
            match ResourceRecord::from_value(self.kind, entry.clone()) {
                Some(record) => records.push(record),
                None => {
                    tracing::warn!(
                        kind = %self.kind,
                        index,
                        id_field = self.kind.id_field(),
                        "inventory entry has no identifier, skipping"
                    );
                }
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn inventory(json: &str) -> Inventory {
        Inventory::parse(Path::new("inventory.json"), json).unwrap()
    }

    #[test]
    fn fetches_records_of_requested_kind() {
        let inv = inventory(
            r#"{
                "storage_bucket": [ { "name": "a" }, { "name": "b" } ],
                "security_group": [ { "group_id": "sg-1" } ]
            }"#,
        );
        let buckets = inv.fetcher(ResourceKind::StorageBucket).fetch().unwrap();
        let ids: Vec<_> = buckets.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let groups = inv.fetcher(ResourceKind::SecurityGroup).fetch().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].kind, ResourceKind::SecurityGroup);
    }

    #[test]
    fn absent_section_is_empty() {
        let inv = inventory(r#"{ "storage_bucket": [] }"#);
        assert!(inv
            .fetcher(ResourceKind::DatabaseInstance)
            .fetch()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn non_array_section_is_fetch_error() {
        let inv = inventory(r#"{ "database_instance": { "db_instance_identifier": "x" } }"#);
        let err = inv
            .fetcher(ResourceKind::DatabaseInstance)
            .fetch()
            .unwrap_err();
        assert_eq!(err.kind, ResourceKind::DatabaseInstance);
        assert!(err.cause.contains("not an array"));
    }

    #[test]
    fn entries_without_id_are_skipped() {
        let inv = inventory(
            r#"{ "storage_bucket": [ { "logging_enabled": false }, 42, { "name": "kept" } ] }"#,
        );
        let records = inv.fetcher(ResourceKind::StorageBucket).fetch().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "kept");
    }

    #[test]
    fn one_fetcher_per_kind() {
        let inv = inventory("{}");
        let kinds: Vec<_> = inv.fetchers().iter().map(|f| f.kind()).collect();
        assert_eq!(kinds, ResourceKind::ALL.to_vec());
    }

    #[test]
    fn rejects_non_object_document() {
        let err = Inventory::parse(Path::new("inv.json"), "[1, 2]").unwrap_err();
        assert!(matches!(err, AuditError::Inventory { .. }));
    }

    #[test]
    fn load_reads_file_and_reports_missing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "security_group": [ {{ "group_id": "sg-9" }} ] }}"#).unwrap();
        let inv = Inventory::load(file.path()).unwrap();
        assert_eq!(
            inv.fetcher(ResourceKind::SecurityGroup).fetch().unwrap()[0].id,
            "sg-9"
        );

        let err = Inventory::load(Path::new("/nonexistent/inventory.json")).unwrap_err();
        assert!(matches!(err, AuditError::Inventory { .. }));
    }
}
