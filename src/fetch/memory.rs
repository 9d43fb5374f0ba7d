use crate::error::FetchError;
use crate::resource::{ResourceKind, ResourceRecord};

use super::ResourceFetcher;

/// Fetcher over records already in memory, or a canned failure.
///
/// Useful for embedding the engine behind a custom collector and for
/// exercising fetch-failure isolation.
#[derive(Debug, Clone)]
pub struct StaticFetcher {
    kind: ResourceKind,
    outcome: Result<Vec<ResourceRecord>, String>,
}

impl StaticFetcher {
    pub fn new(kind: ResourceKind, records: Vec<ResourceRecord>) -> Self {
        Self {
            kind,
            outcome: Ok(records),
        }
    }

    /// A fetcher whose every call fails with `cause`.
    pub fn failing(kind: ResourceKind, cause: impl Into<String>) -> Self {
        Self {
            kind,
            outcome: Err(cause.into()),
        }
    }
}

impl ResourceFetcher for StaticFetcher {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn fetch(&self) -> Result<Vec<ResourceRecord>, FetchError> {
        self.outcome
            .clone()
            .map_err(|cause| FetchError::new(self.kind, cause))
    }
}
