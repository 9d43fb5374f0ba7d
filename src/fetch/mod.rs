pub mod inventory;
pub mod memory;

use crate::error::FetchError;
use crate::resource::{ResourceKind, ResourceRecord};

pub use inventory::{Inventory, InventoryFetcher};
pub use memory::StaticFetcher;

/// A fetcher supplies the raw records of one resource kind.
///
/// Provider SDK adapters implement this; the engine depends on nothing
/// else. A failure covers the whole kind and is recorded, not raised.
pub trait ResourceFetcher: Send + Sync {
    /// The resource kind this fetcher serves.
    fn kind(&self) -> ResourceKind;

    /// Fetch every record of this kind.
    fn fetch(&self) -> Result<Vec<ResourceRecord>, FetchError>;
}
