pub mod sqlite;

use crate::app::Result;
use crate::domain::{Item, KeySet, Source};

pub use sqlite::SqliteStore;

/// Four independently persisted aggregates.
///
/// Every `save_*` replaces its aggregate wholesale in its own transaction;
/// there is no atomicity across aggregates.
pub trait Store {
    // Sources, in user order
    fn load_sources(&self) -> Result<Vec<Source>>;
    fn save_sources(&self, sources: &[Source]) -> Result<()>;

    // Item cache, in display order
    fn load_items(&self) -> Result<Vec<Item>>;
    fn save_items(&self, items: &[Item]) -> Result<()>;

    // Read / starred stable keys
    fn load_read_keys(&self) -> Result<KeySet>;
    fn save_read_keys(&self, keys: &KeySet) -> Result<()>;
    fn load_starred_keys(&self) -> Result<KeySet>;
    fn save_starred_keys(&self, keys: &KeySet) -> Result<()>;
}
