pub mod item;
pub mod source;
pub mod state;

pub use item::{sort_newest_first, Item};
pub use source::Source;
pub use state::{FeedFilter, KeySet};
