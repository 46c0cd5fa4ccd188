pub mod context;
pub mod error;
pub mod reader;

pub use context::AppContext;
pub use error::{Result, RunnelError};
pub use reader::{FeedReader, RefreshOutcome};
