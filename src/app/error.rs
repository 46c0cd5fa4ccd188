use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnelError {
    #[error("Invalid URL: {0}")]
    InvalidLocator(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Not a recognized feed: {0}")]
    Decode(String),

    #[error("Could not validate {url}: {source}")]
    Validation {
        url: String,
        #[source]
        source: Box<RunnelError>,
    },

    #[error("All {failed} sources failed to update (first error: {first})")]
    AllSourcesFailed { failed: usize, first: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<url::ParseError> for RunnelError {
    fn from(e: url::ParseError) -> Self {
        RunnelError::InvalidLocator(e.to_string())
    }
}

impl RunnelError {
    /// Wrap a fetch/decode failure with the URL the user tried to add or edit.
    pub fn validation(url: &str, source: RunnelError) -> Self {
        RunnelError::Validation {
            url: url.to_string(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, RunnelError>;
