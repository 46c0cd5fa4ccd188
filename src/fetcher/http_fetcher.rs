use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::app::{Result, RunnelError};
use crate::fetcher::Fetcher;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = concat!("runnel/", env!("CARGO_PKG_VERSION"));

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_options(Duration::from_secs(DEFAULT_TIMEOUT_SECS), DEFAULT_USER_AGENT)
    }

    pub fn with_options(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(user_agent)
            .build()
            .map_err(|e| RunnelError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let parsed = url::Url::parse(url)?;
        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(RunnelError::InvalidLocator(format!(
                    "unsupported URL scheme: {}",
                    scheme
                )))
            }
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| RunnelError::Transport(format!("failed to fetch feed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RunnelError::Transport(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RunnelError::Transport(format!("failed to read response: {}", e)))?;

        Ok(body.to_vec())
    }
}
