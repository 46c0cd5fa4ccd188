use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{Result, RunnelError};
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::parallel::ParallelFetcher;
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::store::{SqliteStore, Store};

pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn Store + Send + Sync>,
    pub parallel_fetcher: ParallelFetcher,
    pub normalizer: Normalizer,
}

impl AppContext {
    pub fn new(db_path: Option<PathBuf>, config: Config) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        let fetcher = Arc::new(HttpFetcher::with_options(
            config.fetch.timeout(),
            &config.fetch.user_agent,
        )?);

        Ok(Self::with_parts(config, store, fetcher))
    }

    pub fn with_parts(
        config: Config,
        store: Arc<dyn Store + Send + Sync>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
    ) -> Self {
        let parallel_fetcher = ParallelFetcher::with_workers(fetcher, config.fetch.workers);

        Self {
            config,
            store,
            parallel_fetcher,
            normalizer: Normalizer::new(),
        }
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| RunnelError::Config("Could not find data directory".into()))?;
        let runnel_dir = data_dir.join("runnel");
        std::fs::create_dir_all(&runnel_dir)?;
        Ok(runnel_dir.join("runnel.db"))
    }
}
