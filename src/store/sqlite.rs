use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use rusqlite_migration::{Migrations, M};
use url::Url;
use uuid::Uuid;

use crate::app::{Result, RunnelError};
use crate::domain::{Item, KeySet, Source};
use crate::store::Store;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| RunnelError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            RunnelError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| s.parse::<DateTime<Utc>>())
    }

    fn load_keys(&self, table: &str) -> Result<KeySet> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT key FROM {table}"))?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<KeySet, _>>()?;
        Ok(keys)
    }

    fn save_keys(&self, table: &str, keys: &KeySet) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(&format!("DELETE FROM {table}"), [])?;
        {
            let mut stmt = tx.prepare(&format!("INSERT OR IGNORE INTO {table} (key) VALUES (?1)"))?;
            for key in keys.iter() {
                stmt.execute(params![key])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn conversion_error<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn uuid_column(idx: usize, raw: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| conversion_error(idx, e))
}

fn url_column(idx: usize, raw: &str) -> rusqlite::Result<Url> {
    Url::parse(raw).map_err(|e| conversion_error(idx, e))
}

fn optional_url_column(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<Url>> {
    raw.map(|s| url_column(idx, &s)).transpose()
}

fn datetime_column(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    SqliteStore::parse_datetime(raw).map_err(|e| conversion_error(idx, e))
}

impl Store for SqliteStore {
    fn load_sources(&self) -> Result<Vec<Source>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, url, name, icon_url, added_at FROM sources ORDER BY position",
        )?;

        let sources = stmt
            .query_map([], |row| {
                Ok(Source {
                    id: uuid_column(0, &row.get::<_, String>(0)?)?,
                    url: url_column(1, &row.get::<_, String>(1)?)?,
                    name: row.get(2)?,
                    icon_url: optional_url_column(3, row.get(3)?)?,
                    added_at: datetime_column(4, &row.get::<_, String>(4)?)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sources)
    }

    fn save_sources(&self, sources: &[Source]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM sources", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO sources (id, url, name, icon_url, added_at, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (position, source) in sources.iter().enumerate() {
                stmt.execute(params![
                    source.id.to_string(),
                    source.url.as_str(),
                    source.name,
                    source.icon_url.as_ref().map(Url::as_str),
                    source.added_at.to_rfc3339(),
                    position as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn load_items(&self) -> Result<Vec<Item>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, summary, link, published_at, image_url, source_id
             FROM items ORDER BY position",
        )?;

        let items = stmt
            .query_map([], |row| {
                Ok(Item {
                    id: uuid_column(0, &row.get::<_, String>(0)?)?,
                    title: row.get(1)?,
                    summary: row.get(2)?,
                    link: optional_url_column(3, row.get(3)?)?,
                    published_at: datetime_column(4, &row.get::<_, String>(4)?)?,
                    image_url: optional_url_column(5, row.get(5)?)?,
                    source_id: row
                        .get::<_, Option<String>>(6)?
                        .map(|s| uuid_column(6, &s))
                        .transpose()?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn save_items(&self, items: &[Item]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM items", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO items (id, title, summary, link, published_at, image_url, source_id, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for (position, item) in items.iter().enumerate() {
                stmt.execute(params![
                    item.id.to_string(),
                    item.title,
                    item.summary,
                    item.link.as_ref().map(Url::as_str),
                    item.published_at.to_rfc3339(),
                    item.image_url.as_ref().map(Url::as_str),
                    item.source_id.map(|id| id.to_string()),
                    position as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn load_read_keys(&self) -> Result<KeySet> {
        self.load_keys("read_ids")
    }

    fn save_read_keys(&self, keys: &KeySet) -> Result<()> {
        self.save_keys("read_ids", keys)
    }

    fn load_starred_keys(&self) -> Result<KeySet> {
        self.load_keys("starred_ids")
    }

    fn save_starred_keys(&self, keys: &KeySet) -> Result<()> {
        self.save_keys("starred_ids", keys)
    }
}
