//! Named caches and their URL-keyed responses.
//!
//! Mirrors the browser CacheStorage surface: open/has/delete/keys on cache
//! names, put/match on entries.

use std::collections::BTreeMap;

use bytes::Bytes;
use tokio_rusqlite::{params, rusqlite};

use super::connection::CacheDb;
use crate::Error;

/// A stored HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub stored_at: String,
}

impl CachedResponse {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            url: url.into(),
            status,
            content_type: None,
            headers: Vec::new(),
            body: body.into(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Only 2xx responses are worth storing.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Self, String)> {
        let status: i64 = row.get(1)?;
        let body: Vec<u8> = row.get(4)?;
        let response = Self {
            url: row.get(0)?,
            status: u16::try_from(status).unwrap_or(0),
            content_type: row.get(2)?,
            headers: Vec::new(),
            body: Bytes::from(body),
            stored_at: row.get(5)?,
        };
        let headers_json: String = row.get(3)?;
        Ok((response, headers_json))
    }
}

const SELECT_ENTRY: &str = "SELECT url, status, content_type, headers_json, body, stored_at FROM cache_entries";

fn decode_row(row: (CachedResponse, String)) -> Result<CachedResponse, Error> {
    let (mut response, headers_json) = row;
    response.headers = serde_json::from_str(&headers_json)
        .map_err(|e| Error::InvalidInput(format!("corrupt headers for {}: {e}", response.url)))?;
    Ok(response)
}

impl CacheDb {
    /// Create the named cache if it does not exist yet.
    pub async fn open_cache(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    pub async fn has_cache(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists =
                    conn.query_row("SELECT EXISTS(SELECT 1 FROM caches WHERE name = ?1)", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// All cache names in creation order.
    pub async fn cache_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY rowid")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a cache and all of its entries.
    ///
    /// Returns false if no cache had that name.
    pub async fn delete_cache(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM cache_entries WHERE cache_name = ?1", params![name])?;
                let deleted = tx.execute("DELETE FROM caches WHERE name = ?1", params![name])?;
                tx.commit()?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Store a response under `cache_name`, replacing any previous entry for its URL.
    pub async fn put(&self, cache_name: &str, response: &CachedResponse) -> Result<(), Error> {
        let cache_name = cache_name.to_string();
        let response = response.clone();
        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::InvalidInput(format!("failed to encode headers: {e}")))?;
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![cache_name, now],
                )?;
                tx.execute(
                    "INSERT INTO cache_entries (cache_name, url, status, content_type, headers_json, body, stored_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    ON CONFLICT(cache_name, url) DO UPDATE SET
                        status = excluded.status,
                        content_type = excluded.content_type,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        cache_name,
                        response.url,
                        response.status,
                        response.content_type,
                        headers_json,
                        response.body.as_ref(),
                        response.stored_at,
                    ],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a URL in one cache.
    pub async fn match_in(&self, cache_name: &str, url: &str) -> Result<Option<CachedResponse>, Error> {
        let cache_name = cache_name.to_string();
        let url = url.to_string();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(CachedResponse, String)>, Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_ENTRY} WHERE cache_name = ?1 AND url = ?2"))?;
                match stmt.query_row(params![cache_name, url], CachedResponse::from_row) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;
        row.map(decode_row).transpose()
    }

    /// Look up a URL across every cache, oldest cache first.
    pub async fn match_any(&self, url: &str) -> Result<Option<CachedResponse>, Error> {
        let url = url.to_string();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(CachedResponse, String)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.url, e.status, e.content_type, e.headers_json, e.body, e.stored_at
                    FROM cache_entries e JOIN caches c ON c.name = e.cache_name
                    WHERE e.url = ?1 ORDER BY c.rowid LIMIT 1",
                )?;
                match stmt.query_row(params![url], CachedResponse::from_row) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;
        row.map(decode_row).transpose()
    }

    /// Remove one entry. Returns false if it was not cached.
    pub async fn delete_entry(&self, cache_name: &str, url: &str) -> Result<bool, Error> {
        let cache_name = cache_name.to_string();
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let n = conn.execute(
                    "DELETE FROM cache_entries WHERE cache_name = ?1 AND url = ?2",
                    params![cache_name, url],
                )?;
                Ok(n > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// URLs stored in one cache.
    pub async fn keys(&self, cache_name: &str) -> Result<Vec<String>, Error> {
        let cache_name = cache_name.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM cache_entries WHERE cache_name = ?1 ORDER BY url")?;
                let urls = stmt
                    .query_map(params![cache_name], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }

    /// Entry count per cache, including empty caches.
    pub async fn entry_counts(&self) -> Result<BTreeMap<String, u64>, Error> {
        self.conn
            .call(|conn| -> Result<BTreeMap<String, u64>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT c.name, COUNT(e.url) FROM caches c
                    LEFT JOIN cache_entries e ON e.cache_name = c.name
                    GROUP BY c.name",
                )?;
                let counts = stmt
                    .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64)))?
                    .collect::<Result<BTreeMap<_, _>, _>>()?;
                Ok(counts)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every cache. Returns the deleted names.
    pub async fn clear_all(&self) -> Result<Vec<String>, Error> {
        let names = self.cache_names().await?;
        for name in &names {
            self.delete_cache(name).await?;
        }
        Ok(names)
    }
}
