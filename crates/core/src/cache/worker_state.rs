//! Persisted offline worker lifecycle.
//!
//! Lets separate CLI invocations continue the install/activate sequence.

use tokio_rusqlite::{params, rusqlite};

use super::connection::CacheDb;
use crate::Error;

/// Row of the single-entry `worker_state` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRecord {
    pub cache_version: String,
    pub state: String,
    /// Site build version the worker was installed against.
    pub site_version: Option<String>,
    pub skip_waiting: bool,
    pub updated_at: String,
}

impl CacheDb {
    pub async fn load_worker_record(&self) -> Result<Option<WorkerRecord>, Error> {
        self.conn
            .call(|conn| -> Result<Option<WorkerRecord>, Error> {
                let result = conn.query_row(
                    "SELECT cache_version, state, site_version, skip_waiting, updated_at
                    FROM worker_state WHERE id = 1",
                    [],
                    |row| {
                        Ok(WorkerRecord {
                            cache_version: row.get(0)?,
                            state: row.get(1)?,
                            site_version: row.get(2)?,
                            skip_waiting: row.get::<_, i32>(3)? == 1,
                            updated_at: row.get(4)?,
                        })
                    },
                );

                match result {
                    Ok(record) => Ok(Some(record)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    pub async fn save_worker_record(&self, record: &WorkerRecord) -> Result<(), Error> {
        let record = record.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO worker_state (id, cache_version, state, site_version, skip_waiting, updated_at)
                    VALUES (1, ?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(id) DO UPDATE SET
                        cache_version = excluded.cache_version,
                        state = excluded.state,
                        site_version = excluded.site_version,
                        skip_waiting = excluded.skip_waiting,
                        updated_at = excluded.updated_at",
                    params![
                        record.cache_version,
                        record.state,
                        record.site_version,
                        record.skip_waiting as i32,
                        record.updated_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
