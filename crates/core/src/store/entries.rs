//! Region and entry operations for the SQLite backend.
//!
//! Entries are ordered by an autoincrement sequence. A put deletes any
//! previous entry for the identity and inserts a fresh row, so overwrites
//! land at the back of the insertion order.

use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use url::Url;

use super::backend::RegionBackend;
use super::connection::RegionDb;
use super::hash::identity_key;
use crate::{Error, RequestIdentity, ResponseSnapshot};

fn identity_from_row(method: String, url: &str) -> Result<RequestIdentity, Error> {
    let url = Url::parse(url).map_err(|e| Error::RegionIo(format!("stored URL {url} is malformed: {e}")))?;
    Ok(RequestIdentity::new(method, url))
}

#[async_trait::async_trait]
impl RegionBackend for RegionDb {
    async fn open_region(&self, region: &str) -> Result<(), Error> {
        let region = region.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO regions (name, created_at) VALUES (?1, ?2)",
                    params![region, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn get(&self, region: &str, identity: &RequestIdentity) -> Result<Option<ResponseSnapshot>, Error> {
        let region = region.to_string();
        let key = identity_key(identity);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(String, u16, String, Vec<u8>, String)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT final_url, status_code, headers_json, body, captured_at
                     FROM entries WHERE region = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![region, key], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
                });

                match result {
                    Ok(r) => Ok(Some(r)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        let Some((url, status, headers_json, body, captured_at)) = row else {
            return Ok(None);
        };

        Ok(Some(ResponseSnapshot {
            url,
            status,
            headers: serde_json::from_str(&headers_json)?,
            body: Bytes::from(body),
            captured_at,
        }))
    }

    async fn put(&self, region: &str, identity: &RequestIdentity, snapshot: &ResponseSnapshot) -> Result<(), Error> {
        let region = region.to_string();
        let key = identity_key(identity);
        let method = identity.method().to_string();
        let url = identity.url().to_string();
        let headers_json = serde_json::to_string(&snapshot.headers)?;
        let snapshot = snapshot.clone();
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO regions (name, created_at) VALUES (?1, ?2)",
                    params![region, now],
                )?;
                tx.execute("DELETE FROM entries WHERE region = ?1 AND key_hash = ?2", params![region, key])?;
                tx.execute(
                    "INSERT INTO entries (
                        region, key_hash, method, url, final_url, status_code,
                        headers_json, body, captured_at, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        region,
                        key,
                        method,
                        url,
                        snapshot.url,
                        snapshot.status,
                        headers_json,
                        snapshot.body.as_ref(),
                        snapshot.captured_at,
                        now,
                    ],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, region: &str, identity: &RequestIdentity) -> Result<bool, Error> {
        let region = region.to_string();
        let key = identity_key(identity);
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM entries WHERE region = ?1 AND key_hash = ?2", params![region, key])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self, region: &str) -> Result<Vec<RequestIdentity>, Error> {
        let region = region.to_string();
        let rows = self
            .conn
            .call(move |conn| -> Result<Vec<(String, String)>, Error> {
                let mut stmt = conn.prepare("SELECT method, url FROM entries WHERE region = ?1 ORDER BY seq ASC")?;
                let rows = stmt
                    .query_map(params![region], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter()
            .map(|(method, url)| identity_from_row(method, &url))
            .collect()
    }

    async fn count(&self, region: &str) -> Result<u64, Error> {
        let region = region.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE region = ?1", params![region], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    async fn region_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM regions ORDER BY created_at ASC, name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_region(&self, region: &str) -> Result<bool, Error> {
        let region = region.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM regions WHERE name = ?1", params![region])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}
