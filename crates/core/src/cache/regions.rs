//! Region and entry operations.
//!
//! A region is a named partition of the cache. Entries are keyed by request
//! identity within a region, so a region holds at most one response per request.

use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

use super::connection::CacheDb;
use super::hash::request_key;
use crate::Error;
use crate::http::{Request, Response};

/// Raw entry columns as read from SQLite, decoded outside the connection thread.
struct EntryRow {
    status: i64,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self { status: row.get(0)?, status_text: row.get(1)?, headers_json: row.get(2)?, body: row.get(3)? })
    }

    fn into_response(self) -> Result<Response, Error> {
        let headers: Vec<(String, String)> =
            serde_json::from_str(&self.headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let status = u16::try_from(self.status).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        Ok(Response { status, status_text: self.status_text, headers, body: Bytes::from(self.body) })
    }
}

/// Owned copy of an entry ready to be written.
struct NewEntry {
    key: String,
    method: String,
    url: String,
    status: i64,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
}

impl NewEntry {
    fn new(request: &Request, response: &Response) -> Result<Self, Error> {
        let headers_json = serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        Ok(Self {
            key: request_key(request),
            method: request.method.clone(),
            url: request.identity_url(),
            status: i64::from(response.status),
            status_text: response.status_text.clone(),
            headers_json,
            body: response.body.to_vec(),
        })
    }

    fn write(&self, conn: &rusqlite::Connection, region: &str, stored_at: &str) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO entries (
                region, request_key, method, url, status, status_text, headers_json, body, stored_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(region, request_key) DO UPDATE SET
                method = excluded.method,
                url = excluded.url,
                status = excluded.status,
                status_text = excluded.status_text,
                headers_json = excluded.headers_json,
                body = excluded.body,
                stored_at = excluded.stored_at",
            params![
                region,
                &self.key,
                &self.method,
                &self.url,
                self.status,
                &self.status_text,
                &self.headers_json,
                &self.body,
                stored_at,
            ],
        )?;
        Ok(())
    }
}

fn ensure_region(conn: &rusqlite::Connection, name: &str, now: &str) -> rusqlite::Result<()> {
    conn.execute("INSERT OR IGNORE INTO regions (name, created_at) VALUES (?1, ?2)", params![name, now])?;
    Ok(())
}

/// Handle to a single opened region.
#[derive(Clone, Debug)]
pub struct RegionHandle {
    db: CacheDb,
    name: String,
}

impl RegionHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        self.db.match_request(Some(&self.name), request).await
    }

    pub async fn put(&self, request: &Request, response: &Response) -> Result<bool, Error> {
        self.db.put(&self.name, request, response).await
    }

    pub async fn delete(&self, request: &Request) -> Result<bool, Error> {
        self.db.delete_entry(&self.name, request).await
    }

    pub async fn len(&self) -> Result<usize, Error> {
        self.db.region_len(&self.name).await
    }
}

impl CacheDb {
    /// Open a region, creating it if absent. Idempotent.
    pub async fn open_region(&self, name: &str) -> Result<RegionHandle, Error> {
        let region = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_region(conn, &region, &now)?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(RegionHandle { db: self.clone(), name: name.to_string() })
    }

    /// List region names in creation order.
    pub async fn list_regions(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM regions ORDER BY rowid")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a request by identity.
    ///
    /// With a region name, only that region is searched. Without one, every
    /// region is searched in creation order and the first match wins.
    pub async fn match_request(&self, region: Option<&str>, request: &Request) -> Result<Option<Response>, Error> {
        let region = region.map(str::to_string);
        let key = request_key(request);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.status, e.status_text, e.headers_json, e.body
                         FROM entries e JOIN regions r ON r.name = e.region
                         WHERE e.request_key = ?1 AND (?2 IS NULL OR e.region = ?2)
                         ORDER BY r.rowid
                         LIMIT 1",
                        params![key, region],
                        EntryRow::from_row,
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        row.map(EntryRow::into_response).transpose()
    }

    /// Store a response under a request's identity, replacing any prior entry.
    ///
    /// Only 2xx responses are stored; anything else is skipped and `false` is
    /// returned. The region is created if it does not exist yet. The caller's
    /// response is left untouched and stays readable.
    pub async fn put(&self, region: &str, request: &Request, response: &Response) -> Result<bool, Error> {
        if !response.is_success() {
            tracing::debug!(status = response.status, url = %request.url, "not caching non-success response");
            return Ok(false);
        }

        let entry = NewEntry::new(request, response)?;
        let region = region.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_region(conn, &region, &now)?;
                entry.write(conn, &region, &now)?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(true)
    }

    /// Store a batch of responses in one transaction.
    ///
    /// Either every entry is written or none is. A non-2xx response in the
    /// batch rejects the whole batch.
    pub async fn put_all(&self, region: &str, entries: &[(Request, Response)]) -> Result<usize, Error> {
        let mut rows = Vec::with_capacity(entries.len());
        for (request, response) in entries {
            if !response.is_success() {
                return Err(Error::InvalidInput(format!(
                    "refusing to store status {} for {}",
                    response.status, request.url
                )));
            }
            rows.push(NewEntry::new(request, response)?);
        }

        let region = region.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                ensure_region(&tx, &region, &now)?;
                for row in &rows {
                    row.write(&tx, &region, &now)?;
                }
                tx.commit()?;
                Ok(rows.len())
            })
            .await
            .map_err(Error::from)
    }

    /// Remove one entry. Returns whether it existed.
    pub async fn delete_entry(&self, region: &str, request: &Request) -> Result<bool, Error> {
        let region = region.to_string();
        let key = request_key(request);
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count =
                    conn.execute("DELETE FROM entries WHERE region = ?1 AND request_key = ?2", params![region, key])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a region and all of its entries. Returns whether it existed.
    pub async fn delete_region(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM regions WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every region whose name is not in `keep`.
    ///
    /// Returns the names of the deleted regions.
    pub async fn delete_regions_not_in(&self, keep: &[String]) -> Result<Vec<String>, Error> {
        let keep = keep.to_vec();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let tx = conn.transaction()?;
                let names = {
                    let mut stmt = tx.prepare("SELECT name FROM regions ORDER BY rowid")?;
                    stmt.query_map([], |row| row.get::<_, String>(0))?
                        .collect::<Result<Vec<_>, _>>()?
                };

                let mut deleted = Vec::new();
                for name in names.into_iter().filter(|n| !keep.contains(n)) {
                    tx.execute("DELETE FROM regions WHERE name = ?1", params![&name])?;
                    deleted.push(name);
                }
                tx.commit()?;
                Ok(deleted)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in a region.
    pub async fn region_len(&self, name: &str) -> Result<usize, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE region = ?1", params![name], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn req(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    fn ok(body: &'static str) -> Response {
        Response::new(200, "OK", body).with_header("content-type", "text/plain")
    }

    #[tokio::test]
    async fn test_open_region_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_region("static-v1").await.unwrap();
        db.open_region("static-v1").await.unwrap();
        assert_eq!(db.list_regions().await.unwrap(), vec!["static-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let region = db.open_region("static-v1").await.unwrap();
        let request = req("https://example.com/app.css");

        assert!(region.put(&request, &ok("body {}")).await.unwrap());

        let hit = region.match_request(&request).await.unwrap().unwrap();
        assert_eq!(hit.status, 200);
        assert_eq!(hit.body, Bytes::from_static(b"body {}"));
        assert_eq!(hit.content_type(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_put_skips_non_success() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = req("https://example.com/missing");

        let stored = db
            .put("dynamic-v1", &request, &Response::new(404, "Not Found", "nope"))
            .await
            .unwrap();
        assert!(!stored);
        assert!(db.match_request(None, &request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_prior_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = req("https://example.com/api/monastery/1");

        db.put("dynamic-v1", &request, &ok("old")).await.unwrap();
        db.put("dynamic-v1", &request, &ok("new")).await.unwrap();

        let hit = db.match_request(Some("dynamic-v1"), &request).await.unwrap().unwrap();
        assert_eq!(hit.body, Bytes::from_static(b"new"));
        assert_eq!(db.region_len("dynamic-v1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_puts_last_writer_wins() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = req("https://example.com/api/monastery/2");

        let (first, second, third) = (ok("first"), ok("second"), ok("third"));
        let (a, b, c) = tokio::join!(
            db.put("dynamic-v1", &request, &first),
            db.put("dynamic-v1", &request, &second),
            db.put("dynamic-v1", &request, &third),
        );
        assert!(a.unwrap() && b.unwrap() && c.unwrap());

        assert_eq!(db.region_len("dynamic-v1").await.unwrap(), 1);
        let hit = db.match_request(Some("dynamic-v1"), &request).await.unwrap().unwrap();
        assert!(["first", "second", "third"].iter().any(|body| hit.body == body.as_bytes()));
    }

    #[tokio::test]
    async fn test_match_across_regions() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = req("https://example.com/logo.png");
        db.open_region("static-v1").await.unwrap();
        db.put("dynamic-v1", &request, &ok("dynamic")).await.unwrap();

        let hit = db.match_request(None, &request).await.unwrap().unwrap();
        assert_eq!(hit.body, Bytes::from_static(b"dynamic"));
        assert!(db.match_request(Some("static-v1"), &request).await.unwrap().is_none());

        db.put("static-v1", &request, &ok("static")).await.unwrap();
        let hit = db.match_request(None, &request).await.unwrap().unwrap();
        assert_eq!(hit.body, Bytes::from_static(b"static"));
    }

    #[tokio::test]
    async fn test_put_all_is_atomic() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let batch = vec![
            (req("https://example.com/"), ok("index")),
            (req("https://example.com/broken"), Response::new(500, "Internal Server Error", "")),
        ];

        assert!(db.put_all("static-v1", &batch).await.is_err());
        assert!(db.list_regions().await.unwrap().is_empty());

        let written = db.put_all("static-v1", &batch[..1]).await.unwrap();
        assert_eq!(written, 1);
        assert_eq!(db.region_len("static-v1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let region = db.open_region("dynamic-v1").await.unwrap();
        let request = req("https://example.com/api/chat-messages");
        region.put(&request, &ok("[]")).await.unwrap();

        assert!(region.delete(&request).await.unwrap());
        assert!(!region.delete(&request).await.unwrap());
        assert_eq!(region.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_regions_not_in() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = req("https://example.com/");
        for name in ["static-v1", "dynamic-v1", "static-v2", "dynamic-v2"] {
            db.put(name, &request, &ok(name)).await.unwrap();
        }

        let keep = vec!["static-v2".to_string(), "dynamic-v2".to_string()];
        let deleted = db.delete_regions_not_in(&keep).await.unwrap();

        assert_eq!(deleted, vec!["static-v1".to_string(), "dynamic-v1".to_string()]);
        assert_eq!(db.list_regions().await.unwrap(), keep);
        assert_eq!(db.region_len("static-v1").await.unwrap(), 0);

        let kept = db.match_request(Some("static-v2"), &request).await.unwrap().unwrap();
        assert_eq!(kept.body, Bytes::from_static(b"static-v2"));
    }

    #[tokio::test]
    async fn test_delete_region() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_region("old").await.unwrap();
        assert!(db.delete_region("old").await.unwrap());
        assert!(!db.delete_region("old").await.unwrap());
    }
}
