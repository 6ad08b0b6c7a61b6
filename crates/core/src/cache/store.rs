//! Storage seam used by the strategies and the lifecycle manager.

use async_trait::async_trait;

use super::connection::CacheDb;
use crate::Error;
use crate::http::{Request, Response};

/// Region-partitioned response store.
///
/// Implementations must tolerate concurrent puts to the same region; the last
/// writer wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a request in one region, or in every region when `region` is `None`.
    async fn match_request(&self, region: Option<&str>, request: &Request) -> Result<Option<Response>, Error>;

    /// Store a response if it is 2xx. Returns whether it was stored.
    async fn put(&self, region: &str, request: &Request, response: &Response) -> Result<bool, Error>;

    /// Store a batch atomically.
    async fn put_all(&self, region: &str, entries: &[(Request, Response)]) -> Result<usize, Error>;

    async fn list_regions(&self) -> Result<Vec<String>, Error>;

    /// Delete every region not named in `keep`, returning the deleted names.
    async fn delete_regions_not_in(&self, keep: &[String]) -> Result<Vec<String>, Error>;
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn match_request(&self, region: Option<&str>, request: &Request) -> Result<Option<Response>, Error> {
        CacheDb::match_request(self, region, request).await
    }

    async fn put(&self, region: &str, request: &Request, response: &Response) -> Result<bool, Error> {
        CacheDb::put(self, region, request, response).await
    }

    async fn put_all(&self, region: &str, entries: &[(Request, Response)]) -> Result<usize, Error> {
        CacheDb::put_all(self, region, entries).await
    }

    async fn list_regions(&self) -> Result<Vec<String>, Error> {
        CacheDb::list_regions(self).await
    }

    async fn delete_regions_not_in(&self, keep: &[String]) -> Result<Vec<String>, Error> {
        CacheDb::delete_regions_not_in(self, keep).await
    }
}
