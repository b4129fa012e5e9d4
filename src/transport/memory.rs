//! In-process transport for tests and offline use.

use super::Transport;
use crate::classify::Classification;
use crate::error::TransportError;
use crate::types::{ListPage, ObjectMeta, ObjectSummary, StoredObject};
use async_trait::async_trait;
use bytes::Bytes;
use md5::{Digest, Md5};
use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

/// Default number of entries per listing page (S3's own maximum).
const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
struct Entry {
    object: StoredObject,
    last_modified: SystemTime,
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, BTreeMap<String, Entry>>,
    failing: HashSet<(String, String)>,
}

/// Keeps objects in memory, keyed by bucket and key.
///
/// Mirrors the behavior the client relies on: ETags are the hex MD5 of the
/// body, listings come back in key order and are paginated, and any key can
/// be made to fail every request with [`MemoryTransport::fail_key`].
#[derive(Debug)]
pub struct MemoryTransport {
    state: Mutex<State>,
    page_size: usize,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Creates a store that returns at most `page_size` entries per listing page.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: page_size.max(1),
        }
    }

    /// Makes every subsequent request for `bucket/key` fail.
    pub fn fail_key(&self, bucket: &str, key: &str) {
        self.lock()
            .failing
            .insert((bucket.to_string(), key.to_string()));
    }

    /// Number of objects currently stored in `bucket`.
    pub fn len(&self, bucket: &str) -> usize {
        self.lock().buckets.get(bucket).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, bucket: &str) -> bool {
        self.len(bucket) == 0
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(
        state: &State,
        operation: &'static str,
        bucket: &str,
        key: &str,
    ) -> Result<(), TransportError> {
        if state
            .failing
            .contains(&(bucket.to_string(), key.to_string()))
        {
            return Err(TransportError::new(
                operation,
                bucket,
                key,
                "injected failure",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn get(&self, bucket: &str, key: &str) -> Classification<StoredObject> {
        let state = self.lock();
        if let Err(err) = Self::check(&state, "GetObject", bucket, key) {
            return Classification::Error(err);
        }
        match state.buckets.get(bucket).and_then(|objects| objects.get(key)) {
            Some(entry) => Classification::Found(entry.object.clone()),
            None => Classification::NotFound,
        }
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), TransportError> {
        let mut state = self.lock();
        Self::check(&state, "PutObject", bucket, key)?;

        let e_tag = format!("{:x}", Md5::digest(&body));
        let entry = Entry {
            object: StoredObject {
                body,
                content_type: content_type.map(str::to_owned),
                e_tag: Some(e_tag),
                ..StoredObject::default()
            },
            last_modified: SystemTime::now(),
        };
        state
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Classification<()> {
        let mut state = self.lock();
        if let Err(err) = Self::check(&state, "DeleteObject", bucket, key) {
            return Classification::Error(err);
        }
        let removed = state
            .buckets
            .get_mut(bucket)
            .and_then(|objects| objects.remove(key));
        match removed {
            Some(_) => Classification::Found(()),
            None => Classification::NotFound,
        }
    }

    async fn head(&self, bucket: &str, key: &str) -> Classification<ObjectMeta> {
        let state = self.lock();
        if let Err(err) = Self::check(&state, "HeadObject", bucket, key) {
            return Classification::Error(err);
        }
        match state.buckets.get(bucket).and_then(|objects| objects.get(key)) {
            Some(entry) => Classification::Found(ObjectMeta {
                size: entry.object.body.len() as u64,
                content_type: entry.object.content_type.clone(),
                e_tag: entry.object.e_tag.clone(),
            }),
            None => Classification::NotFound,
        }
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage, TransportError> {
        let state = self.lock();
        let Some(objects) = state.buckets.get(bucket) else {
            return Ok(ListPage::default());
        };

        // The continuation token is the last key of the previous page.
        let lower = match &continuation {
            Some(token) => Bound::Excluded(token.as_str()),
            None => Bound::Included(prefix),
        };

        let mut matching = objects
            .range::<str, _>((lower, Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix));

        let entries: Vec<ObjectSummary> = matching
            .by_ref()
            .take(self.page_size)
            .map(|(key, entry)| ObjectSummary {
                key: key.clone(),
                size: entry.object.body.len() as u64,
                e_tag: entry.object.e_tag.clone(),
                last_modified: Some(entry.last_modified),
            })
            .collect();

        let next = match (matching.next(), entries.last()) {
            (Some(_), Some(last)) => Some(last.key.clone()),
            _ => None,
        };

        Ok(ListPage { entries, next })
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, TransportError> {
        Self::check(&self.lock(), "PresignGetObject", bucket, key)?;
        Ok(format!(
            "memory://{}/{}?expires={}",
            bucket,
            key,
            expires_in.as_secs()
        ))
    }
}
