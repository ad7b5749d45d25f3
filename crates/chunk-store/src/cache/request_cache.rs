//! Request-coalescing cache of shared in-flight fetches.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;

use crate::error::Result;

type SharedFetch<T> = Shared<BoxFuture<'static, Result<Arc<T>>>>;

struct Entry<T> {
    id: u64,
    fetch: SharedFetch<T>,
}

/// How a lookup was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// A completed entry was reused.
    Hit,
    /// Joined a fetch another caller started.
    Joined,
    /// Started a new fetch.
    Started,
}

/// Outcome of [`RequestCache::get_or_fetch`].
pub struct Fetched<T> {
    pub result: Result<Arc<T>>,
    pub lookup: Lookup,
    /// The entry was removed because its fetch failed.
    pub purged: bool,
}

type Entries<T> = Arc<Mutex<HashMap<String, Entry<T>>>>;

/// Map of key -> shared fetch.
///
/// Identical keys requested while a fetch is in flight share that fetch. A failed
/// fetch removes its own entry so the next caller starts over. Entries inserted with
/// `retain = false` are dropped as soon as they complete, so only concurrent callers
/// share them.
///
/// Every fetch is driven to completion on the runtime, and the removal is part of
/// the fetch itself, so dropping all waiters never leaves an entry behind.
pub struct RequestCache<T> {
    entries: Entries<T>,
    next_id: AtomicU64,
}

impl<T> Default for RequestCache<T> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<T: Send + Sync + 'static> RequestCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_fetch<F, Fut>(&self, key: &str, retain: bool, fetch: F) -> Fetched<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (shared, lookup) = {
            let mut entries = self.entries.lock().await;
            match entries.get(key) {
                Some(entry) => {
                    let lookup = if entry.fetch.peek().is_some() {
                        Lookup::Hit
                    } else {
                        Lookup::Joined
                    };
                    (entry.fetch.clone(), lookup)
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let shared = settle(self.entries.clone(), key.to_string(), id, retain, fetch())
                        .boxed()
                        .shared();
                    entries.insert(
                        key.to_string(),
                        Entry {
                            id,
                            fetch: shared.clone(),
                        },
                    );
                    tokio::spawn(shared.clone());
                    (shared, Lookup::Started)
                }
            }
        };

        let result = shared.await;
        let purged = result.is_err();
        Fetched {
            result,
            lookup,
            purged,
        }
    }

    /// Drop every entry. In-flight fetches keep running for their current waiters.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.lock().await.contains_key(key)
    }
}

/// Run `fetch`, then remove entry `id` under `key` if it failed or is not retained.
async fn settle<T, Fut>(
    entries: Entries<T>,
    key: String,
    id: u64,
    retain: bool,
    fetch: Fut,
) -> Result<Arc<T>>
where
    Fut: Future<Output = Result<T>>,
{
    let result = fetch.await.map(Arc::new);
    if result.is_err() || !retain {
        let mut entries = entries.lock().await;
        if entries.get(&key).map(|e| e.id == id).unwrap_or(false) {
            entries.remove(&key);
        }
    }
    result
}
