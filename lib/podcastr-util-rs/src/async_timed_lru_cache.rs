use lru::LruCache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

/// An async LRU whose entries are valid for only a certian time period.
///
/// Concurrent lookups of a missing or expired key share one call to the value function.
pub struct AsyncTimedLruCache<K, V> {
    cache: std::sync::Mutex<LruCache<K, Arc<tokio::sync::OnceCell<Entry<V>>>>>,
    valid_for: Duration,
}

impl<K, V> AsyncTimedLruCache<K, V>
where
    K: Eq + std::hash::Hash,
    V: Clone,
{
    /// Make a new [`AsyncTimedLruCache`].
    ///
    /// # Panics
    ///
    /// Panics if the capacity is 0.
    /// To simulate a 0-sized cache, instead use 0 for `valid_for` and a `capacity` of 1.
    pub fn new(capacity: usize, valid_for: Duration) -> Self {
        let capacity = capacity.try_into().expect("capacity is 0");
        let cache = std::sync::Mutex::new(LruCache::new(capacity));
        Self { cache, valid_for }
    }

    /// Get the value for `key`, calling `func` to calculate it if it is missing or expired.
    pub async fn get<FN, FUT>(&self, key: K, func: FN) -> V
    where
        FN: FnOnce() -> FUT,
        FUT: Future<Output = V>,
    {
        self.entry(key)
            .get_or_init(|| async move {
                let value = func().await;
                let created = Instant::now();

                Entry { created, value }
            })
            .await
            .value
            .clone()
    }

    /// Get the value for `key`, calling a fallible `func` to calculate it if it is missing or expired.
    ///
    /// Errors are handed to the caller that ran `func` and are never stored.
    pub async fn try_get<FN, FUT, E>(&self, key: K, func: FN) -> Result<V, E>
    where
        FN: FnOnce() -> FUT,
        FUT: Future<Output = Result<V, E>>,
    {
        let cell = self.entry(key);
        let entry = cell
            .get_or_try_init(|| async move {
                let value = func().await?;
                let created = Instant::now();

                Ok(Entry { created, value })
            })
            .await?;

        Ok(entry.value.clone())
    }

    /// Get the cell for a key.
    ///
    /// Expired cells are swapped for empty ones.
    /// Cells that are still being initialized are shared.
    fn entry(&self, key: K) -> Arc<tokio::sync::OnceCell<Entry<V>>> {
        let mut cache = self.cache.lock().unwrap();

        if let Some(entry) = cache.get_mut(&key) {
            let expired = entry
                .get()
                .map_or(false, |entry| entry.created.elapsed() > self.valid_for);
            if expired {
                std::mem::take(entry);
            }

            return entry.clone();
        }

        let entry = Arc::new(tokio::sync::OnceCell::new());
        cache.put(key, entry.clone());
        entry
    }
}

impl<K, V> std::fmt::Debug for AsyncTimedLruCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncTimedLruCache")
            .field("valid_for", &self.valid_for)
            .finish()
    }
}

#[derive(Debug)]
struct Entry<V> {
    created: Instant,
    value: V,
}
