use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Cache key: (symbol, first day, last day), symbol uppercased.
pub type HistoryKey = (String, NaiveDate, NaiveDate);

/// Short-lived cache of provider responses keyed by symbol and date range.
///
/// Closes and dividends for one ticker come from the same history request;
/// keeping the response for a few seconds lets the second lookup reuse it
/// instead of hitting the network again. Entries older than the TTL are never
/// returned and are dropped on the next insert.
pub struct ResponseCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<HistoryKey, (Instant, Arc<V>)>>,
}

impl<V> ResponseCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn key(symbol: &str, from: NaiveDate, to: NaiveDate) -> HistoryKey {
        (symbol.to_uppercase(), from, to)
    }

    /// The cached response for `key`, if it is younger than the TTL.
    pub fn get(&self, key: &HistoryKey) -> Option<Arc<V>> {
        let entries = self.lock();
        entries
            .get(key)
            .filter(|(stored, _)| stored.elapsed() < self.ttl)
            .map(|(_, value)| Arc::clone(value))
    }

    /// Store `value` under `key` and hand it back shared.
    pub fn insert(&self, key: HistoryKey, value: V) -> Arc<V> {
        let value = Arc::new(value);
        let mut entries = self.lock();
        entries.retain(|_, (stored, _)| stored.elapsed() < self.ttl);
        entries.insert(key, (Instant::now(), Arc::clone(&value)));
        value
    }

    /// Number of stored entries, stale ones included until the next insert.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock leaves the map itself intact.
    fn lock(&self) -> MutexGuard<'_, HashMap<HistoryKey, (Instant, Arc<V>)>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
