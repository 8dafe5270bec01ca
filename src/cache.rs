use lru_cache::LruCache;

use crate::statement::PrepareResult;

/// Per-connection cache of prepared statements, keyed by SQL text.
///
/// When full, the least recently used statement is dropped; dropped
/// descriptors are handed back to the caller so the server-side statement
/// can be closed. Inserting under an SQL text that is already resident
/// keeps the resident statement and hands back the incoming duplicate.
#[derive(Debug)]
pub(crate) struct PrepareCache {
    inner: LruCache<String, PrepareResult>,
}

impl PrepareCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            inner: LruCache::new(capacity),
        }
    }

    /// Look up a statement and take ownership of it for the duration of an
    /// execution; re-inserting afterwards makes it most recently used.
    pub(crate) fn take(&mut self, sql: &str) -> Option<PrepareResult> {
        self.inner.remove(sql)
    }

    /// Insert a freshly prepared statement. Returns every descriptor that
    /// lost its place and must be closed server-side: the evicted LRU
    /// entry on overflow, or the incoming duplicate itself.
    pub(crate) fn put(&mut self, sql: &str, mut prepare: PrepareResult) -> Vec<PrepareResult> {
        let mut dropped = Vec::new();

        if self.inner.contains_key(sql) {
            // keep the resident statement; the duplicate goes back to be
            // closed
            prepare.cached = false;
            self.inner.get_mut(sql);
            dropped.push(prepare);

            return dropped;
        }

        if self.inner.len() == self.inner.capacity() {
            if let Some((_, mut evicted)) = self.inner.remove_lru() {
                evicted.cached = false;
                dropped.push(evicted);
            }
        }

        prepare.cached = true;
        self.inner.insert(sql.to_owned(), prepare);

        dropped
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::PrepareCache;
    use crate::statement::PrepareResult;

    fn prepare(id: u32) -> PrepareResult {
        PrepareResult::new(id, 0, Vec::new())
    }

    #[test]
    fn it_evicts_least_recently_used() {
        let mut cache = PrepareCache::new(2);

        assert!(cache.put("A", prepare(1)).is_empty());
        assert!(cache.put("B", prepare(2)).is_empty());

        // A B A C : A is promoted, B is the LRU at overflow
        let a = cache.take("A").unwrap();
        assert_eq!(a.statement_id(), 1);
        assert!(cache.put("A", a).is_empty());

        let dropped = cache.put("C", prepare(3));
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].statement_id(), 2);
        assert!(!dropped[0].cached);

        assert_eq!(cache.len(), 2);
        assert!(cache.take("A").is_some());
        assert!(cache.take("C").is_some());
        assert!(cache.take("B").is_none());
    }

    #[test]
    fn it_returns_the_incoming_duplicate() {
        let mut cache = PrepareCache::new(2);

        assert!(cache.put("A", prepare(1)).is_empty());
        let dropped = cache.put("A", prepare(9));

        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].statement_id(), 9);
        assert!(!dropped[0].cached);

        let resident = cache.take("A").unwrap();
        assert_eq!(resident.statement_id(), 1);
        assert!(resident.cached);
    }

    #[test]
    fn it_marks_resident_statements_cached() {
        let mut cache = PrepareCache::new(1);

        cache.put("A", prepare(1));

        let dropped = cache.put("B", prepare(2));
        assert_eq!(dropped[0].statement_id(), 1);
        assert!(!dropped[0].cached);

        assert!(cache.take("B").unwrap().cached);
    }
}
