use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::RwLock;

use crate::clock::{Clock, LogicalTime};

/// The external storage collaborator the core consumes. Not durable, not
/// versioned — a single current value per key plus the logical time it was
/// last written at.
pub trait Storage<K, V>: Send + Sync {
    fn read(&self, key: &K) -> Option<V>;
    fn write(&self, key: K, value: V);
    fn timestamp(&self, key: &K) -> LogicalTime;
}

/// Reference `Storage` implementation backing tests, benches, and the demo
/// binary. Every write stamps the key with a fresh tick of a shared clock,
/// so timestamps are strictly increasing rather than merely monotone — this
/// keeps OCC validation deterministic under concurrent writers.
pub struct InMemoryStorage<K, V> {
    table: RwLock<HashMap<K, (V, LogicalTime)>>,
    clock: Clock,
}

impl<K, V> InMemoryStorage<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(clock: Clock) -> Self {
        Self {
            table: RwLock::new(HashMap::new()),
            clock,
        }
    }
}

impl<K, V> Storage<K, V> for InMemoryStorage<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn read(&self, key: &K) -> Option<V> {
        self.table.read().get(key).map(|(v, _)| v.clone())
    }

    fn write(&self, key: K, value: V) {
        let ts = self.clock.tick();
        self.table.write().insert(key, (value, ts));
    }

    fn timestamp(&self, key: &K) -> LogicalTime {
        self.table
            .read()
            .get(key)
            .map(|(_, ts)| *ts)
            .unwrap_or(LogicalTime::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_has_zero_timestamp() {
        let store: InMemoryStorage<&str, i32> = InMemoryStorage::new(Clock::new());
        assert_eq!(store.timestamp(&"missing"), LogicalTime::ZERO);
        assert_eq!(store.read(&"missing"), None);
    }

    #[test]
    fn write_advances_timestamp() {
        let store: InMemoryStorage<&str, i32> = InMemoryStorage::new(Clock::new());
        store.write("a", 1);
        let t1 = store.timestamp(&"a");
        store.write("a", 2);
        let t2 = store.timestamp(&"a");
        assert!(t2 > t1);
        assert_eq!(store.read(&"a"), Some(2));
    }
}
