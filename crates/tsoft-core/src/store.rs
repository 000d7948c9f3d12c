// ── Record storage ──
//
// Services keep their records behind `Store` so the backing can be swapped
// without touching business rules. `MemoryStore` is the process-lifetime
// implementation: a `DashMap` with per-shard locking.

use std::hash::Hash;

use dashmap::DashMap;

/// A record that can be retired without being removed.
pub trait Record: Clone + Send + Sync {
    fn is_active(&self) -> bool;
    fn deactivate(&mut self);
}

/// Keyed record storage.
pub trait Store<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;

    /// Every record, ordered by key.
    fn list(&self) -> Vec<V>;

    /// Insert or replace. Returns `true` if the key was new.
    fn upsert(&self, key: K, value: V) -> bool;

    /// Mutate a record in place and return the updated copy.
    fn modify(&self, key: &K, apply: &mut dyn FnMut(&mut V)) -> Option<V>;

    /// Mark a record inactive. Returns `false` if the key is unknown.
    fn soft_delete(&self, key: &K) -> bool
    where
        V: Record,
    {
        self.modify(key, &mut |record: &mut V| record.deactivate()).is_some()
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory [`Store`] backed by `DashMap`.
#[derive(Debug)]
pub struct MemoryStore<K: Eq + Hash, V> {
    records: DashMap<K, V>,
}

impl<K: Eq + Hash, V> MemoryStore<K, V> {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> Default for MemoryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Store<K, V> for MemoryStore<K, V>
where
    K: Eq + Hash + Ord + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        self.records.get(key).map(|r| r.value().clone())
    }

    fn list(&self) -> Vec<V> {
        let mut entries: Vec<(K, V)> = self
            .records
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, v)| v).collect()
    }

    fn upsert(&self, key: K, value: V) -> bool {
        self.records.insert(key, value).is_none()
    }

    fn modify(&self, key: &K, apply: &mut dyn FnMut(&mut V)) -> Option<V> {
        let mut entry = self.records.get_mut(key)?;
        apply(entry.value_mut());
        Some(entry.value().clone())
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        name: &'static str,
        active: bool,
    }

    impl Record for Item {
        fn is_active(&self) -> bool {
            self.active
        }

        fn deactivate(&mut self) {
            self.active = false;
        }
    }

    #[test]
    fn list_is_ordered_by_key() {
        let store = MemoryStore::new();
        for (key, name) in [(3, "c"), (1, "a"), (2, "b")] {
            assert!(store.upsert(key, Item { name, active: true }));
        }
        let names: Vec<_> = store.list().into_iter().map(|i| i.name).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn soft_delete_keeps_the_record() {
        let store = MemoryStore::new();
        store.upsert(1_u64, Item { name: "a", active: true });

        assert!(store.soft_delete(&1));
        assert!(!store.soft_delete(&2));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&1).map(|i| i.is_active()), Some(false));
    }
}
