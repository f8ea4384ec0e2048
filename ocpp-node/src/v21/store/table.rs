use core::hash::Hash;

use dashmap::{
    mapref::{entry::Entry, one::RefMut},
    DashMap,
};

/// A keyed table whose operations are atomic per key. Guards returned by
/// `get_mut` must never be held across an `.await`.
pub struct Table<K: Eq + Hash, V> {
    map: DashMap<K, V>,
}

impl<K: Eq + Hash, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            map: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone + Ord, V: Clone> Table<K, V> {
    /// Inserts only if the key is free.
    pub fn try_add(&self, key: K, value: V) -> bool {
        match self.map.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(value);
                true
            }
        }
    }

    pub fn try_remove(&self, key: &K) -> Option<V> {
        self.map.remove(key).map(|(_, value)| value)
    }

    pub fn try_get(&self, key: &K) -> Option<V> {
        self.map.get(key).map(|value| value.clone())
    }

    pub fn update<R>(&self, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        self.map.get_mut(key).map(|mut value| f(value.value_mut()))
    }

    pub fn upsert(&self, key: K, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub(crate) fn get_mut(&self, key: &K) -> Option<RefMut<'_, K, V>> {
        self.map.get_mut(key)
    }

    pub(crate) fn find_key(&self, pred: impl Fn(&K, &V) -> bool) -> Option<K> {
        self.map
            .iter()
            .filter(|entry| pred(entry.key(), entry.value()))
            .map(|entry| entry.key().clone())
            .min()
    }

    pub(crate) fn keys_where(&self, pred: impl Fn(&K, &V) -> bool) -> Vec<K> {
        let mut keys: Vec<K> = self
            .map
            .iter()
            .filter(|entry| pred(entry.key(), entry.value()))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    /// Consistent per key, not across keys.
    pub fn snapshot(&self) -> Vec<(K, V)> {
        let mut rows: Vec<(K, V)> = self
            .map
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }

    pub fn values(&self) -> Vec<V> {
        self.snapshot().into_iter().map(|(_, value)| value).collect()
    }
}
