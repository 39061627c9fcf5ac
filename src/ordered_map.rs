//! OrderedMap: structural layer with hashed lookup and stable
//! first-insertion iteration order.
//!
//! A `hashbrown::HashTable` indexes generational `slotmap` keys for O(1)
//! average lookup; a side vector of slot keys records insertion order.
//! Each entry stores its precomputed hash so removal never re-invokes
//! `K: Hash`.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
}

/// Insertion-ordered hash map.
///
/// Invariants:
/// - `index`, `slots`, and `order` always hold exactly the same set of
///   slot keys.
/// - `order` lists slot keys in the order their keys were first
///   inserted; replacing a key's value does not move it.
pub struct OrderedMap<K, V, S = RandomState> {
    hasher: S,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Entry<K, V>>,
    order: Vec<DefaultKey>,
}

impl<K, V> OrderedMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V> Default for OrderedMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over entries in first-insertion order.
pub struct Iter<'a, K, V> {
    order: core::slice::Iter<'a, DefaultKey>,
    slots: &'a SlotMap<DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.order.next().map(|&k| {
            let e = &self.slots[k];
            (&e.key, &e.value)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}

impl<K, V, S> OrderedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::new(),
            slots: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Insert or replace. A new key is appended to the iteration order;
    /// an existing key keeps its original position and the replaced
    /// value is returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        match self.index.entry(
            hash,
            |&kk| self.slots.get(kk).map(|e| e.key == key).unwrap_or(false),
            |&kk| self.slots.get(kk).map(|e| e.hash).unwrap_or(0),
        ) {
            hashbrown::hash_table::Entry::Occupied(occ) => {
                let slot = *occ.get();
                let e = &mut self.slots[slot];
                Some(core::mem::replace(&mut e.value, value))
            }
            hashbrown::hash_table::Entry::Vacant(v) => {
                let slot = self.slots.insert(Entry { key, value, hash });
                let _ = v.insert(slot);
                self.order.push(slot);
                None
            }
        }
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let &slot = self.index.find(hash, |&kk| {
            self.slots
                .get(kk)
                .map(|e| e.key.borrow() == q)
                .unwrap_or(false)
        })?;
        self.slots.get(slot).map(|e| &e.value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).is_some()
    }

    /// Remove a key, splicing it out of the iteration order. Returns the
    /// removed value, or `None` when the key is absent.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let slot = match self.index.find_entry(hash, |&kk| {
            self.slots
                .get(kk)
                .map(|e| e.key.borrow() == q)
                .unwrap_or(false)
        }) {
            Ok(occ) => {
                let (slot, _) = occ.remove();
                slot
            }
            Err(_) => return None,
        };
        let entry = self.slots.remove(slot)?;
        let pos = self.order.iter().position(|&k| k == slot)?;
        self.order.remove(pos);
        Some(entry.value)
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.order.clear();
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            order: self.order.iter(),
            slots: &self.slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: replacing an existing key returns the old value, keeps
    /// the key's original iteration position, and does not grow the map.
    #[test]
    fn insert_replace_keeps_position() {
        let mut m: OrderedMap<String, i32> = OrderedMap::new();
        assert_eq!(m.insert("a".to_string(), 1), None);
        assert_eq!(m.insert("b".to_string(), 2), None);
        assert_eq!(m.insert("c".to_string(), 3), None);

        assert_eq!(m.insert("b".to_string(), 20), Some(2));
        assert_eq!(m.len(), 3);

        let keys: Vec<_> = m.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, ["a", "b", "c"]);
        assert_eq!(m.get("b"), Some(&20));
    }

    /// Invariant: removal splices the key out of the order; re-inserting
    /// the same key afterwards appends it at the end.
    #[test]
    fn remove_then_reinsert_appends_at_end() {
        let mut m: OrderedMap<String, i32> = OrderedMap::new();
        m.insert("a".to_string(), 1);
        m.insert("b".to_string(), 2);
        m.insert("c".to_string(), 3);

        assert_eq!(m.remove("b"), Some(2));
        assert!(!m.contains_key("b"));
        let keys: Vec<_> = m.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, ["a", "c"]);

        m.insert("b".to_string(), 4);
        let keys: Vec<_> = m.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, ["a", "c", "b"]);
    }

    /// Invariant: removing an absent key is a no-op returning `None`.
    #[test]
    fn remove_absent_is_noop() {
        let mut m: OrderedMap<String, i32> = OrderedMap::new();
        m.insert("a".to_string(), 1);
        assert_eq!(m.remove("missing"), None);
        assert_eq!(m.len(), 1);
    }

    /// Invariant: borrowed lookup works (store `String`, query `&str`).
    #[test]
    fn borrowed_lookup_with_str() {
        let mut m: OrderedMap<String, i32> = OrderedMap::new();
        m.insert("hello".to_string(), 1);
        assert!(m.contains_key("hello"));
        assert!(!m.contains_key("world"));
        assert_eq!(m.get("hello"), Some(&1));
        assert_eq!(m.get("world"), None);
    }

    /// Invariant: lookups and ordered iteration survive heavy hash
    /// collisions; equality resolves to the correct entry.
    #[test]
    fn collision_handling_with_const_hasher() {
        #[derive(Clone, Default)]
        struct ConstBuildHasher;
        struct ConstHasher;
        impl BuildHasher for ConstBuildHasher {
            type Hasher = ConstHasher;
            fn build_hasher(&self) -> Self::Hasher {
                ConstHasher
            }
        }
        impl core::hash::Hasher for ConstHasher {
            fn write(&mut self, _bytes: &[u8]) {}
            fn finish(&self) -> u64 {
                0
            } // force all keys into the same hash bucket
        }

        let mut m: OrderedMap<String, i32, ConstBuildHasher> =
            OrderedMap::with_hasher(ConstBuildHasher);
        m.insert("a".to_string(), 1);
        m.insert("b".to_string(), 2);
        m.insert("c".to_string(), 3);

        assert_eq!(m.get("a"), Some(&1));
        assert_eq!(m.get("b"), Some(&2));
        assert_eq!(m.remove("b"), Some(2));
        assert_eq!(m.get("c"), Some(&3));

        let keys: Vec<_> = m.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, ["a", "c"]);
    }

    /// Invariant: `clear` empties all three structures; the map is
    /// reusable afterwards and new inserts start a fresh order.
    #[test]
    fn clear_empties_and_map_is_reusable() {
        let mut m: OrderedMap<String, i32> = OrderedMap::new();
        m.insert("a".to_string(), 1);
        m.insert("b".to_string(), 2);
        m.clear();
        assert_eq!(m.len(), 0);
        assert!(m.is_empty());
        assert_eq!(m.iter().count(), 0);
        assert!(!m.contains_key("a"));

        m.insert("z".to_string(), 9);
        let keys: Vec<_> = m.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, ["z"]);
    }

    /// Invariant: `len`/`is_empty` track live entries across insert,
    /// replace, and remove.
    #[test]
    fn len_and_is_empty_behaviors() {
        let mut m: OrderedMap<String, i32> = OrderedMap::new();
        assert_eq!(m.len(), 0);
        assert!(m.is_empty());

        m.insert("a".to_string(), 1);
        assert_eq!(m.len(), 1);

        // Replacement must not change len
        m.insert("a".to_string(), 2);
        assert_eq!(m.len(), 1);

        m.insert("b".to_string(), 2);
        assert_eq!(m.len(), 2);

        m.remove("a");
        assert_eq!(m.len(), 1);
        m.remove("b");
        assert!(m.is_empty());
    }
}
