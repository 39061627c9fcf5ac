//! SharedData: the public store over the ordered structural layer.

use crate::lazy::{BoxError, LazyValue, Producer, ResolveError};
use crate::ordered_map::OrderedMap;
use core::fmt;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Discriminated eager-or-deferred payload, for bulk operations where a
/// single collection mixes fixed values and producers.
pub enum Shared {
    /// A value fixed at share-time.
    Value(Value),
    /// A zero-argument producer, invoked at most once on success.
    Deferred(Producer),
}

impl Shared {
    pub fn value(value: impl Into<Value>) -> Self {
        Shared::Value(value.into())
    }

    /// Deferred payload from an infallible producer.
    pub fn lazy(mut producer: impl FnMut() -> Value + 'static) -> Self {
        Shared::Deferred(Box::new(move || Ok(producer())))
    }

    /// Deferred payload from a fallible producer.
    pub fn fallible(producer: impl FnMut() -> Result<Value, BoxError> + 'static) -> Self {
        Shared::Deferred(Box::new(producer))
    }

    fn into_lazy(self) -> LazyValue {
        match self {
            Shared::Value(v) => LazyValue::eager(v),
            Shared::Deferred(p) => LazyValue::deferred(p),
        }
    }
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shared::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Shared::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Process-scoped key/value store for passing server state to a client
/// runtime. Keys are flat strings; values are eager `serde_json::Value`s
/// or deferred producers memoized on first successful access.
///
/// Re-sharing a key overwrites its entry (last-write-wins) while keeping
/// the key's first-seen position in iteration and JSON output.
pub struct SharedData {
    entries: OrderedMap<String, LazyValue>,
}

impl SharedData {
    pub fn new() -> Self {
        Self {
            entries: OrderedMap::new(),
        }
    }

    /// Share an eager value under `key`, overwriting any previous entry.
    pub fn share(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.insert(key.into(), LazyValue::eager(value.into()));
        self
    }

    /// Share a deferred producer under `key`. The producer does not run
    /// until the value is first requested, and runs at most once on
    /// success over the store's lifetime.
    pub fn share_with(
        &mut self,
        key: impl Into<String>,
        mut producer: impl FnMut() -> Value + 'static,
    ) -> &mut Self {
        self.share_fallible_with(key, move || Ok(producer()))
    }

    /// Like [`share_with`](Self::share_with), for producers that can
    /// fail. An `Err` leaves the entry unresolved so a later access
    /// re-invokes the producer.
    pub fn share_fallible_with(
        &mut self,
        key: impl Into<String>,
        producer: impl FnMut() -> Result<Value, BoxError> + 'static,
    ) -> &mut Self {
        self.entries
            .insert(key.into(), LazyValue::deferred(Box::new(producer)));
        self
    }

    /// Bulk share: applies the single-key overwrite rule to every entry
    /// in order. Later keys win on conflict; first-seen keys keep their
    /// position.
    pub fn merge<K>(&mut self, entries: impl IntoIterator<Item = (K, Shared)>) -> &mut Self
    where
        K: Into<String>,
    {
        for (key, shared) in entries {
            self.entries.insert(key.into(), shared.into_lazy());
        }
        self
    }

    /// Value for `key`, forcing resolution of a still-deferred entry.
    /// Returns `Ok(None)` when the key is absent.
    pub fn get(&self, key: &str) -> Result<Option<Value>, ResolveError> {
        match self.entries.get(key) {
            Some(entry) => entry.resolve(key).map(Some),
            None => Ok(None),
        }
    }

    /// Like [`get`](Self::get), returning `default` when the key is
    /// absent.
    pub fn get_or(&self, key: &str, default: Value) -> Result<Value, ResolveError> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Whether an entry exists for `key`. Never forces resolution.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove the entry for `key`; no-op when absent.
    pub fn forget(&mut self, key: &str) -> &mut Self {
        self.entries.remove(key);
        self
    }

    /// Remove all entries.
    pub fn flush(&mut self) -> &mut Self {
        self.entries.clear();
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn is_not_empty(&self) -> bool {
        !self.is_empty()
    }

    /// Keys in first-insertion order. Never forces resolution.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Snapshot of every key's resolved value, in first-insertion order.
    /// Forces resolution of every still-deferred entry; each producer
    /// still runs at most once in total across repeated `all` calls.
    pub fn all(&self) -> Result<Map<String, Value>, ResolveError> {
        let mut out = Map::with_capacity(self.len());
        for (key, entry) in self.entries.iter() {
            out.insert(key.clone(), entry.resolve(key)?);
        }
        Ok(out)
    }

    /// The store's object-like representation: a `Value::Object` equal
    /// to [`all`](Self::all).
    pub fn to_value(&self) -> Result<Value, ResolveError> {
        Ok(Value::Object(self.all()?))
    }

    /// Compact JSON object with keys in first-insertion order; the JSON
    /// root is the mapping itself, with no wrapping envelope.
    pub fn to_json(&self) -> Result<String, ResolveError> {
        let map = self.all()?;
        // Resolved values are already JSON trees; encoding cannot fail.
        Ok(serde_json::to_string(&map).expect("encoding a resolved value map"))
    }
}

impl Default for SharedData {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes as the same flat object `to_json` produces, so the store
/// can be handed directly to a generic encoder. Producer failures
/// surface as the encoder's custom error.
impl Serialize for SharedData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, entry) in self.entries.iter() {
            let value = entry.resolve(key).map_err(serde::ser::Error::custom)?;
            map.serialize_entry(key, &value)?;
        }
        map.end()
    }
}

/// Shows each key's resolution state without forcing anything.
impl fmt::Debug for SharedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedData ")?;
        f.debug_map()
            .entries(self.entries.iter().map(|(k, e)| (k, e.status())))
            .finish()
    }
}

impl FromIterator<(String, Shared)> for SharedData {
    fn from_iter<I: IntoIterator<Item = (String, Shared)>>(iter: I) -> Self {
        let mut store = SharedData::new();
        store.merge(iter);
        store
    }
}
