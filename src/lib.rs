//! shared-data: a single-threaded, insertion-ordered key/value store
//! with lazily produced, memoized values, serializable as a flat JSON
//! object for consumption by a client-side runtime.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: build SharedData in safe, verifiable layers so each piece can
//!   be reasoned about independently.
//! - Layers:
//!   - OrderedMap<K, V, S>: structural map combining a hash index for
//!     O(1) average lookup with a side order vector for deterministic,
//!     first-insertion-order iteration; replacing a key keeps its
//!     original position.
//!   - LazyValue: per-entry representation, either an eager value fixed
//!     at share-time or a deferred producer behind an interior-mutable
//!     cell that memoizes the first successful result.
//!   - SharedData: public API over OrderedMap<String, LazyValue> with
//!     share/get/forget/flush/merge and JSON serialization.
//!
//! Constraints
//! - Single-threaded: producers are plain (non-Send) boxed closures and
//!   memoization uses `RefCell`, so the store is `!Send`/`!Sync`.
//! - Lazy: a deferred producer must not run until its value is first
//!   requested; `contains_key` never forces resolution.
//! - At-most-once on success: a producer that returns `Ok` never runs
//!   again for its entry. A producer that returns `Err` is put back and
//!   re-invoked on the next access.
//! - Deterministic output: iteration and JSON key order is the order in
//!   which keys were first shared; overwriting a key keeps its position,
//!   `forget` followed by a fresh `share` appends at the end.
//!
//! Why this split?
//! - Localize invariants: ordering lives entirely in OrderedMap,
//!   memoization entirely in LazyValue; SharedData composes the two
//!   without duplicating either concern.
//! - Read paths need only `&self`: forcing a value mutates nothing but
//!   the entry's own cell, so `get`/`all`/serde serialization work on a
//!   shared reference while structural mutation requires `&mut self`.
//! - Clear failure boundaries: OrderedMap never runs user code beyond
//!   `K: Eq/Hash`; producers run only inside `LazyValue::resolve` with
//!   no cell borrow held, so a producer may read *other* keys of the
//!   same store. A producer that forces its own key is detected via the
//!   in-flight cell state and panics with the key named.
//!
//! Notes and non-goals
//! - Not thread-safe; callers wanting concurrency keep one store per
//!   request/task and serialize access externally.
//! - Flat keys only: no dot-path traversal into nested values.
//! - Reads return owned `Value` clones, never references into internal
//!   storage.
//! - No persistence, no wire envelope: the JSON root is the mapping.

mod lazy;
pub mod ordered_map;
mod store;

// Public surface
pub use lazy::{BoxError, Producer, ResolveError};
pub use store::{Shared, SharedData};
