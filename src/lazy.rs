//! LazyValue: eager values and memoized deferred producers.
//!
//! A deferred entry keeps its producer behind an interior-mutable cell
//! so forcing a value needs only `&self`. The cell moves one-way from
//! `Pending` to `Resolved` on the first successful invocation; an `Err`
//! puts the producer back so a later access retries it.

use core::cell::RefCell;
use serde_json::Value;
use std::error::Error;
use thiserror::Error;

/// Error type producers may return. Single-threaded store, so no
/// `Send`/`Sync` bound is imposed.
pub type BoxError = Box<dyn Error + 'static>;

/// A zero-argument producer supplied in place of a value. `FnMut`
/// because a failing producer is re-invoked on the next access.
pub type Producer = Box<dyn FnMut() -> Result<Value, BoxError> + 'static>;

/// A deferred producer failed. The producer's own error is carried
/// unchanged as the source and can be downcast by the caller.
#[derive(Debug, Error)]
#[error("deferred producer for key `{key}` failed")]
pub struct ResolveError {
    key: String,
    #[source]
    source: BoxError,
}

impl ResolveError {
    /// Key whose producer failed.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Consume the error, returning the producer's original error.
    pub fn into_source(self) -> BoxError {
        self.source
    }
}

enum DeferredCell {
    Pending(Producer),
    // In-flight marker: set while the producer runs so a producer that
    // forces its own key is caught instead of looping.
    Running,
    Resolved(Value),
}

pub(crate) enum LazyValue {
    Eager(Value),
    Deferred(RefCell<DeferredCell>),
}

impl LazyValue {
    pub(crate) fn eager(value: Value) -> Self {
        LazyValue::Eager(value)
    }

    pub(crate) fn deferred(producer: Producer) -> Self {
        LazyValue::Deferred(RefCell::new(DeferredCell::Pending(producer)))
    }

    /// Memoized read. Eager and already-resolved entries return a clone
    /// of the stored value. A pending entry runs its producer with no
    /// cell borrow held, so the producer may force *other* entries of
    /// the owning store; forcing its own entry panics.
    pub(crate) fn resolve(&self, key: &str) -> Result<Value, ResolveError> {
        let cell = match self {
            LazyValue::Eager(v) => return Ok(v.clone()),
            LazyValue::Deferred(cell) => cell,
        };
        let mut producer = match cell.replace(DeferredCell::Running) {
            DeferredCell::Resolved(v) => {
                let out = v.clone();
                cell.replace(DeferredCell::Resolved(v));
                return Ok(out);
            }
            DeferredCell::Running => {
                panic!("re-entrant resolution of deferred key `{key}`: its producer forces its own key");
            }
            DeferredCell::Pending(p) => p,
        };
        match producer() {
            Ok(v) => {
                cell.replace(DeferredCell::Resolved(v.clone()));
                Ok(v)
            }
            Err(source) => {
                // Failed resolution stays pending; the next access retries.
                cell.replace(DeferredCell::Pending(producer));
                Err(ResolveError {
                    key: key.to_string(),
                    source,
                })
            }
        }
    }

    /// Resolution state, without forcing anything. Used by `Debug`.
    pub(crate) fn status(&self) -> &'static str {
        match self {
            LazyValue::Eager(_) => "eager",
            LazyValue::Deferred(cell) => match &*cell.borrow() {
                DeferredCell::Pending(_) => "pending",
                DeferredCell::Running => "resolving",
                DeferredCell::Resolved(_) => "resolved",
            },
        }
    }
}
