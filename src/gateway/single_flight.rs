//! Per-key request collapsing.
//!
//! N concurrent misses on the same key serialize behind one async mutex;
//! the first holder runs the producer and populates the cache, the rest
//! re-check the cache after acquiring and find the fresh entry. Lock
//! objects are created on first use per key and live for the process
//! lifetime, matching the rest of the gateway's per-key state.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;

pub(crate) struct SingleFlight {
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl SingleFlight {
    pub(crate) fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// The lock serializing fetches for `key`.
    pub(crate) fn lease(&self, key: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().get(key) {
            return lock.clone();
        }
        self.locks
            .write()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_yields_same_lock() {
        let flights = SingleFlight::new();
        let a = flights.lease("trends:garden");
        let b = flights.lease("trends:garden");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn different_keys_are_independent() {
        let flights = SingleFlight::new();
        let a = flights.lease("trends:garden");
        let b = flights.lease("trends:cooking");
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
