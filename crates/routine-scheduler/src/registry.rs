//! Concurrent key → control block map for live routines.

use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    control::ControlBlock,
    error::{Result, SchedulerError},
};

/// Registry of live routines.
///
/// A key is present from the moment its execution loop is launched until the
/// loop has fully exited. Cloning yields another handle to the same map.
pub struct Registry<C, O> {
    routines: Arc<DashMap<String, Arc<ControlBlock<C, O>>>>,
}

impl<C, O> Registry<C, O> {
    pub fn new() -> Self {
        Self {
            routines: Arc::new(DashMap::new()),
        }
    }

    /// Register `ctrl` under `key`. Fails with `DuplicateKey` instead of
    /// overwriting a live routine.
    pub fn insert(&self, key: String, ctrl: Arc<ControlBlock<C, O>>) -> Result<()> {
        match self.routines.entry(key) {
            Entry::Occupied(e) => Err(SchedulerError::DuplicateKey {
                key: e.key().clone(),
            }),
            Entry::Vacant(e) => {
                e.insert(ctrl);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, key: &str) -> Option<Arc<ControlBlock<C, O>>> {
        self.routines.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, key: &str) -> Option<Arc<ControlBlock<C, O>>> {
        self.routines.remove(key).map(|(_, ctrl)| ctrl)
    }

    /// Remove `key` only while it still maps to `ctrl`.
    pub(crate) fn release(&self, key: &str, ctrl: &Arc<ControlBlock<C, O>>) -> bool {
        self.routines
            .remove_if(key, |_, current| Arc::ptr_eq(current, ctrl))
            .is_some()
    }

    /// Point-in-time copy of every entry. No shard lock is held once this
    /// returns, so callers may touch the registry while walking the result.
    pub fn snapshot(&self) -> Vec<(String, Arc<ControlBlock<C, O>>)> {
        self.routines
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect()
    }

    /// Visit every live routine, in no particular order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&str, &Arc<ControlBlock<C, O>>),
    {
        for (key, ctrl) in self.snapshot() {
            f(&key, &ctrl);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.routines.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }
}

impl<C, O> Clone for Registry<C, O> {
    fn clone(&self) -> Self {
        Self {
            routines: Arc::clone(&self.routines),
        }
    }
}

impl<C, O> Default for Registry<C, O> {
    fn default() -> Self {
        Self::new()
    }
}
