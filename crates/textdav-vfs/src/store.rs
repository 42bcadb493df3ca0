//! The entry store: authoritative `path -> entry` table.
//!
//! # Concurrency Model
//!
//! - One `parking_lot::RwLock` around the whole table
//! - Multi-entry operations hold a single [`StoreWrite`] guard throughout, so
//!   readers never see a half-renamed or half-removed subtree
//! - Lock order is always table, then entry node

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashMap;

use crate::entry::EntryRef;
use crate::path;

/// Shared read access to the table.
pub type StoreRead<'a> = RwLockReadGuard<'a, Table>;

/// Exclusive access to the table.
pub type StoreWrite<'a> = RwLockWriteGuard<'a, Table>;

/// The path-keyed table behind the lock.
///
/// Keys are normalized paths and always equal the `path` of the entry they
/// map to. No method here validates hierarchy invariants; that is the
/// caller's job.
#[derive(Debug, Default)]
pub struct Table {
    entries: HashMap<String, EntryRef>,
}

impl Table {
    pub fn get(&self, path: &str) -> Option<&EntryRef> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Insert or replace.
    pub fn put(&mut self, path: impl Into<String>, entry: EntryRef) -> Option<EntryRef> {
        self.entries.insert(path.into(), entry)
    }

    /// Remove exactly one path. Does not cascade.
    pub fn remove(&mut self, path: &str) -> Option<EntryRef> {
        self.entries.remove(path)
    }

    /// Direct children of `path`, in no particular order.
    pub fn list_children(&self, path: &str) -> Vec<EntryRef> {
        self.entries
            .iter()
            .filter(|(key, _)| key.as_str() != path && path::parent(key) == Some(path))
            .map(|(_, entry)| EntryRef::clone(entry))
            .collect()
    }

    /// True if `path` or anything below it exists.
    pub fn exists_under_or_equal(&self, path: &str) -> bool {
        self.entries.contains_key(path) || self.has_descendants(path)
    }

    /// True if anything exists strictly below `path`.
    pub fn has_descendants(&self, path: &str) -> bool {
        self.entries.keys().any(|key| path::is_descendant(key, path))
    }

    /// Paths strictly below `path`.
    pub fn descendants(&self, path: &str) -> Vec<String> {
        self.entries
            .keys()
            .filter(|key| path::is_descendant(key, path))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.entries.keys().cloned().collect();
        paths.sort();
        paths
    }
}

/// Thread-safe entry store. All data is lost when dropped.
#[derive(Debug, Default)]
pub struct EntryStore {
    table: RwLock<Table>,
}

impl EntryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared access for a multi-step read.
    pub fn read(&self) -> StoreRead<'_> {
        self.table.read()
    }

    /// Exclusive access for a multi-step mutation.
    pub fn write(&self) -> StoreWrite<'_> {
        self.table.write()
    }

    pub fn get(&self, path: &str) -> Option<EntryRef> {
        self.read().get(path).cloned()
    }

    pub fn put(&self, path: impl Into<String>, entry: EntryRef) {
        self.write().put(path, entry);
    }

    pub fn remove(&self, path: &str) -> Option<EntryRef> {
        self.write().remove(path)
    }

    pub fn list_children(&self, path: &str) -> Vec<EntryRef> {
        self.read().list_children(path)
    }

    pub fn exists_under_or_equal(&self, path: &str) -> bool {
        self.read().exists_under_or_equal(path)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn paths(&self) -> Vec<String> {
        self.read().paths()
    }
}
