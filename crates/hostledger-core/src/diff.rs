//! Key-wise comparison of a baseline against a fresh snapshot.
//!
//! Both helpers iterate ordered collections, so `added`, `removed` and
//! `changed` always come out sorted by key and event order within a poll is
//! deterministic.

use std::collections::{BTreeMap, BTreeSet};

/// A key present in both maps whose value differs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changed<K, V> {
    pub key: K,
    pub old: V,
    pub new: V,
}

/// Result of comparing two keyed snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDiff<K, V> {
    /// Keys only in the new snapshot.
    pub added: Vec<K>,
    /// Keys only in the baseline.
    pub removed: Vec<K>,
    pub changed: Vec<Changed<K, V>>,
}

impl<K, V> MapDiff<K, V> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Compare `baseline` to `current` key by key.
pub fn diff_maps<K, V>(baseline: &BTreeMap<K, V>, current: &BTreeMap<K, V>) -> MapDiff<K, V>
where
    K: Ord + Clone,
    V: PartialEq + Clone,
{
    let mut added = Vec::new();
    let mut changed = Vec::new();

    for (key, new) in current {
        match baseline.get(key) {
            None => added.push(key.clone()),
            Some(old) if old != new => changed.push(Changed {
                key: key.clone(),
                old: old.clone(),
                new: new.clone(),
            }),
            Some(_) => {}
        }
    }

    let removed = baseline
        .keys()
        .filter(|key| !current.contains_key(*key))
        .cloned()
        .collect();

    MapDiff { added, removed, changed }
}

/// Membership change between two sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetDiff<T> {
    pub added: Vec<T>,
    pub removed: Vec<T>,
}

impl<T> SetDiff<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

pub fn diff_sets<T: Ord + Clone>(baseline: &BTreeSet<T>, current: &BTreeSet<T>) -> SetDiff<T> {
    SetDiff {
        added: current.difference(baseline).cloned().collect(),
        removed: baseline.difference(current).cloned().collect(),
    }
}
