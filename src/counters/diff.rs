/// Flat-map diff engine
///
/// Compares two one-level mappings (counter-id → contribution weight) and
/// produces a change-set covering the union of their keys. This is the
/// only comparison the counter subsystem needs: facet contribution maps
/// are always flat, so there is deliberately no recursion into nested
/// structures here.

use std::collections::BTreeMap;

/// How one key changed between the "before" and "after" mappings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffStatus {
    /// Key present only in "after"
    Created,
    /// Key present in both with different values
    Updated,
    /// Key present only in "before"
    Deleted,
    /// Key present in both with equal values
    Unchanged,
}

/// One key's transition between two flat mappings.
/// Transient: produced here, consumed by the incremental updater,
/// never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffResult {
    pub key: String,
    pub status: DiffStatus,
    /// The value relevant to the transition: after's value for
    /// Created/Updated/Unchanged, before's value for Deleted.
    pub value: i64,
}

/// Diff two flat mappings. Either input may be empty — an empty map means
/// "no facets contributed" and needs no special-casing by the caller.
///
/// Results come back in key order (inputs are BTreeMaps), which keeps the
/// downstream write batches deterministic.
pub fn diff_maps(
    before: &BTreeMap<String, i64>,
    after: &BTreeMap<String, i64>,
) -> Vec<DiffResult> {
    let mut results = Vec::with_capacity(before.len() + after.len());

    for (key, &old_value) in before {
        match after.get(key) {
            None => results.push(DiffResult {
                key: key.clone(),
                status: DiffStatus::Deleted,
                value: old_value,
            }),
            Some(&new_value) if new_value == old_value => results.push(DiffResult {
                key: key.clone(),
                status: DiffStatus::Unchanged,
                value: new_value,
            }),
            Some(&new_value) => results.push(DiffResult {
                key: key.clone(),
                status: DiffStatus::Updated,
                value: new_value,
            }),
        }
    }

    for (key, &new_value) in after {
        if !before.contains_key(key) {
            results.push(DiffResult {
                key: key.clone(),
                status: DiffStatus::Created,
                value: new_value,
            });
        }
    }

    results
}
