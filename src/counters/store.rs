/// Counter store: persisted counter records + in-memory mirror
///
/// The persisted side is the `counters` table (one row per facet value,
/// row id = `counter_id(field, value)`). The in-memory mirror holds, per
/// facet field, the value → count mapping the UI reads. The mirror is a
/// process-local cache — never the source of truth across restarts.
///
/// All persisted mutations for one logical photo change go through a
/// single transaction: either every counter mutation commits, or none do.
/// The mirror is folded forward only after a successful commit, so on
/// error it keeps the last known persisted view.

use rusqlite::{params, Connection};
use std::collections::{BTreeMap, HashMap};

use crate::counters::diff::{DiffResult, DiffStatus};
use crate::counters::facet::{counter_id, FacetField, FacetKey};
use crate::error::AlbumError;

/// Create the counters table if it doesn't exist.
/// Called from the catalog's schema init; exposed for in-memory tests.
pub(crate) fn ensure_schema(conn: &Connection) -> Result<(), AlbumError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS counters (
            id      TEXT PRIMARY KEY,
            field   TEXT NOT NULL,
            value   TEXT NOT NULL,
            count   INTEGER NOT NULL
        )",
        [],
    )?;

    // Per-field listing is the hot read path
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_counters_field
         ON counters(field)",
        [],
    )?;

    Ok(())
}

/// The counter store. Owns the mirror; persisted operations borrow the
/// catalog connection per call.
#[derive(Debug, Default)]
pub struct CounterStore {
    /// Per-field mirror of persisted counters. A field absent from this
    /// map has simply not been read yet; `read_field` fills it in.
    mirror: HashMap<FacetField, BTreeMap<String, i64>>,
}

impl CounterStore {
    pub fn new() -> Self {
        CounterStore {
            mirror: HashMap::new(),
        }
    }

    /// Load all persisted counters for one facet field into the mirror.
    /// Idempotent: overwrites the mirror for that field only.
    pub fn read_field(
        &mut self,
        conn: &Connection,
        field: FacetField,
    ) -> Result<(), AlbumError> {
        let mut stmt = conn.prepare(
            "SELECT value, count FROM counters WHERE field = ?1",
        )?;

        let rows = stmt.query_map(params![field.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let (value, count) = row?;
            counts.insert(value, count);
        }

        self.mirror.insert(field, counts);
        Ok(())
    }

    /// The mirrored value → count mapping for one field, if it has been
    /// read or rebuilt this session
    pub fn field_values(&self, field: FacetField) -> Option<&BTreeMap<String, i64>> {
        self.mirror.get(&field)
    }

    pub fn is_loaded(&self, field: FacetField) -> bool {
        self.mirror.contains_key(&field)
    }

    /// Apply one logical photo change's worth of counter mutations.
    ///
    /// Created → increment (creating the record at 1 on first
    /// contribution); Deleted → decrement, deleting the record when the
    /// count would reach zero. Updated/Unchanged never occur for the
    /// weight-1 contribution maps this system produces and are no-ops.
    ///
    /// Increments and decrements happen SQLite-side (`count = count + 1`)
    /// rather than read-modify-write, so concurrent logical operations
    /// against the same database serialize at the storage layer.
    pub fn apply_delta(
        &mut self,
        conn: &mut Connection,
        changes: &[DiffResult],
    ) -> Result<(), AlbumError> {
        let relevant: Vec<&DiffResult> = changes
            .iter()
            .filter(|c| matches!(c.status, DiffStatus::Created | DiffStatus::Deleted))
            .collect();

        if relevant.is_empty() {
            return Ok(());
        }

        let tx = conn.transaction()?;
        for change in &relevant {
            let key = match FacetKey::parse(&change.key) {
                Some(key) => key,
                None => {
                    // Only extract_facets feeds this path, so a foreign
                    // key means a caller bug; skip it rather than poison
                    // the whole batch.
                    eprintln!("⚠️  Skipping unrecognized counter id: {}", change.key);
                    continue;
                }
            };

            match change.status {
                DiffStatus::Created => {
                    tx.execute(
                        "INSERT INTO counters (id, field, value, count)
                         VALUES (?1, ?2, ?3, 1)
                         ON CONFLICT(id) DO UPDATE SET count = count + 1",
                        params![change.key, key.field.as_str(), key.value],
                    )?;
                }
                DiffStatus::Deleted => {
                    tx.execute(
                        "UPDATE counters SET count = count - 1 WHERE id = ?1",
                        params![change.key],
                    )?;
                    // A counter at zero is deleted, never retained
                    tx.execute(
                        "DELETE FROM counters WHERE id = ?1 AND count <= 0",
                        params![change.key],
                    )?;
                }
                DiffStatus::Updated | DiffStatus::Unchanged => {}
            }
        }
        tx.commit()?;

        // Commit succeeded: fold the same delta into the mirror. Fields
        // not yet read stay unloaded; their first read picks this up.
        for change in relevant {
            let key = match FacetKey::parse(&change.key) {
                Some(key) => key,
                None => continue,
            };
            let Some(counts) = self.mirror.get_mut(&key.field) else {
                continue;
            };
            match change.status {
                DiffStatus::Created => {
                    *counts.entry(key.value).or_insert(0) += 1;
                }
                DiffStatus::Deleted => {
                    if let Some(count) = counts.get_mut(&key.value) {
                        *count -= 1;
                        if *count <= 0 {
                            counts.remove(&key.value);
                        }
                    }
                }
                DiffStatus::Updated | DiffStatus::Unchanged => {}
            }
        }

        Ok(())
    }

    /// Wholesale per-field replacement, used by the full rebuild.
    ///
    /// Upserts every non-zero count, then deletes rows for values absent
    /// from the new mapping — all in one transaction, so readers never
    /// observe an emptied field mid-replace. The mirror for the field is
    /// swapped after the commit.
    pub fn replace_field(
        &mut self,
        conn: &mut Connection,
        field: FacetField,
        counts: &BTreeMap<String, i64>,
    ) -> Result<(), AlbumError> {
        let tx = conn.transaction()?;
        {
            let mut upsert = tx.prepare(
                "INSERT INTO counters (id, field, value, count)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET count = excluded.count",
            )?;
            for (value, &count) in counts {
                if count > 0 {
                    upsert.execute(params![
                        counter_id(field, value),
                        field.as_str(),
                        value,
                        count
                    ])?;
                }
            }

            // Prune values that no longer have any contributors
            let mut stmt = tx.prepare(
                "SELECT value FROM counters WHERE field = ?1",
            )?;
            let existing: Vec<String> = stmt
                .query_map(params![field.as_str()], |row| row.get(0))?
                .collect::<Result<_, _>>()?;

            let mut delete = tx.prepare("DELETE FROM counters WHERE id = ?1")?;
            for value in existing {
                if counts.get(&value).copied().unwrap_or(0) <= 0 {
                    delete.execute(params![counter_id(field, &value)])?;
                }
            }
        }
        tx.commit()?;

        let replacement: BTreeMap<String, i64> = counts
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(value, &count)| (value.clone(), count))
            .collect();
        self.mirror.insert(field, replacement);

        Ok(())
    }

    /// Read one persisted count directly, bypassing the mirror.
    /// None means no record exists for that facet value.
    pub fn persisted_count(
        conn: &Connection,
        field: FacetField,
        value: &str,
    ) -> Result<Option<i64>, AlbumError> {
        use rusqlite::OptionalExtension;
        let count = conn
            .query_row(
                "SELECT count FROM counters WHERE id = ?1",
                params![counter_id(field, value)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn
    }

    fn created(field: FacetField, value: &str) -> DiffResult {
        DiffResult {
            key: counter_id(field, value),
            status: DiffStatus::Created,
            value: 1,
        }
    }

    fn deleted(field: FacetField, value: &str) -> DiffResult {
        DiffResult {
            key: counter_id(field, value),
            status: DiffStatus::Deleted,
            value: 1,
        }
    }

    #[test]
    fn test_created_inserts_then_increments() {
        let mut conn = setup();
        let mut store = CounterStore::new();

        store
            .apply_delta(&mut conn, &[created(FacetField::Tags, "beach")])
            .unwrap();
        assert_eq!(
            CounterStore::persisted_count(&conn, FacetField::Tags, "beach").unwrap(),
            Some(1)
        );

        store
            .apply_delta(&mut conn, &[created(FacetField::Tags, "beach")])
            .unwrap();
        assert_eq!(
            CounterStore::persisted_count(&conn, FacetField::Tags, "beach").unwrap(),
            Some(2)
        );
    }

    #[test]
    fn test_deleted_decrements_and_removes_at_zero() {
        let mut conn = setup();
        let mut store = CounterStore::new();
        store
            .apply_delta(
                &mut conn,
                &[
                    created(FacetField::Model, "X100"),
                    created(FacetField::Model, "X100"),
                ],
            )
            .unwrap();
        assert_eq!(
            CounterStore::persisted_count(&conn, FacetField::Model, "X100").unwrap(),
            Some(2)
        );

        store
            .apply_delta(&mut conn, &[deleted(FacetField::Model, "X100")])
            .unwrap();
        assert_eq!(
            CounterStore::persisted_count(&conn, FacetField::Model, "X100").unwrap(),
            Some(1)
        );

        // Last contributor gone: record deleted, not retained at 0
        store
            .apply_delta(&mut conn, &[deleted(FacetField::Model, "X100")])
            .unwrap();
        assert_eq!(
            CounterStore::persisted_count(&conn, FacetField::Model, "X100").unwrap(),
            None
        );
    }

    #[test]
    fn test_decrement_of_missing_record_is_harmless() {
        let mut conn = setup();
        let mut store = CounterStore::new();
        store
            .apply_delta(&mut conn, &[deleted(FacetField::Lens, "23mm")])
            .unwrap();
        assert_eq!(
            CounterStore::persisted_count(&conn, FacetField::Lens, "23mm").unwrap(),
            None
        );
    }

    #[test]
    fn test_mirror_tracks_loaded_field() {
        let mut conn = setup();
        let mut store = CounterStore::new();
        store.read_field(&conn, FacetField::Tags).unwrap();
        assert!(store.is_loaded(FacetField::Tags));

        store
            .apply_delta(
                &mut conn,
                &[
                    created(FacetField::Tags, "beach"),
                    created(FacetField::Tags, "sunset"),
                ],
            )
            .unwrap();
        let values = store.field_values(FacetField::Tags).unwrap();
        assert_eq!(values.get("beach"), Some(&1));
        assert_eq!(values.get("sunset"), Some(&1));

        store
            .apply_delta(&mut conn, &[deleted(FacetField::Tags, "sunset")])
            .unwrap();
        let values = store.field_values(FacetField::Tags).unwrap();
        assert_eq!(values.get("beach"), Some(&1));
        assert!(!values.contains_key("sunset"));
    }

    #[test]
    fn test_read_field_matches_persisted_state() {
        let mut conn = setup();
        let mut store = CounterStore::new();
        store
            .apply_delta(
                &mut conn,
                &[
                    created(FacetField::Year, "2023"),
                    created(FacetField::Year, "2024"),
                    created(FacetField::Year, "2024"),
                ],
            )
            .unwrap();

        // A second store (fresh process) sees the same state on read
        let mut fresh = CounterStore::new();
        fresh.read_field(&conn, FacetField::Year).unwrap();
        let values = fresh.field_values(FacetField::Year).unwrap();
        assert_eq!(values.get("2023"), Some(&1));
        assert_eq!(values.get("2024"), Some(&2));
    }

    #[test]
    fn test_replace_field_prunes_stale_values() {
        let mut conn = setup();
        let mut store = CounterStore::new();
        store
            .apply_delta(
                &mut conn,
                &[
                    created(FacetField::Model, "OLD-1"),
                    created(FacetField::Model, "X100"),
                ],
            )
            .unwrap();

        let mut counts = BTreeMap::new();
        counts.insert("X100".to_string(), 2);
        counts.insert("Y200".to_string(), 1);
        counts.insert("ZERO".to_string(), 0);
        store
            .replace_field(&mut conn, FacetField::Model, &counts)
            .unwrap();

        assert_eq!(
            CounterStore::persisted_count(&conn, FacetField::Model, "X100").unwrap(),
            Some(2)
        );
        assert_eq!(
            CounterStore::persisted_count(&conn, FacetField::Model, "Y200").unwrap(),
            Some(1)
        );
        assert_eq!(
            CounterStore::persisted_count(&conn, FacetField::Model, "OLD-1").unwrap(),
            None
        );
        assert_eq!(
            CounterStore::persisted_count(&conn, FacetField::Model, "ZERO").unwrap(),
            None
        );

        let values = store.field_values(FacetField::Model).unwrap();
        assert_eq!(values.len(), 2);
        assert!(!values.contains_key("ZERO"));
    }

    #[test]
    fn test_replace_field_leaves_other_fields_alone() {
        let mut conn = setup();
        let mut store = CounterStore::new();
        store
            .apply_delta(&mut conn, &[created(FacetField::Tags, "beach")])
            .unwrap();

        store
            .replace_field(&mut conn, FacetField::Model, &BTreeMap::new())
            .unwrap();

        assert_eq!(
            CounterStore::persisted_count(&conn, FacetField::Tags, "beach").unwrap(),
            Some(1)
        );
    }

    #[test]
    fn test_empty_delta_is_a_noop() {
        let mut conn = setup();
        let mut store = CounterStore::new();
        store.apply_delta(&mut conn, &[]).unwrap();
        store
            .apply_delta(
                &mut conn,
                &[DiffResult {
                    key: counter_id(FacetField::Tags, "beach"),
                    status: DiffStatus::Unchanged,
                    value: 1,
                }],
            )
            .unwrap();
        assert_eq!(
            CounterStore::persisted_count(&conn, FacetField::Tags, "beach").unwrap(),
            None
        );
    }
}
