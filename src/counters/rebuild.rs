/// Full counter rebuild
///
/// Recomputes every facet counter from the authoritative photo table and
/// replaces the persisted and mirrored state field by field. This is the
/// expensive reconciliation pass: the scheduled maintenance job runs it
/// on a timer, and it heals any drift the incremental path accumulated
/// (e.g., from interleaved edits). Idempotent and safe to retry in full.

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::counters::facet::{extract_facets, FacetField, FacetKey};
use crate::counters::store::CounterStore;
use crate::error::AlbumError;
use crate::state::library;

/// Stats row holding the summed byte size of all photos
const BUCKET_BYTES_KEY: &str = "bucket_bytes";

/// Rebuild all counters from scratch.
///
/// Reads every photo (capture date descending), accumulates per-field
/// counts with the same extraction rules the incremental path uses, then
/// commits one replace batch per facet field. The cancel flag is checked
/// between field batches: a cancelled run leaves only fully-committed
/// fields changed, never a half-written field.
///
/// If the photo read fails, nothing is mutated. If one field's batch
/// fails partway, earlier fields remain valid and the next successful
/// rebuild repairs the rest.
pub fn rebuild_all(
    conn: &mut Connection,
    store: &mut CounterStore,
    cancel: &AtomicBool,
) -> Result<(), AlbumError> {
    let photos = library::list_photos(conn)?;

    let mut accumulated: HashMap<FacetField, BTreeMap<String, i64>> = HashMap::new();
    for photo in &photos {
        for (id, weight) in extract_facets(photo) {
            let Some(key) = FacetKey::parse(&id) else {
                continue;
            };
            *accumulated
                .entry(key.field)
                .or_default()
                .entry(key.value)
                .or_insert(0) += weight;
        }
    }

    let empty = BTreeMap::new();
    for field in FacetField::ALL {
        if cancel.load(Ordering::Relaxed) {
            return Err(AlbumError::RebuildCancelled);
        }
        let counts = accumulated.get(&field).unwrap_or(&empty);
        store.replace_field(conn, field, counts)?;
    }

    println!("🔄 Rebuilt counters from {} photos", photos.len());

    Ok(())
}

/// Recompute the total byte size of all photos and store it in the
/// stats table. Returns the new total.
pub fn recompute_bucket_total(conn: &Connection) -> Result<i64, AlbumError> {
    let total: i64 = conn.query_row(
        "SELECT COALESCE(SUM(size), 0) FROM photos",
        [],
        |row| row.get(0),
    )?;

    conn.execute(
        "INSERT INTO stats (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![BUCKET_BYTES_KEY, total],
    )?;

    Ok(total)
}

/// The last recorded bucket total, if one has been computed
pub fn bucket_total(conn: &Connection) -> Result<Option<i64>, AlbumError> {
    let total = conn
        .query_row(
            "SELECT value FROM stats WHERE key = ?1",
            params![BUCKET_BYTES_KEY],
            |row| row.get(0),
        )
        .optional()?;
    Ok(total)
}
