/// Incremental counter updates for single photo changes
///
/// Every photo create, edit, and delete flows through `update_counters`:
/// extract the facet contributions of the before and after states, diff
/// them, and hand the change-set to the counter store as one atomic
/// batch. This is the only sanctioned way to mutate counters outside the
/// full rebuild — ad-hoc increments drift out of sync.

use rusqlite::Connection;
use std::collections::BTreeMap;

use crate::counters::diff::diff_maps;
use crate::counters::facet::extract_facets;
use crate::counters::store::CounterStore;
use crate::error::AlbumError;
use crate::state::data::PhotoRecord;

/// Adjust counters for one photo transition.
///
/// - `(None, Some)` — publish: every extracted facet counts as created
/// - `(Some, None)` — removal: every extracted facet counts as deleted
/// - `(Some, Some)` — edit: only facets that actually changed are
///   touched; a facet value present in both states is left alone
/// - `(None, None)` — no-op
pub fn update_counters(
    conn: &mut Connection,
    store: &mut CounterStore,
    old_photo: Option<&PhotoRecord>,
    new_photo: Option<&PhotoRecord>,
) -> Result<(), AlbumError> {
    if old_photo.is_none() && new_photo.is_none() {
        return Ok(());
    }

    let before = old_photo.map(extract_facets).unwrap_or_else(BTreeMap::new);
    let after = new_photo.map(extract_facets).unwrap_or_else(BTreeMap::new);

    let changes = diff_maps(&before, &after);
    store.apply_delta(conn, &changes)
}
