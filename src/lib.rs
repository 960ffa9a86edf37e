//! Family photo album core
//!
//! Members publish photos, the catalog stores their camera metadata, and
//! a set of denormalized facet counters (capture year, tags, camera
//! model, lens, uploader) backs the browse/filter UI. The counters are
//! maintained two ways: incrementally on every publish/edit/delete, and
//! wholesale by a scheduled rebuild that recomputes them from the photo
//! table.
//!
//! [`Album`] is the session context: it owns the catalog connection and
//! the counter mirror, and pairs every photo write with the matching
//! counter update so the two can never be forgotten separately.

pub mod auth;
pub mod counters;
pub mod error;
pub mod jobs;
pub mod state;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

pub use crate::counters::facet::FacetField;
pub use crate::error::AlbumError;
pub use crate::state::data::{ExifMetadata, PhotoRecord, SignedInUser};

use crate::counters::rebuild;
use crate::counters::store::CounterStore;
use crate::counters::update;
use crate::state::library::Library;

/// One session's view of the album: the catalog plus the counter mirror.
/// There is deliberately no global state — handlers receive or own an
/// `Album` and everything flows through it.
pub struct Album {
    library: Library,
    counters: CounterStore,
}

impl Album {
    /// Open the album at the default per-user data directory
    pub fn new() -> Result<Self, AlbumError> {
        Ok(Album {
            library: Library::new()?,
            counters: CounterStore::new(),
        })
    }

    /// Open the album at an explicit catalog path
    pub fn open(db_path: PathBuf) -> Result<Self, AlbumError> {
        Ok(Album {
            library: Library::open(db_path)?,
            counters: CounterStore::new(),
        })
    }

    /// In-memory album for tests and throwaway sessions
    pub fn open_in_memory() -> Result<Self, AlbumError> {
        Ok(Album {
            library: Library::open_in_memory()?,
            counters: CounterStore::new(),
        })
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Publish a new photo: insert the record, then count its facets
    pub fn publish(&mut self, photo: &PhotoRecord) -> Result<(), AlbumError> {
        self.library.insert_photo(photo)?;
        update::update_counters(
            self.library.conn_mut(),
            &mut self.counters,
            None,
            Some(photo),
        )
    }

    /// Edit a photo: overwrite the record and adjust only the facets
    /// that changed. Returns the pre-edit snapshot.
    pub fn edit(&mut self, photo: &PhotoRecord) -> Result<PhotoRecord, AlbumError> {
        let before = self.library.get_photo(&photo.filename)?;
        self.library.update_photo(photo)?;
        update::update_counters(
            self.library.conn_mut(),
            &mut self.counters,
            Some(&before),
            Some(photo),
        )?;
        Ok(before)
    }

    /// Remove a photo and release its facet contributions.
    /// Returns the removed snapshot.
    pub fn remove(&mut self, filename: &str) -> Result<PhotoRecord, AlbumError> {
        let before = self.library.get_photo(filename)?;
        self.library.delete_photo(filename)?;
        update::update_counters(
            self.library.conn_mut(),
            &mut self.counters,
            Some(&before),
            None,
        )?;
        Ok(before)
    }

    /// The value → count mapping for one facet field, loading the mirror
    /// from the catalog on first access
    pub fn facet_values(
        &mut self,
        field: FacetField,
    ) -> Result<&BTreeMap<String, i64>, AlbumError> {
        if !self.counters.is_loaded(field) {
            self.counters.read_field(self.library.conn(), field)?;
        }
        static EMPTY: BTreeMap<String, i64> = BTreeMap::new();
        Ok(self.counters.field_values(field).unwrap_or(&EMPTY))
    }

    /// Recompute every counter from the photo table (see
    /// [`counters::rebuild::rebuild_all`])
    pub fn rebuild_counters(&mut self, cancel: &AtomicBool) -> Result<(), AlbumError> {
        rebuild::rebuild_all(self.library.conn_mut(), &mut self.counters, cancel)
    }

    /// Recompute and persist the total photo bytes
    pub fn recompute_bucket_total(&self) -> Result<i64, AlbumError> {
        rebuild::recompute_bucket_total(self.library.conn())
    }
}

impl std::fmt::Debug for Album {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Album")
            .field("db_path", self.library.path())
            .finish()
    }
}
