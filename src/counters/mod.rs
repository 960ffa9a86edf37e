/// Faceted counter subsystem
///
/// Keeps the denormalized per-facet photo counts (year, tags, camera
/// model, lens, uploader) consistent with the authoritative photo table:
/// - Structural diffing of facet contributions (diff.rs)
/// - Facet fields, counter identity, extraction (facet.rs)
/// - Persisted counters + in-memory mirror (store.rs)
/// - Full recomputation from scratch (rebuild.rs)
/// - Delta updates on publish/edit/delete (update.rs)

pub mod diff;
pub mod facet;
pub mod rebuild;
pub mod store;
pub mod update;
