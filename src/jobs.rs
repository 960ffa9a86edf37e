/// Scheduled maintenance jobs
///
/// Two periodic passes keep the denormalized state honest: the full
/// counter rebuild and the bucket-total recompute. Each pass opens its
/// own database connection (the main catalog connection stays with the
/// session that owns it) and runs on a fixed interval. Failures are
/// logged and surface again next tick — the core never retries on its
/// own.

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::counters::rebuild;
use crate::counters::store::{self, CounterStore};
use crate::error::AlbumError;
use crate::state::library;

/// What one maintenance pass accomplished
#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceReport {
    /// Total photo bytes after the recompute
    pub bucket_bytes: i64,
}

/// Run one maintenance pass: rebuild all counters, then recompute the
/// bucket total. The pass uses a throwaway mirror — live sessions pick
/// up the rebuilt counters on their next per-field read.
pub fn run_maintenance_once(
    db_path: &Path,
    cancel: &AtomicBool,
) -> Result<MaintenanceReport, AlbumError> {
    let mut conn = Connection::open(db_path)?;
    library::ensure_schema(&conn)?;
    store::ensure_schema(&conn)?;

    let mut counters = CounterStore::new();
    rebuild::rebuild_all(&mut conn, &mut counters, cancel)?;

    let bucket_bytes = rebuild::recompute_bucket_total(&conn)?;

    Ok(MaintenanceReport { bucket_bytes })
}

/// Periodic maintenance loop. Runs a pass per tick (the first tick fires
/// immediately) until the cancel flag is raised.
pub async fn run_maintenance(
    db_path: PathBuf,
    every: Duration,
    cancel: Arc<AtomicBool>,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if cancel.load(Ordering::Relaxed) {
            break;
        }

        let path = db_path.clone();
        let flag = Arc::clone(&cancel);
        let result =
            tokio::task::spawn_blocking(move || run_maintenance_once(&path, &flag)).await;

        match result {
            Ok(Ok(report)) => {
                println!(
                    "🧹 Maintenance pass complete: bucket at {} bytes",
                    report.bucket_bytes
                );
            }
            Ok(Err(AlbumError::RebuildCancelled)) => break,
            Ok(Err(e)) => eprintln!("⚠️  Maintenance pass failed: {}", e),
            Err(e) => eprintln!("⚠️  Maintenance task panicked: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::facet::FacetField;
    use crate::state::data::PhotoRecord;
    use crate::state::library::Library;

    fn photo(filename: &str, size: i64) -> PhotoRecord {
        PhotoRecord {
            filename: filename.to_string(),
            email: "mom@example.com".to_string(),
            nick: "Mom".to_string(),
            year: 2024,
            month: 1,
            day: 1,
            model: "X100".to_string(),
            lens: String::new(),
            tags: vec!["beach".to_string()],
            size,
            thumbnail: None,
            published_at: 0,
        }
    }

    #[test]
    fn test_maintenance_pass_rebuilds_and_totals() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("album.db");

        let library = Library::open(db_path.clone()).unwrap();
        library.insert_photo(&photo("a.jpg", 100)).unwrap();
        library.insert_photo(&photo("b.jpg", 150)).unwrap();
        drop(library);

        let cancel = AtomicBool::new(false);
        let report = run_maintenance_once(&db_path, &cancel).unwrap();
        assert_eq!(report.bucket_bytes, 250);

        let conn = Connection::open(&db_path).unwrap();
        assert_eq!(
            CounterStore::persisted_count(&conn, FacetField::Tags, "beach").unwrap(),
            Some(2)
        );
        assert_eq!(rebuild::bucket_total(&conn).unwrap(), Some(250));
    }

    #[test]
    fn test_cancelled_pass_reports_cancellation() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("album.db");
        drop(Library::open(db_path.clone()).unwrap());

        let cancel = AtomicBool::new(true);
        let err = run_maintenance_once(&db_path, &cancel).unwrap_err();
        assert!(matches!(err, AlbumError::RebuildCancelled));
    }

    #[tokio::test]
    async fn test_loop_exits_on_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("album.db");
        drop(Library::open(db_path.clone()).unwrap());

        let cancel = Arc::new(AtomicBool::new(true));
        // Flag already raised: the loop must exit on its first tick
        tokio::time::timeout(
            Duration::from_secs(5),
            run_maintenance(db_path, Duration::from_millis(10), cancel),
        )
        .await
        .expect("maintenance loop did not exit after cancel");
    }
}
