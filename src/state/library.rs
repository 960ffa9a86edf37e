use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;

use super::data::PhotoRecord;
use crate::counters;
use crate::error::AlbumError;

/// The Library manages the SQLite catalog database.
/// It stores photo metadata, the persisted facet counters, and the
/// bucket-usage stats row.
pub struct Library {
    conn: Connection,
    db_path: PathBuf,
}

impl Library {
    /// Create a new Library instance and initialize the database.
    ///
    /// The database file is created in the user's data directory:
    /// - Linux: ~/.local/share/family-album/family_album.db
    /// - macOS: ~/Library/Application Support/family-album/family_album.db
    /// - Windows: %APPDATA%\family-album\family_album.db
    pub fn new() -> Result<Self, AlbumError> {
        Self::open(Self::get_db_path())
    }

    /// Open (or create) the catalog at an explicit path
    pub fn open(db_path: PathBuf) -> Result<Self, AlbumError> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&db_path)?;

        println!("📁 Database initialized at: {}", db_path.display());

        let mut library = Library { conn, db_path };
        library.init_schema()?;

        Ok(library)
    }

    /// In-memory catalog, used by tests and throwaway sessions
    pub fn open_in_memory() -> Result<Self, AlbumError> {
        let conn = Connection::open_in_memory()?;
        let mut library = Library {
            conn,
            db_path: PathBuf::from(":memory:"),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Get the path where the database should be stored
    fn get_db_path() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        path.push("family-album");
        path.push("family_album.db");
        path
    }

    /// Initialize the database schema.
    /// Creates all necessary tables and indexes if they don't exist.
    fn init_schema(&mut self) -> Result<(), AlbumError> {
        ensure_schema(&self.conn)?;
        counters::store::ensure_schema(&self.conn)?;
        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Get a count of photos in the album
    pub fn photo_count(&self) -> Result<i64, AlbumError> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Insert a newly published photo
    pub fn insert_photo(&self, photo: &PhotoRecord) -> Result<(), AlbumError> {
        let tags_json = serde_json::to_string(&photo.tags)?;
        self.conn.execute(
            "INSERT INTO photos
                (filename, email, nick, year, month, day, model, lens,
                 tags, size, thumbnail, published_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                photo.filename,
                photo.email,
                photo.nick,
                photo.year,
                photo.month,
                photo.day,
                photo.model,
                photo.lens,
                tags_json,
                photo.size,
                photo.thumbnail,
                photo.published_at,
            ],
        )?;
        Ok(())
    }

    /// Fetch one photo by filename
    pub fn get_photo(&self, filename: &str) -> Result<PhotoRecord, AlbumError> {
        let row = self
            .conn
            .query_row(
                &format!("{} WHERE filename = ?1", SELECT_PHOTOS),
                params![filename],
                photo_row,
            )
            .optional()?;

        match row {
            Some(raw) => raw.into_record(),
            None => Err(AlbumError::PhotoNotFound(filename.to_string())),
        }
    }

    /// Overwrite an existing photo's mutable fields
    pub fn update_photo(&self, photo: &PhotoRecord) -> Result<(), AlbumError> {
        let tags_json = serde_json::to_string(&photo.tags)?;
        let changed = self.conn.execute(
            "UPDATE photos SET
                email = ?2, nick = ?3, year = ?4, month = ?5, day = ?6,
                model = ?7, lens = ?8, tags = ?9, size = ?10, thumbnail = ?11
             WHERE filename = ?1",
            params![
                photo.filename,
                photo.email,
                photo.nick,
                photo.year,
                photo.month,
                photo.day,
                photo.model,
                photo.lens,
                tags_json,
                photo.size,
                photo.thumbnail,
            ],
        )?;
        if changed == 0 {
            return Err(AlbumError::PhotoNotFound(photo.filename.clone()));
        }
        Ok(())
    }

    /// Remove a photo from the catalog
    pub fn delete_photo(&self, filename: &str) -> Result<(), AlbumError> {
        let changed = self.conn.execute(
            "DELETE FROM photos WHERE filename = ?1",
            params![filename],
        )?;
        if changed == 0 {
            return Err(AlbumError::PhotoNotFound(filename.to_string()));
        }
        Ok(())
    }

    /// Get all photos, newest capture date first
    pub fn list_photos(&self) -> Result<Vec<PhotoRecord>, AlbumError> {
        list_photos(&self.conn)
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}

/// Create the photos and stats tables if they don't exist.
/// Exposed for tests and for background jobs that open their own
/// connection.
pub(crate) fn ensure_schema(conn: &Connection) -> Result<(), AlbumError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS photos (
            filename        TEXT PRIMARY KEY,
            email           TEXT NOT NULL,
            nick            TEXT NOT NULL,
            year            INTEGER NOT NULL DEFAULT 0,
            month           INTEGER NOT NULL DEFAULT 0,
            day             INTEGER NOT NULL DEFAULT 0,
            model           TEXT NOT NULL DEFAULT '',
            lens            TEXT NOT NULL DEFAULT '',
            tags            TEXT NOT NULL DEFAULT '[]',
            size            INTEGER NOT NULL DEFAULT 0,
            thumbnail       TEXT,
            published_at    INTEGER NOT NULL
        )",
        [],
    )?;

    // Capture-date listing is the default browse order
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_photos_capture_date
         ON photos(year DESC, month DESC, day DESC)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS stats (
            key     TEXT PRIMARY KEY,
            value   INTEGER NOT NULL
        )",
        [],
    )?;

    Ok(())
}

const SELECT_PHOTOS: &str = "SELECT filename, email, nick, year, month, day, \
     model, lens, tags, size, thumbnail, published_at FROM photos";

/// All photos ordered by capture date descending. Shared by the Library
/// and the counter rebuild, which reads photos through a plain
/// connection.
pub(crate) fn list_photos(conn: &Connection) -> Result<Vec<PhotoRecord>, AlbumError> {
    let mut stmt = conn.prepare(&format!(
        "{} ORDER BY year DESC, month DESC, day DESC, published_at DESC",
        SELECT_PHOTOS
    ))?;

    let rows = stmt.query_map([], photo_row)?;

    let mut photos = Vec::new();
    for row in rows {
        photos.push(row?.into_record()?);
    }

    Ok(photos)
}

/// A photos row before the tags column is parsed out of JSON
struct RawPhotoRow {
    record: PhotoRecord,
    tags_json: String,
}

impl RawPhotoRow {
    fn into_record(self) -> Result<PhotoRecord, AlbumError> {
        let mut record = self.record;
        record.tags = serde_json::from_str(&self.tags_json)?;
        Ok(record)
    }
}

fn photo_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPhotoRow> {
    Ok(RawPhotoRow {
        record: PhotoRecord {
            filename: row.get(0)?,
            email: row.get(1)?,
            nick: row.get(2)?,
            year: row.get(3)?,
            month: row.get(4)?,
            day: row.get(5)?,
            model: row.get(6)?,
            lens: row.get(7)?,
            tags: Vec::new(),
            size: row.get(9)?,
            thumbnail: row.get(10)?,
            published_at: row.get(11)?,
        },
        tags_json: row.get(8)?,
    })
}
