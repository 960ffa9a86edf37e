/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the database layer, the counter subsystem, and the web layer.

use serde::{Deserialize, Serialize};

/// Represents a single published photo in the album
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    /// Unique filename (e.g., "DSC_0001.jpg") — the record's identity
    pub filename: String,
    /// Uploader's email address
    pub email: String,
    /// Uploader's display nickname
    pub nick: String,
    /// Capture year (0 = unknown)
    pub year: i32,
    /// Capture month, 1-12 (0 = unknown)
    pub month: i32,
    /// Capture day of month (0 = unknown)
    pub day: i32,
    /// Camera model from EXIF (empty = unknown)
    pub model: String,
    /// Lens from EXIF (empty = unknown)
    pub lens: String,
    /// Free-form tags; treated as a set, order irrelevant
    pub tags: Vec<String>,
    /// File size in bytes
    pub size: i64,
    /// Thumbnail reference (None if not yet generated)
    pub thumbnail: Option<String>,
    /// Unix timestamp of publication
    pub published_at: i64,
}

impl PhotoRecord {
    /// Build a record for a fresh upload from the EXIF collaborator's
    /// output plus the uploader's identity. Tags start empty; the
    /// uploader adds them afterwards via an edit.
    pub fn from_exif(
        filename: &str,
        size: i64,
        user: &SignedInUser,
        exif: &ExifMetadata,
    ) -> Self {
        PhotoRecord {
            filename: filename.to_string(),
            email: user.email.clone(),
            nick: user.display_name.clone(),
            year: exif.year,
            month: exif.month,
            day: exif.day,
            model: exif.model.clone(),
            lens: exif.lens.clone(),
            tags: Vec::new(),
            size,
            thumbnail: None,
            published_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Structured camera metadata returned by the EXIF extraction
/// collaborator. The core never parses image files itself; it only
/// consumes this record shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExifMetadata {
    pub model: String,
    pub lens: String,
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub aperture: String,
    pub shutter: String,
    pub iso: String,
    pub flash: bool,
    pub width: u32,
    pub height: u32,
    pub location: String,
}

/// Identity supplied by the sign-in collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedInUser {
    pub email: String,
    pub display_name: String,
    pub uid: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> SignedInUser {
        SignedInUser {
            email: "mom@example.com".to_string(),
            display_name: "Mom".to_string(),
            uid: "uid-1".to_string(),
        }
    }

    #[test]
    fn test_from_exif_copies_facet_fields() {
        let exif = ExifMetadata {
            model: "X100".to_string(),
            lens: "23mm".to_string(),
            year: 2024,
            month: 7,
            day: 14,
            ..Default::default()
        };
        let photo = PhotoRecord::from_exif("DSC_0001.jpg", 2048, &test_user(), &exif);

        assert_eq!(photo.filename, "DSC_0001.jpg");
        assert_eq!(photo.email, "mom@example.com");
        assert_eq!(photo.nick, "Mom");
        assert_eq!(photo.year, 2024);
        assert_eq!(photo.model, "X100");
        assert_eq!(photo.lens, "23mm");
        assert!(photo.tags.is_empty());
        assert_eq!(photo.size, 2048);
    }
}
