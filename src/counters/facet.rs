/// Facet fields, counter identity, and facet extraction
///
/// A facet is one browsing dimension of the album (capture year, tags,
/// camera model, lens, uploader). Each distinct facet value gets one
/// persisted counter record; this module defines the closed set of facet
/// fields, the deterministic counter-record identity, and the extraction
/// of a photo's facet contributions.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::state::data::PhotoRecord;

/// Namespace token prefixed to every counter id
const COUNTER_NAMESPACE: &str = "values";

/// Separator between namespace, field name, and value in a counter id.
/// Field names never contain it; facet values theoretically could
/// (e.g., a tag with a pipe). That collision is a known, accepted risk —
/// escaping would change every persisted id.
const COUNTER_DELIMITER: char = '|';

/// The closed set of facet fields, in their fixed display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FacetField {
    Year,
    Tags,
    Model,
    Lens,
    Email,
    Nick,
}

impl FacetField {
    /// All facet fields in the order the UI lists them and the rebuild
    /// commits them
    pub const ALL: [FacetField; 6] = [
        FacetField::Year,
        FacetField::Tags,
        FacetField::Model,
        FacetField::Lens,
        FacetField::Email,
        FacetField::Nick,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FacetField::Year => "year",
            FacetField::Tags => "tags",
            FacetField::Model => "model",
            FacetField::Lens => "lens",
            FacetField::Email => "email",
            FacetField::Nick => "nick",
        }
    }

    pub fn from_str(name: &str) -> Option<FacetField> {
        match name {
            "year" => Some(FacetField::Year),
            "tags" => Some(FacetField::Tags),
            "model" => Some(FacetField::Model),
            "lens" => Some(FacetField::Lens),
            "email" => Some(FacetField::Email),
            "nick" => Some(FacetField::Nick),
            _ => None,
        }
    }

    /// The photo's value for a single-valued facet field, or None if the
    /// field is absent/empty on this photo. Tags are multi-valued and
    /// handled separately in `extract_facets`.
    fn scalar_value(&self, photo: &PhotoRecord) -> Option<String> {
        let value = match self {
            // Year 0 means the capture date is unknown
            FacetField::Year => {
                if photo.year == 0 {
                    return None;
                }
                photo.year.to_string()
            }
            FacetField::Tags => return None,
            FacetField::Model => photo.model.clone(),
            FacetField::Lens => photo.lens.clone(),
            FacetField::Email => photo.email.clone(),
            FacetField::Nick => photo.nick.clone(),
        };
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

impl fmt::Display for FacetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the stable identity of one counter record.
/// Injective over the practical domain and stable across restarts — this
/// string is the persisted record's primary key.
pub fn counter_id(field: FacetField, value: &str) -> String {
    format!(
        "{}{}{}{}{}",
        COUNTER_NAMESPACE,
        COUNTER_DELIMITER,
        field.as_str(),
        COUNTER_DELIMITER,
        value
    )
}

/// A counter id split back into its field and value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetKey {
    pub field: FacetField,
    pub value: String,
}

impl FacetKey {
    /// Parse a counter id produced by `counter_id`. The value keeps any
    /// delimiter characters it contains: only the first two separators
    /// are structural, since the namespace and field names never contain
    /// the delimiter.
    pub fn parse(id: &str) -> Option<FacetKey> {
        let mut parts = id.splitn(3, COUNTER_DELIMITER);
        let namespace = parts.next()?;
        if namespace != COUNTER_NAMESPACE {
            return None;
        }
        let field = FacetField::from_str(parts.next()?)?;
        let value = parts.next()?;
        if value.is_empty() {
            return None;
        }
        Some(FacetKey {
            field,
            value: value.to_string(),
        })
    }
}

/// Derive the set of counter ids a photo contributes to, each with
/// weight 1. Tags contribute one entry per distinct non-empty tag;
/// scalar fields contribute one entry when present and non-empty.
///
/// Contributions are binary presence — a photo either counts toward a
/// facet value or it doesn't — so every weight is 1 and duplicate tags
/// collapse to a single entry.
pub fn extract_facets(photo: &PhotoRecord) -> BTreeMap<String, i64> {
    let mut facets = BTreeMap::new();

    for field in FacetField::ALL {
        if field == FacetField::Tags {
            // Deduplicate: ["a", "b", "a"] contributes {a:1, b:1}
            let distinct: BTreeSet<&str> = photo
                .tags
                .iter()
                .map(|t| t.as_str())
                .filter(|t| !t.is_empty())
                .collect();
            for tag in distinct {
                facets.insert(counter_id(field, tag), 1);
            }
        } else if let Some(value) = field.scalar_value(photo) {
            facets.insert(counter_id(field, &value), 1);
        }
    }

    facets
}
