//! Video metadata record and formatting helpers

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

/// Canonical metadata written as `meta.json` next to every migrated video.
///
/// Field order is the serialized key order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetadataRecord {
    /// URL-safe unique id, assigned once at migration time
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// Free text, empty when unknown
    #[serde(default)]
    pub description: String,

    /// Ordered tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Speakers or presenters
    #[serde(default)]
    pub people: Vec<String>,
}

impl MetadataRecord {
    /// Create a record with a freshly generated id and no description, tags or people
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            title: title.into(),
            description: String::new(),
            tags: Vec::new(),
            people: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_people(mut self, people: Vec<String>) -> Self {
        self.people = people;
        self
    }

    /// Serialize as pretty JSON with four-space indentation
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only ever emits valid UTF-8
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Parse a record previously written with [`MetadataRecord::to_pretty_json`]
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Generate a new random, URL-safe identifier
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Format a byte count in 1024 steps, e.g. `1.5GB` or `512B`
pub fn format_size(size: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    let mut unit = 0;
    let mut divisor = 1u64;
    while unit + 1 < UNITS.len() && size >= divisor * 1024 {
        divisor *= 1024;
        unit += 1;
    }

    if unit == 0 {
        return format!("{}B", size);
    }

    let value = format!("{:.2}", size as f64 / divisor as f64);
    let value = value.trim_end_matches('0').trim_end_matches('.');
    format!("{}{}", value, UNITS[unit])
}
