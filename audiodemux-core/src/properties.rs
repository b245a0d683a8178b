//! Case-insensitive typed property store attached to every PCM stream.

use std::collections::HashMap;
use std::fmt;

/// Tagged property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Int(i32),
    Str(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Int(v) => write!(f, "{v}"),
            PropertyValue::Str(s) => f.write_str(s),
        }
    }
}

/// Well-known property keys. Lookups are case-insensitive.
pub mod keys {
    /// Codec tag: "pcm", "mp3", "flac" or "opus".
    pub const CODEC: &str = "codec";
    /// Container tag: "wav", "ogg", "flac" or "mp3".
    pub const CONTAINER: &str = "container";
    /// Gapless trim-start frame count declared by WAVE fact/trim chunks.
    pub const CONTAINER_TRIM: &str = "container.trim";
    /// Gapless total frame count declared by WAVE fact/trim chunks.
    pub const CONTAINER_SAMPLES: &str = "container.samples";
    /// Gapless trim-start frame count derived from a Xing/LAME tag.
    pub const MP3_TRIM: &str = "mp3.trim";
    /// Gapless total frame count derived from a Xing/LAME tag.
    pub const MP3_SAMPLES: &str = "mp3.samples";
}

#[derive(Debug, Clone)]
struct Entry {
    /// Key as first written, preserved for diagnostic dumps.
    key: String,
    value: PropertyValue,
}

/// String-keyed metadata map with case-insensitive lookup.
///
/// Keys are unique, last write wins. Absent keys return `None`, never a
/// default value.
#[derive(Debug, Default, Clone)]
pub struct Properties {
    entries: HashMap<String, Entry>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert an integer value.
    pub fn set_int(&mut self, key: &str, value: i32) {
        self.insert(key, PropertyValue::Int(value));
    }

    /// Upsert a string value.
    pub fn set_string(&mut self, key: &str, value: impl Into<String>) {
        self.insert(key, PropertyValue::Str(value.into()));
    }

    fn insert(&mut self, key: &str, value: PropertyValue) {
        self.entries.insert(
            key.to_ascii_lowercase(),
            Entry {
                key: key.to_string(),
                value,
            },
        );
    }

    /// Integer value for `key`, only if the stored type is integer.
    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.entries.get(&key.to_ascii_lowercase())?.value {
            PropertyValue::Int(v) => Some(v),
            PropertyValue::Str(_) => None,
        }
    }

    /// Textual value for `key`; integers render as decimal.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map(|e| e.value.to_string())
    }

    /// Unordered view of all entries for diagnostic dumping, keyed by the
    /// original-case name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.values().map(|e| (e.key.as_str(), &e.value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
