// polyglot-core/src/core/entry.rs
// ============================================================================
// Module: Polyglot Translation Entries
// Description: Translation entry records, create payloads, and patches.
// Purpose: Define the persisted shape of a localized text entry.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A translation entry is a flat `key`/`locale`/`content`/`tags` record with a
//! store-assigned identifier. Tags are an ordered list; the first element is
//! mirrored into a derived primary tag that stores index separately so that
//! tag lookups stay cheap as the catalog grows.
//!
//! Security posture: entry fields are untrusted input and are validated by
//! [`crate::core::validation`] before any store call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::EntryId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum length of an entry key, in characters.
pub const MAX_KEY_CHARS: usize = 255;
/// Maximum length of a locale code, in characters.
pub const MAX_LOCALE_CHARS: usize = 5;
/// Maximum number of tags on one entry.
pub const MAX_TAGS: usize = 64;
/// Maximum length of a single tag, in characters.
pub const MAX_TAG_CHARS: usize = 255;

// ============================================================================
// SECTION: Entry Types
// ============================================================================

/// Fields supplied when creating a translation entry.
///
/// Absent text fields decode as empty so validation can report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    /// Translation key (e.g. `greeting.hello`).
    #[serde(default)]
    pub key: String,
    /// Locale code (e.g. `en`, `pt_BR`).
    #[serde(default)]
    pub locale: String,
    /// Translated text.
    #[serde(default)]
    pub content: String,
    /// Ordered tags; `null` and absent both mean no tags.
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
}

impl NewEntry {
    /// Builds a new entry payload from borrowed parts.
    #[must_use]
    pub fn new(key: &str, locale: &str, content: &str, tags: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            locale: locale.to_string(),
            content: content.to_string(),
            tags: tags.iter().map(|tag| (*tag).to_string()).collect(),
        }
    }
}

/// Partial update applied to an existing entry.
///
/// Absent fields are left unchanged. An explicit empty tag list or `null`
/// clears tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPatch {
    /// Replacement key.
    #[serde(default)]
    pub key: Option<String>,
    /// Replacement locale.
    #[serde(default)]
    pub locale: Option<String>,
    /// Replacement content.
    #[serde(default)]
    pub content: Option<String>,
    /// Replacement tag list; an explicit `null` clears tags like `[]`.
    #[serde(default, deserialize_with = "deserialize_patch_tags")]
    pub tags: Option<Vec<String>>,
}

impl EntryPatch {
    /// Returns true when the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.key.is_none() && self.locale.is_none() && self.content.is_none() && self.tags.is_none()
    }

    /// Applies the patch to an entry in place and reports whether tags changed.
    pub fn apply_to(&self, entry: &mut TranslationEntry) -> bool {
        if let Some(key) = &self.key {
            entry.key.clone_from(key);
        }
        if let Some(locale) = &self.locale {
            entry.locale.clone_from(locale);
        }
        if let Some(content) = &self.content {
            entry.content.clone_from(content);
        }
        match &self.tags {
            Some(tags) if *tags != entry.tags => {
                entry.tags.clone_from(tags);
                entry.primary_tag = primary_tag_of(&entry.tags);
                true
            }
            _ => false,
        }
    }
}

/// Persisted translation entry.
///
/// # Invariants
/// - `(key, locale)` is unique across the catalog.
/// - `primary_tag` always equals `tags.first()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationEntry {
    /// Store-assigned identifier.
    pub id: EntryId,
    /// Translation key.
    pub key: String,
    /// Locale code.
    pub locale: String,
    /// Translated text.
    pub content: String,
    /// Ordered tags.
    pub tags: Vec<String>,
    /// Derived first tag, maintained by the store.
    #[serde(skip)]
    pub primary_tag: Option<String>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last modification time.
    pub updated_at: Timestamp,
}

impl TranslationEntry {
    /// Materializes a stored entry from a create payload.
    #[must_use]
    pub fn from_new(id: EntryId, entry: NewEntry, now: Timestamp) -> Self {
        let primary_tag = primary_tag_of(&entry.tags);
        Self {
            id,
            key: entry.key,
            locale: entry.locale,
            content: entry.content,
            tags: entry.tags,
            primary_tag,
            created_at: now,
            updated_at: now,
        }
    }

    /// Projects the entry to its search/export view.
    #[must_use]
    pub fn view(&self) -> EntryView {
        EntryView {
            id: self.id,
            key: self.key.clone(),
            locale: self.locale.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Projection returned by search and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryView {
    /// Entry identifier.
    pub id: EntryId,
    /// Translation key.
    pub key: String,
    /// Locale code.
    pub locale: String,
    /// Translated text.
    pub content: String,
    /// Ordered tags.
    pub tags: Vec<String>,
}

/// How the content strategy of a search compares the query against text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentMatchMode {
    /// Tokenized, case-insensitive phrase match.
    #[default]
    FullText,
    /// Literal case-insensitive substring match.
    Substring,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the primary tag for a tag list.
#[must_use]
pub fn primary_tag_of(tags: &[String]) -> Option<String> {
    tags.first().cloned()
}

/// Deserializes an optional tag list, mapping `null` to an empty list.
fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserializes a present patch tag field; `null` becomes an empty list.
///
/// Absent fields never reach this function and stay `None` via `default`.
fn deserialize_patch_tags<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_tags(deserializer).map(Some)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
