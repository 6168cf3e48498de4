// polyglot-core/src/core/validation.rs
// ============================================================================
// Module: Polyglot Entry Validation
// Description: Field-level validation for entry creates and patches.
// Purpose: Collect every per-field violation before any store call.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Validation never stops at the first failure: every violated field is
//! reported, keyed by field name, so transports can render the whole set at
//! once. Whitespace-only strings count as empty. Lengths are measured in
//! Unicode scalar values, not bytes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::core::entry::EntryPatch;
use crate::core::entry::MAX_KEY_CHARS;
use crate::core::entry::MAX_LOCALE_CHARS;
use crate::core::entry::MAX_TAG_CHARS;
use crate::core::entry::MAX_TAGS;
use crate::core::entry::NewEntry;

// ============================================================================
// SECTION: Validation Errors
// ============================================================================

/// Per-field validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    /// Field name to human-readable messages.
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Creates an empty error set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Records a violation for a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields.entry(field.to_string()).or_default().push(message.into());
    }

    /// Returns true when no violation was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns true when the field has at least one violation.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns the messages recorded for a field.
    #[must_use]
    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }

    /// Returns the sorted list of failing fields.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Converts the set into a `Result`, failing when any violation exists.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                first = false;
                write!(f, "{field}: {message}")?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Entry Validation
// ============================================================================

/// Validates a create payload.
///
/// # Errors
///
/// Returns every field violation found.
pub fn validate_new_entry(entry: &NewEntry) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_bounded(&mut errors, "key", &entry.key, MAX_KEY_CHARS);
    check_bounded(&mut errors, "locale", &entry.locale, MAX_LOCALE_CHARS);
    check_content(&mut errors, &entry.content);
    check_tags(&mut errors, &entry.tags);
    errors.into_result()
}

/// Validates the present fields of a patch under the create rules.
///
/// # Errors
///
/// Returns every field violation found.
pub fn validate_patch(patch: &EntryPatch) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if let Some(key) = &patch.key {
        check_bounded(&mut errors, "key", key, MAX_KEY_CHARS);
    }
    if let Some(locale) = &patch.locale {
        check_bounded(&mut errors, "locale", locale, MAX_LOCALE_CHARS);
    }
    if let Some(content) = &patch.content {
        check_content(&mut errors, content);
    }
    if let Some(tags) = &patch.tags {
        check_tags(&mut errors, tags);
    }
    errors.into_result()
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Checks a required string with a character limit.
fn check_bounded(errors: &mut ValidationErrors, field: &str, value: &str, max_chars: usize) {
    if value.trim().is_empty() {
        errors.add(field, format!("The {field} field is required."));
    } else if value.chars().count() > max_chars {
        errors.add(field, format!("The {field} field must not be greater than {max_chars} characters."));
    }
}

/// Checks the content field.
fn check_content(errors: &mut ValidationErrors, value: &str) {
    if value.trim().is_empty() {
        errors.add("content", "The content field is required.");
    }
}

/// Checks each tag and the tag count.
fn check_tags(errors: &mut ValidationErrors, tags: &[String]) {
    if tags.len() > MAX_TAGS {
        errors.add("tags", format!("The tags field must not have more than {MAX_TAGS} items."));
    }
    for (index, tag) in tags.iter().enumerate() {
        let field = format!("tags.{index}");
        if tag.trim().is_empty() {
            errors.add(&field, "Each tag must be a non-empty string.");
        } else if tag.chars().count() > MAX_TAG_CHARS {
            errors.add(&field, format!("Each tag must not be greater than {MAX_TAG_CHARS} characters."));
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::validate_new_entry;
    use super::validate_patch;
    use crate::core::entry::EntryPatch;
    use crate::core::entry::NewEntry;

    #[test]
    fn empty_key_is_reported() {
        let Err(errors) = validate_new_entry(&NewEntry::new("", "en", "x", &[])) else {
            unreachable!("empty key must fail");
        };
        assert!(errors.has_field("key"));
        assert!(!errors.has_field("locale"));
    }

    #[test]
    fn all_violations_are_collected() {
        let entry = NewEntry::new(" ", "en_US_x", "", &["ok", ""]);
        let Err(errors) = validate_new_entry(&entry) else {
            unreachable!("entry must fail");
        };
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["content", "key", "locale", "tags.1"]);
    }

    #[test]
    fn locale_limit_counts_characters() {
        assert!(validate_new_entry(&NewEntry::new("k", "ñññññ", "x", &[])).is_ok());
        assert!(validate_new_entry(&NewEntry::new("k", "ññññññ", "x", &[])).is_err());
    }

    #[test]
    fn patch_validates_only_present_fields() {
        assert!(validate_patch(&EntryPatch::default()).is_ok());
        let patch = EntryPatch {
            locale: Some(String::new()),
            ..EntryPatch::default()
        };
        let Err(errors) = validate_patch(&patch) else {
            unreachable!("empty locale must fail");
        };
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["locale"]);
    }
}
