// polyglot-core/src/runtime/catalog.rs
// ============================================================================
// Module: Polyglot Translation Catalog
// Description: Validated create, update, lookup, and export over a store.
// Purpose: Give every transport one implementation of entry lifecycle rules.
// Dependencies: crate::{core, interfaces}, thiserror
// ============================================================================

//! ## Overview
//! [`TranslationCatalog`] validates input before it reaches the store and maps
//! store failures onto the four outcomes callers act on: validation,
//! conflict, not-found, and store-unavailable. Nothing is retried here; every
//! mutation either commits fully or leaves the store untouched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;

use crate::core::entry::EntryPatch;
use crate::core::entry::EntryView;
use crate::core::entry::NewEntry;
use crate::core::entry::TranslationEntry;
use crate::core::identifiers::EntryId;
use crate::core::validation::ValidationErrors;
use crate::core::validation::validate_new_entry;
use crate::core::validation::validate_patch;
use crate::interfaces::StoreError;
use crate::interfaces::TranslationStore;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default page size for catalog exports.
pub const DEFAULT_EXPORT_PAGE_SIZE: usize = 500;
/// Maximum page size for catalog exports.
pub const MAX_EXPORT_PAGE_SIZE: usize = 1_000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Catalog operation failures.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// One or more fields failed validation.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    /// The `(key, locale)` pair belongs to another entry.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The addressed entry does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The store is unreachable, busy, or failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => Self::Conflict(message),
            StoreError::NotFound(message) => Self::NotFound(message),
            StoreError::Unavailable(message)
            | StoreError::Corrupt(message)
            | StoreError::Invalid(message) => Self::StoreUnavailable(message),
        }
    }
}

// ============================================================================
// SECTION: Export Page
// ============================================================================

/// One page of an id-ordered catalog export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportPage {
    /// Entries in ascending id order.
    pub entries: Vec<EntryView>,
    /// Cursor for the next page, present when the page was full.
    pub next_after: Option<EntryId>,
}

// ============================================================================
// SECTION: Catalog Service
// ============================================================================

/// Translation entry lifecycle service.
#[derive(Debug, Clone)]
pub struct TranslationCatalog<S> {
    /// Backing store.
    store: S,
}

impl<S: TranslationStore> TranslationCatalog<S> {
    /// Creates a catalog over a store.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self {
            store,
        }
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Creates a new entry.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for bad fields and
    /// [`CatalogError::Conflict`] when the pair is taken.
    pub fn create(&self, entry: NewEntry) -> Result<TranslationEntry, CatalogError> {
        validate_new_entry(&entry).map_err(CatalogError::Validation)?;
        Ok(self.store.insert(entry)?)
    }

    /// Applies a partial update to an entry.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for an unknown id,
    /// [`CatalogError::Validation`] for bad fields, and
    /// [`CatalogError::Conflict`] when the new pair belongs to another entry.
    pub fn update(&self, id: EntryId, patch: &EntryPatch) -> Result<TranslationEntry, CatalogError> {
        validate_patch(patch).map_err(CatalogError::Validation)?;
        Ok(self.store.update(id, patch)?)
    }

    /// Looks up an entry by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::StoreUnavailable`] when the store fails.
    pub fn get(&self, id: EntryId) -> Result<Option<TranslationEntry>, CatalogError> {
        Ok(self.store.get(id)?)
    }

    /// Looks up an entry by its `(key, locale)` pair. Absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::StoreUnavailable`] when the store fails.
    pub fn find_by_key_and_locale(
        &self,
        key: &str,
        locale: &str,
    ) -> Result<Option<TranslationEntry>, CatalogError> {
        Ok(self.store.find_by_key_and_locale(key, locale)?)
    }

    /// Returns one export page of entries after the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] when `limit` is outside
    /// `1..=MAX_EXPORT_PAGE_SIZE`.
    pub fn export_page(
        &self,
        after: Option<EntryId>,
        limit: usize,
    ) -> Result<ExportPage, CatalogError> {
        if !(1..=MAX_EXPORT_PAGE_SIZE).contains(&limit) {
            let mut errors = ValidationErrors::new();
            errors.add("limit", format!("The limit must be between 1 and {MAX_EXPORT_PAGE_SIZE}."));
            return Err(CatalogError::Validation(errors));
        }
        let entries = self.store.list(after, limit)?;
        let next_after =
            if entries.len() == limit { entries.last().map(|entry| entry.id) } else { None };
        Ok(ExportPage {
            entries,
            next_after,
        })
    }

    /// Validates and inserts a batch atomically, returning the inserted count.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] keyed by `entries.<index>.<field>`
    /// when any entry is invalid, and [`CatalogError::Conflict`] when any pair
    /// collides. Nothing is inserted on error.
    pub fn import_batch(&self, entries: Vec<NewEntry>) -> Result<usize, CatalogError> {
        let mut errors = ValidationErrors::new();
        for (index, entry) in entries.iter().enumerate() {
            if let Err(entry_errors) = validate_new_entry(entry) {
                for field in entry_errors.fields() {
                    for message in entry_errors.messages(field) {
                        errors.add(&format!("entries.{index}.{field}"), message.clone());
                    }
                }
            }
        }
        errors.into_result().map_err(CatalogError::Validation)?;
        if entries.is_empty() {
            return Ok(0);
        }
        Ok(self.store.insert_batch(entries)?)
    }
}
