// polyglot-core/src/interfaces/mod.rs
// ============================================================================
// Module: Polyglot Interfaces
// Description: Backend-agnostic persistence interfaces for the catalog.
// Purpose: Define the contract surfaces used by the catalog and search engine.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the catalog reaches persistence without embedding
//! backend details. Implementations must enforce `(key, locale)` uniqueness
//! atomically, maintain the primary tag on every tag write, and fail closed
//! with [`StoreError`] instead of returning partial data.
//!
//! Matcher calls (`match_content`, `match_tag`, `match_key`) each return at
//! most `limit` entries in ascending id order; the search engine relies on
//! that ordering to merge them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::account::NewUser;
use crate::core::account::SessionRecord;
use crate::core::account::UserAccount;
use crate::core::entry::ContentMatchMode;
use crate::core::entry::EntryPatch;
use crate::core::entry::EntryView;
use crate::core::entry::NewEntry;
use crate::core::entry::TranslationEntry;
use crate::core::identifiers::EntryId;
use crate::core::identifiers::UserId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Persistence errors shared by catalog and account stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("store conflict: {0}")]
    Conflict(String),
    /// The addressed record does not exist.
    #[error("store record not found: {0}")]
    NotFound(String),
    /// The backend is unreachable, busy, or timed out.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Stored data fails integrity checks.
    #[error("store corruption: {0}")]
    Corrupt(String),
    /// Request data was rejected by the backend.
    #[error("store invalid data: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Translation Store
// ============================================================================

/// Durable home of translation entries.
pub trait TranslationStore {
    /// Inserts a new entry and assigns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when `(key, locale)` already exists.
    fn insert(&self, entry: NewEntry) -> Result<TranslationEntry, StoreError>;

    /// Inserts a batch of entries atomically and returns the inserted count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when any pair collides, in which case
    /// nothing from the batch is persisted.
    fn insert_batch(&self, entries: Vec<NewEntry>) -> Result<usize, StoreError>;

    /// Applies a patch to an existing entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id and
    /// [`StoreError::Conflict`] when the new pair belongs to another entry.
    fn update(&self, id: EntryId, patch: &EntryPatch) -> Result<TranslationEntry, StoreError>;

    /// Loads an entry by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn get(&self, id: EntryId) -> Result<Option<TranslationEntry>, StoreError>;

    /// Loads an entry by its `(key, locale)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn find_by_key_and_locale(
        &self,
        key: &str,
        locale: &str,
    ) -> Result<Option<TranslationEntry>, StoreError>;

    /// Returns entries whose content matches `query`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn match_content(
        &self,
        query: &str,
        mode: ContentMatchMode,
        limit: usize,
    ) -> Result<Vec<EntryView>, StoreError>;

    /// Returns entries carrying `tag` as one whole tag element.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn match_tag(&self, tag: &str, limit: usize) -> Result<Vec<EntryView>, StoreError>;

    /// Returns entries whose key equals `key` exactly.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn match_key(&self, key: &str, limit: usize) -> Result<Vec<EntryView>, StoreError>;

    /// Returns up to `limit` entries with id greater than `after`, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn list(&self, after: Option<EntryId>, limit: usize) -> Result<Vec<EntryView>, StoreError>;
}

// ============================================================================
// SECTION: Account Store
// ============================================================================

/// Durable home of user accounts and login sessions.
pub trait AccountStore {
    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the email is taken.
    fn create_user(&self, user: NewUser) -> Result<UserAccount, StoreError>;

    /// Loads an account by email.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError>;

    /// Loads an account by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn get_user(&self, id: UserId) -> Result<Option<UserAccount>, StoreError>;

    /// Persists a session and drops sessions that expired before `session.created_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn create_session(&self, session: SessionRecord) -> Result<(), StoreError>;

    /// Loads a live session by token fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn find_session(
        &self,
        fingerprint: &str,
        now: Timestamp,
    ) -> Result<Option<SessionRecord>, StoreError>;

    /// Deletes a session; returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn revoke_session(&self, fingerprint: &str) -> Result<bool, StoreError>;
}
