// polyglot-core/src/runtime/store.rs
// ============================================================================
// Module: Polyglot In-Memory Stores
// Description: Mutex-guarded catalog and account stores plus shared wrappers.
// Purpose: Provide ephemeral persistence for tests and `memory` deployments.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The in-memory catalog keeps entries in a `BTreeMap` keyed by id, next to
//! the same secondary indexes the durable store maintains: a unique
//! `(key, locale)` index, a primary-tag index, a side index for the remaining
//! tags, and a key index. Every mutation validates uniqueness and rewrites the
//! indexes under a single lock, so check-and-insert is atomic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::ops::Bound;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

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
use crate::core::text::phrase_matches;
use crate::core::text::substring_matches;
use crate::core::time::Timestamp;
use crate::interfaces::AccountStore;
use crate::interfaces::StoreError;
use crate::interfaces::TranslationStore;

// ============================================================================
// SECTION: In-Memory Translation Store
// ============================================================================

/// In-memory translation store for tests and ephemeral catalogs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTranslationStore {
    /// Catalog state protected by a mutex.
    state: Arc<Mutex<CatalogState>>,
}

/// Entries plus their secondary indexes.
#[derive(Debug, Default)]
struct CatalogState {
    /// Last assigned entry id.
    last_id: u64,
    /// Entries by id.
    entries: BTreeMap<EntryId, TranslationEntry>,
    /// Unique `(key, locale)` index.
    pairs: BTreeMap<(String, String), EntryId>,
    /// Primary tag (first tag) index.
    primary_tags: BTreeMap<String, BTreeSet<EntryId>>,
    /// Index of tags at positions after the first.
    secondary_tags: BTreeMap<String, BTreeSet<EntryId>>,
    /// Key index (one key may exist in many locales).
    keys: BTreeMap<String, BTreeSet<EntryId>>,
}

impl InMemoryTranslationStore {
    /// Creates an empty in-memory translation store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the catalog state.
    fn lock(&self) -> Result<MutexGuard<'_, CatalogState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("translation store mutex poisoned".to_string()))
    }
}

impl CatalogState {
    /// Reserves the next entry id.
    fn next_id(&mut self) -> Result<EntryId, StoreError> {
        let next = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| StoreError::Invalid("entry id space exhausted".to_string()))?;
        let id = EntryId::from_raw(next)
            .ok_or_else(|| StoreError::Corrupt("entry id overflowed to zero".to_string()))?;
        self.last_id = next;
        Ok(id)
    }

    /// Adds an entry to every index.
    fn index(&mut self, entry: &TranslationEntry) {
        self.pairs.insert((entry.key.clone(), entry.locale.clone()), entry.id);
        self.keys.entry(entry.key.clone()).or_default().insert(entry.id);
        if let Some(primary) = &entry.primary_tag {
            self.primary_tags.entry(primary.clone()).or_default().insert(entry.id);
        }
        for tag in entry.tags.iter().skip(1) {
            self.secondary_tags.entry(tag.clone()).or_default().insert(entry.id);
        }
    }

    /// Removes an entry from every index.
    fn unindex(&mut self, entry: &TranslationEntry) {
        self.pairs.remove(&(entry.key.clone(), entry.locale.clone()));
        remove_from(&mut self.keys, &entry.key, entry.id);
        if let Some(primary) = &entry.primary_tag {
            remove_from(&mut self.primary_tags, primary, entry.id);
        }
        for tag in entry.tags.iter().skip(1) {
            remove_from(&mut self.secondary_tags, tag, entry.id);
        }
    }

    /// Returns the entry holding a pair, if any.
    fn pair_owner(&self, key: &str, locale: &str) -> Option<EntryId> {
        self.pairs.get(&(key.to_string(), locale.to_string())).copied()
    }

    /// Projects the first `limit` ids of an ordered set.
    fn views<'a>(&self, ids: impl Iterator<Item = &'a EntryId>, limit: usize) -> Vec<EntryView> {
        ids.filter_map(|id| self.entries.get(id)).take(limit).map(TranslationEntry::view).collect()
    }
}

impl TranslationStore for InMemoryTranslationStore {
    fn insert(&self, entry: NewEntry) -> Result<TranslationEntry, StoreError> {
        let mut state = self.lock()?;
        if state.pair_owner(&entry.key, &entry.locale).is_some() {
            return Err(conflict(&entry.key, &entry.locale));
        }
        let id = state.next_id()?;
        let stored = TranslationEntry::from_new(id, entry, Timestamp::now());
        state.index(&stored);
        state.entries.insert(id, stored.clone());
        Ok(stored)
    }

    fn insert_batch(&self, entries: Vec<NewEntry>) -> Result<usize, StoreError> {
        let mut state = self.lock()?;
        let mut seen = BTreeSet::new();
        for entry in &entries {
            let pair = (entry.key.clone(), entry.locale.clone());
            if state.pairs.contains_key(&pair) || !seen.insert(pair) {
                return Err(conflict(&entry.key, &entry.locale));
            }
        }
        let count = entries.len();
        u64::try_from(count)
            .ok()
            .and_then(|count| state.last_id.checked_add(count))
            .ok_or_else(|| StoreError::Invalid("entry id space exhausted".to_string()))?;
        let now = Timestamp::now();
        for entry in entries {
            let id = state.next_id()?;
            let stored = TranslationEntry::from_new(id, entry, now);
            state.index(&stored);
            state.entries.insert(id, stored);
        }
        Ok(count)
    }

    fn update(&self, id: EntryId, patch: &EntryPatch) -> Result<TranslationEntry, StoreError> {
        let mut state = self.lock()?;
        let current = state
            .entries
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("translation {id}")))?;
        let mut next = current.clone();
        patch.apply_to(&mut next);
        if let Some(owner) = state.pair_owner(&next.key, &next.locale)
            && owner != id
        {
            return Err(conflict(&next.key, &next.locale));
        }
        next.updated_at = Timestamp::now().max(current.created_at);
        state.unindex(&current);
        state.index(&next);
        state.entries.insert(id, next.clone());
        Ok(next)
    }

    fn get(&self, id: EntryId) -> Result<Option<TranslationEntry>, StoreError> {
        Ok(self.lock()?.entries.get(&id).cloned())
    }

    fn find_by_key_and_locale(
        &self,
        key: &str,
        locale: &str,
    ) -> Result<Option<TranslationEntry>, StoreError> {
        let state = self.lock()?;
        Ok(state.pair_owner(key, locale).and_then(|id| state.entries.get(&id).cloned()))
    }

    fn match_content(
        &self,
        query: &str,
        mode: ContentMatchMode,
        limit: usize,
    ) -> Result<Vec<EntryView>, StoreError> {
        let state = self.lock()?;
        let matches: fn(&str, &str) -> bool = match mode {
            ContentMatchMode::FullText => phrase_matches,
            ContentMatchMode::Substring => substring_matches,
        };
        Ok(state
            .entries
            .values()
            .filter(|entry| matches(&entry.content, query))
            .take(limit)
            .map(TranslationEntry::view)
            .collect())
    }

    fn match_tag(&self, tag: &str, limit: usize) -> Result<Vec<EntryView>, StoreError> {
        let state = self.lock()?;
        let mut ids = BTreeSet::new();
        if let Some(primary) = state.primary_tags.get(tag) {
            ids.extend(primary.iter().copied());
        }
        if let Some(secondary) = state.secondary_tags.get(tag) {
            ids.extend(secondary.iter().copied());
        }
        Ok(state.views(ids.iter(), limit))
    }

    fn match_key(&self, key: &str, limit: usize) -> Result<Vec<EntryView>, StoreError> {
        let state = self.lock()?;
        Ok(state.keys.get(key).map(|ids| state.views(ids.iter(), limit)).unwrap_or_default())
    }

    fn list(&self, after: Option<EntryId>, limit: usize) -> Result<Vec<EntryView>, StoreError> {
        let state = self.lock()?;
        let views = match after {
            Some(after) => state
                .entries
                .range((Bound::Excluded(after), Bound::Unbounded))
                .map(|(_, entry)| entry.view())
                .take(limit)
                .collect(),
            None => state.entries.values().take(limit).map(TranslationEntry::view).collect(),
        };
        Ok(views)
    }
}

// ============================================================================
// SECTION: In-Memory Account Store
// ============================================================================

/// In-memory account store for tests and ephemeral deployments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountStore {
    /// Account state protected by a mutex.
    state: Arc<Mutex<AccountState>>,
}

/// Users, email index, and sessions.
#[derive(Debug, Default)]
struct AccountState {
    /// Last assigned user id.
    last_id: u64,
    /// Users by id.
    users: BTreeMap<UserId, UserAccount>,
    /// Unique email index.
    emails: BTreeMap<String, UserId>,
    /// Sessions by token fingerprint.
    sessions: BTreeMap<String, SessionRecord>,
}

impl InMemoryAccountStore {
    /// Creates an empty in-memory account store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the account state.
    fn lock(&self) -> Result<MutexGuard<'_, AccountState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("account store mutex poisoned".to_string()))
    }
}

impl AccountStore for InMemoryAccountStore {
    fn create_user(&self, user: NewUser) -> Result<UserAccount, StoreError> {
        let mut state = self.lock()?;
        if state.emails.contains_key(&user.email) {
            return Err(StoreError::Conflict("email already registered".to_string()));
        }
        let next = state
            .last_id
            .checked_add(1)
            .ok_or_else(|| StoreError::Invalid("user id space exhausted".to_string()))?;
        let id = UserId::from_raw(next)
            .ok_or_else(|| StoreError::Corrupt("user id overflowed to zero".to_string()))?;
        state.last_id = next;
        let account = UserAccount {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Timestamp::now(),
        };
        state.emails.insert(account.email.clone(), id);
        state.users.insert(id, account.clone());
        Ok(account)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let state = self.lock()?;
        Ok(state.emails.get(email).and_then(|id| state.users.get(id)).cloned())
    }

    fn get_user(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    fn create_session(&self, session: SessionRecord) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let now = session.created_at;
        state.sessions.retain(|_, existing| existing.is_live(now));
        state.sessions.insert(session.token_fingerprint.clone(), session);
        Ok(())
    }

    fn find_session(
        &self,
        fingerprint: &str,
        now: Timestamp,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let state = self.lock()?;
        Ok(state.sessions.get(fingerprint).filter(|session| session.is_live(now)).cloned())
    }

    fn revoke_session(&self, fingerprint: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.sessions.remove(fingerprint).is_some())
    }
}

// ============================================================================
// SECTION: Shared Store Wrappers
// ============================================================================

/// Shared translation store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedTranslationStore {
    /// Inner store implementation.
    inner: Arc<dyn TranslationStore + Send + Sync>,
}

impl SharedTranslationStore {
    /// Wraps a translation store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl TranslationStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn TranslationStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl TranslationStore for SharedTranslationStore {
    fn insert(&self, entry: NewEntry) -> Result<TranslationEntry, StoreError> {
        self.inner.insert(entry)
    }

    fn insert_batch(&self, entries: Vec<NewEntry>) -> Result<usize, StoreError> {
        self.inner.insert_batch(entries)
    }

    fn update(&self, id: EntryId, patch: &EntryPatch) -> Result<TranslationEntry, StoreError> {
        self.inner.update(id, patch)
    }

    fn get(&self, id: EntryId) -> Result<Option<TranslationEntry>, StoreError> {
        self.inner.get(id)
    }

    fn find_by_key_and_locale(
        &self,
        key: &str,
        locale: &str,
    ) -> Result<Option<TranslationEntry>, StoreError> {
        self.inner.find_by_key_and_locale(key, locale)
    }

    fn match_content(
        &self,
        query: &str,
        mode: ContentMatchMode,
        limit: usize,
    ) -> Result<Vec<EntryView>, StoreError> {
        self.inner.match_content(query, mode, limit)
    }

    fn match_tag(&self, tag: &str, limit: usize) -> Result<Vec<EntryView>, StoreError> {
        self.inner.match_tag(tag, limit)
    }

    fn match_key(&self, key: &str, limit: usize) -> Result<Vec<EntryView>, StoreError> {
        self.inner.match_key(key, limit)
    }

    fn list(&self, after: Option<EntryId>, limit: usize) -> Result<Vec<EntryView>, StoreError> {
        self.inner.list(after, limit)
    }
}

/// Shared account store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedAccountStore {
    /// Inner store implementation.
    inner: Arc<dyn AccountStore + Send + Sync>,
}

impl SharedAccountStore {
    /// Wraps an account store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl AccountStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn AccountStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl AccountStore for SharedAccountStore {
    fn create_user(&self, user: NewUser) -> Result<UserAccount, StoreError> {
        self.inner.create_user(user)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        self.inner.find_user_by_email(email)
    }

    fn get_user(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        self.inner.get_user(id)
    }

    fn create_session(&self, session: SessionRecord) -> Result<(), StoreError> {
        self.inner.create_session(session)
    }

    fn find_session(
        &self,
        fingerprint: &str,
        now: Timestamp,
    ) -> Result<Option<SessionRecord>, StoreError> {
        self.inner.find_session(fingerprint, now)
    }

    fn revoke_session(&self, fingerprint: &str) -> Result<bool, StoreError> {
        self.inner.revoke_session(fingerprint)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the conflict error for a taken pair.
fn conflict(key: &str, locale: &str) -> StoreError {
    StoreError::Conflict(format!("translation for key '{key}' and locale '{locale}' already exists"))
}

/// Removes an id from a set-valued index, dropping empty sets.
fn remove_from(index: &mut BTreeMap<String, BTreeSet<EntryId>>, value: &str, id: EntryId) {
    if let Some(ids) = index.get_mut(value) {
        ids.remove(&id);
        if ids.is_empty() {
            index.remove(value);
        }
    }
}
