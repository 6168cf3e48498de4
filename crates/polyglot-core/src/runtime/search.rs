// polyglot-core/src/runtime/search.rs
// ============================================================================
// Module: Polyglot Search Engine
// Description: Three-strategy catalog search with union, ordering, and cap.
// Purpose: Resolve a free-text query against content, tags, and keys.
// Dependencies: crate::{core, interfaces}, thiserror
// ============================================================================

//! ## Overview
//! A search fans out to three independent store matchers (content, tag, key),
//! unions their candidates by entry id, orders them by ascending id, and keeps
//! the first [`MAX_SEARCH_RESULTS`]. Each matcher is asked for at most
//! [`MAX_SEARCH_RESULTS`] rows in id order. The global first hundred ids of
//! the union are always contained in the per-strategy first hundreds, so the
//! capped union is exact without reading whole candidate sets.
//!
//! A blank query (empty or whitespace only) matches nothing and never reaches
//! the store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::entry::ContentMatchMode;
use crate::core::entry::EntryView;
use crate::core::identifiers::EntryId;
use crate::interfaces::StoreError;
use crate::interfaces::TranslationStore;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of entries returned by one search.
pub const MAX_SEARCH_RESULTS: usize = 100;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Candidate source consulted by a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Phrase or substring match against entry content.
    Content,
    /// Whole-element match against entry tags.
    Tag,
    /// Exact match against the entry key.
    Key,
}

impl MatchStrategy {
    /// All strategies, in the order they are consulted.
    pub const ALL: [Self; 3] = [Self::Content, Self::Tag, Self::Key];
}

/// Search failures.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The store is unreachable, busy, or failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for SearchError {
    fn from(err: StoreError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

// ============================================================================
// SECTION: Search Engine
// ============================================================================

/// Read-only search over a translation store.
#[derive(Debug, Clone)]
pub struct SearchEngine<S> {
    /// Backing store.
    store: S,
    /// Content comparison mode.
    content_mode: ContentMatchMode,
}

impl<S: TranslationStore> SearchEngine<S> {
    /// Creates a search engine over a store.
    #[must_use]
    pub const fn new(store: S, content_mode: ContentMatchMode) -> Self {
        Self {
            store,
            content_mode,
        }
    }

    /// Returns the configured content match mode.
    #[must_use]
    pub const fn content_mode(&self) -> ContentMatchMode {
        self.content_mode
    }

    /// Runs a query through every strategy.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::StoreUnavailable`] when any matcher fails.
    pub fn search(&self, query: &str) -> Result<Vec<EntryView>, SearchError> {
        self.search_with(query, &MatchStrategy::ALL)
    }

    /// Runs a query through the given strategies only.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::StoreUnavailable`] when any matcher fails.
    pub fn search_with(
        &self,
        query: &str,
        strategies: &[MatchStrategy],
    ) -> Result<Vec<EntryView>, SearchError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut merged: BTreeMap<EntryId, EntryView> = BTreeMap::new();
        for strategy in strategies {
            for view in self.candidates(*strategy, query)? {
                merged.entry(view.id).or_insert(view);
            }
        }
        Ok(merged.into_values().take(MAX_SEARCH_RESULTS).collect())
    }

    /// Fetches the first candidates for one strategy.
    fn candidates(&self, strategy: MatchStrategy, query: &str) -> Result<Vec<EntryView>, StoreError> {
        match strategy {
            MatchStrategy::Content => {
                self.store.match_content(query, self.content_mode, MAX_SEARCH_RESULTS)
            }
            MatchStrategy::Tag => self.store.match_tag(query, MAX_SEARCH_RESULTS),
            MatchStrategy::Key => self.store.match_key(query, MAX_SEARCH_RESULTS),
        }
    }
}
