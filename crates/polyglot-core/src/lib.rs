// polyglot-core/src/lib.rs
// ============================================================================
// Module: Polyglot Core Library
// Description: Public API surface for the translation catalog core.
// Purpose: Expose entry types, store interfaces, and runtime services.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Polyglot core owns the translation entry model, the `(key, locale)`
//! uniqueness and validation rules, and the search engine that resolves a
//! free-text query against entry content, tags, and keys. It is
//! storage-agnostic: persistence is reached only through the
//! [`TranslationStore`] and [`AccountStore`] interfaces, which callers inject.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::AccountStore;
pub use interfaces::StoreError;
pub use interfaces::TranslationStore;
pub use runtime::CatalogError;
pub use runtime::DEFAULT_EXPORT_PAGE_SIZE;
pub use runtime::ExportPage;
pub use runtime::InMemoryAccountStore;
pub use runtime::InMemoryTranslationStore;
pub use runtime::MAX_EXPORT_PAGE_SIZE;
pub use runtime::MAX_SEARCH_RESULTS;
pub use runtime::MatchStrategy;
pub use runtime::SearchEngine;
pub use runtime::SearchError;
pub use runtime::SharedAccountStore;
pub use runtime::SharedTranslationStore;
pub use runtime::TranslationCatalog;
