// polyglot-core/src/runtime/mod.rs
// ============================================================================
// Module: Polyglot Runtime
// Description: Catalog service, search engine, and in-memory stores.
// Purpose: Execute catalog operations against an injected store.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the catalog mutation and lookup service, the
//! three-strategy search engine, and in-memory stores used for tests and
//! ephemeral deployments. Every transport calls into the same services so
//! that validation, conflict handling, and result ordering stay identical.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod catalog;
pub mod search;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::CatalogError;
pub use catalog::DEFAULT_EXPORT_PAGE_SIZE;
pub use catalog::ExportPage;
pub use catalog::MAX_EXPORT_PAGE_SIZE;
pub use catalog::TranslationCatalog;
pub use search::MAX_SEARCH_RESULTS;
pub use search::MatchStrategy;
pub use search::SearchEngine;
pub use search::SearchError;
pub use store::InMemoryAccountStore;
pub use store::InMemoryTranslationStore;
pub use store::SharedAccountStore;
pub use store::SharedTranslationStore;
