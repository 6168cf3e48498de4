// polyglot-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Catalog Store
// Description: Durable catalog and account persistence using SQLite WAL.
// Purpose: Provide production persistence for translation entries.
// Dependencies: polyglot-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`TranslationStore`] and
//! [`AccountStore`] sharing one database file. Entries live in a table with a
//! `UNIQUE (entry_key, locale)` constraint, an indexed primary-tag column, a
//! side table for the remaining tags, and an external-content FTS5 index over
//! entry content. Security posture: database contents are untrusted and are
//! checked for integrity when read.
//!
//! [`TranslationStore`]: polyglot_core::TranslationStore
//! [`AccountStore`]: polyglot_core::AccountStore

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SCHEMA_VERSION;
pub use store::SqliteCatalogStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
