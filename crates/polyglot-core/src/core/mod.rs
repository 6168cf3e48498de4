// polyglot-core/src/core/mod.rs
// ============================================================================
// Module: Polyglot Core Types
// Description: Canonical translation entry, account, and validation types.
// Purpose: Provide stable, serializable types shared by stores and services.
// Dependencies: serde, sha2, time
// ============================================================================

//! ## Overview
//! Core types define translation entries and their patches, user accounts and
//! sessions, field validation, and the small text helpers used by content
//! matching. These types are the source of truth for every derived surface
//! (HTTP, CLI, storage rows).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod account;
pub mod entry;
pub mod hashing;
pub mod identifiers;
pub mod text;
pub mod time;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use account::NewUser;
pub use account::SessionRecord;
pub use account::UserAccount;
pub use entry::ContentMatchMode;
pub use entry::EntryPatch;
pub use entry::EntryView;
pub use entry::MAX_KEY_CHARS;
pub use entry::MAX_LOCALE_CHARS;
pub use entry::MAX_TAG_CHARS;
pub use entry::MAX_TAGS;
pub use entry::NewEntry;
pub use entry::TranslationEntry;
pub use entry::primary_tag_of;
pub use hashing::HashDigest;
pub use hashing::hash_bytes;
pub use identifiers::EntryId;
pub use identifiers::UserId;
pub use time::Timestamp;
pub use validation::ValidationErrors;
pub use validation::validate_new_entry;
pub use validation::validate_patch;
