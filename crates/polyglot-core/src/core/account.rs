// polyglot-core/src/core/account.rs
// ============================================================================
// Module: Polyglot Accounts
// Description: User account and session records.
// Purpose: Describe the identities that may obtain catalog access tokens.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Accounts carry an Argon2 password hash in PHC form and are never serialized
//! with it. Sessions are keyed by the SHA-256 fingerprint of the issued token;
//! the raw token exists only in the response that issued it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::identifiers::UserId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Account Types
// ============================================================================

/// Registered user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    /// Store-assigned identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email, unique across accounts.
    pub email: String,
    /// Argon2 PHC hash string.
    #[serde(skip)]
    pub password_hash: String,
    /// Creation time.
    pub created_at: Timestamp,
}

/// Account fields supplied at registration, with the password already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Argon2 PHC hash string.
    pub password_hash: String,
}

/// Persisted login session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Hex SHA-256 of the bearer token.
    pub token_fingerprint: String,
    /// Owning account.
    pub user_id: UserId,
    /// Issue time.
    pub created_at: Timestamp,
    /// Expiry time; the session is dead at or after this instant.
    pub expires_at: Timestamp,
}

impl SessionRecord {
    /// Returns true when the session is still valid at `now`.
    #[must_use]
    pub fn is_live(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }
}
