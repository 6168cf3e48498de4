// polyglot-api/src/accounts.rs
// ============================================================================
// Module: Accounts
// Description: Registration, login, and session lifecycle.
// Purpose: Issue and revoke opaque session tokens for catalog callers.
// Dependencies: argon2, base64, polyglot-config, polyglot-core, rand
// ============================================================================

//! ## Overview
//! Passwords are hashed with Argon2id into PHC strings and never stored or
//! logged raw. Session tokens are 32 random bytes, base64url encoded, and are
//! handed out exactly once; only their SHA-256 fingerprint is persisted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use argon2::Argon2;
use argon2::PasswordHash;
use argon2::PasswordHasher;
use argon2::PasswordVerifier;
use argon2::password_hash::SaltString;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use polyglot_config::AccountsConfig;
use polyglot_config::MAX_PASSWORD_LENGTH;
use polyglot_core::AccountStore;
use polyglot_core::NewUser;
use polyglot_core::SessionRecord;
use polyglot_core::SharedAccountStore;
use polyglot_core::StoreError;
use polyglot_core::Timestamp;
use polyglot_core::UserAccount;
use polyglot_core::UserId;
use polyglot_core::ValidationErrors;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::auth::token_fingerprint;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Longest accepted display name, in characters.
const MAX_NAME_CHARS: usize = 255;
/// Shortest accepted email, in characters.
const MIN_EMAIL_CHARS: usize = 3;
/// Longest accepted email, in characters.
const MAX_EMAIL_CHARS: usize = 255;
/// Random bytes per session token.
const SESSION_TOKEN_BYTES: usize = 32;
/// Well-formed Argon2id hash with default cost that no password matches.
///
/// Logins for unknown emails verify against it so they cost as much as a
/// wrong password for a real account.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$quYfqAkw6WMY50zAvlIDfg$v9V3kiEk1CBZOlcVD7qIH58MsY3jOzXbHkG4HIunaJk";

// ============================================================================
// SECTION: Requests
// ============================================================================

/// `register-user` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Login email.
    #[serde(default)]
    pub email: Option<String>,
    /// Plaintext password.
    #[serde(default)]
    pub password: Option<String>,
}

/// `login` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    #[serde(default)]
    pub email: Option<String>,
    /// Plaintext password.
    #[serde(default)]
    pub password: Option<String>,
}

/// Account plus a freshly issued session token.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    /// Authenticated account.
    pub user: UserAccount,
    /// Bearer token; shown once.
    pub token: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Account operation failures.
#[derive(Debug, Error)]
pub enum AccountError {
    /// One or more fields failed validation.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    /// Email already registered.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Registration is turned off in configuration.
    #[error("registration disabled")]
    RegistrationDisabled,
    /// Session refers to an account that no longer exists.
    #[error("user not found")]
    UserNotFound,
    /// Account store failed.
    #[error("account store unavailable: {0}")]
    Unavailable(String),
    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => Self::Conflict(message),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Account and session service.
#[derive(Clone)]
pub struct AccountService {
    /// Backing account store.
    store: SharedAccountStore,
    /// Account policy.
    config: AccountsConfig,
}

impl AccountService {
    /// Creates the service over a store and policy.
    #[must_use]
    pub const fn new(store: SharedAccountStore, config: AccountsConfig) -> Self {
        Self {
            store,
            config,
        }
    }

    /// Registers an account and logs it in.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::RegistrationDisabled`] when registration is
    /// off, [`AccountError::Validation`] for bad fields, and
    /// [`AccountError::Conflict`] when the email is taken.
    pub fn register(&self, request: RegisterRequest) -> Result<IssuedSession, AccountError> {
        if !self.config.allow_registration {
            return Err(AccountError::RegistrationDisabled);
        }
        let name = request.name.unwrap_or_default().trim().to_string();
        let email = normalize_email(request.email.as_deref());
        let password = request.password.unwrap_or_default();

        let mut errors = ValidationErrors::new();
        if name.is_empty() {
            errors.add("name", "The name field is required.");
        } else if name.chars().count() > MAX_NAME_CHARS {
            errors.add("name", format!("The name may not be greater than {MAX_NAME_CHARS} characters."));
        }
        validate_email(&email, &mut errors);
        self.validate_password(&password, &mut errors);
        errors.into_result().map_err(AccountError::Validation)?;

        let user = self.store.create_user(NewUser {
            name,
            email,
            password_hash: hash_password(&password)?,
        })?;
        self.issue_session(user)
    }

    /// Verifies credentials and opens a session.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Validation`] for missing fields and
    /// [`AccountError::InvalidCredentials`] when the pair does not match.
    pub fn login(&self, request: LoginRequest) -> Result<IssuedSession, AccountError> {
        let email = normalize_email(request.email.as_deref());
        let password = request.password.unwrap_or_default();
        let mut errors = ValidationErrors::new();
        if email.is_empty() {
            errors.add("email", "The email field is required.");
        }
        if password.is_empty() {
            errors.add("password", "The password field is required.");
        }
        errors.into_result().map_err(AccountError::Validation)?;

        let Some(user) = self.store.find_user_by_email(&email)? else {
            verify_password(&password, DUMMY_PASSWORD_HASH);
            return Err(AccountError::InvalidCredentials);
        };
        if !verify_password(&password, &user.password_hash) {
            return Err(AccountError::InvalidCredentials);
        }
        self.issue_session(user)
    }

    /// Loads the account behind a session.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::UserNotFound`] when the account is gone.
    pub fn current_user(&self, user_id: UserId) -> Result<UserAccount, AccountError> {
        self.store.get_user(user_id)?.ok_or(AccountError::UserNotFound)
    }

    /// Revokes the session with the given token fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Unavailable`] when the store fails.
    pub fn logout(&self, fingerprint: &str) -> Result<(), AccountError> {
        self.store.revoke_session(fingerprint)?;
        Ok(())
    }

    /// Creates a session for an authenticated account.
    fn issue_session(&self, user: UserAccount) -> Result<IssuedSession, AccountError> {
        let token = generate_token();
        let now = Timestamp::now();
        self.store.create_session(SessionRecord {
            token_fingerprint: token_fingerprint(&token),
            user_id: user.id,
            created_at: now,
            expires_at: now.plus_secs(self.config.session_ttl_secs),
        })?;
        Ok(IssuedSession {
            user,
            token,
        })
    }

    /// Checks password length against policy.
    fn validate_password(&self, password: &str, errors: &mut ValidationErrors) {
        let length = password.chars().count();
        let min = self.config.min_password_length;
        if length == 0 {
            errors.add("password", "The password field is required.");
        } else if length < min {
            errors.add("password", format!("The password must be at least {min} characters."));
        } else if length > MAX_PASSWORD_LENGTH {
            errors.add(
                "password",
                format!("The password may not be greater than {MAX_PASSWORD_LENGTH} characters."),
            );
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Trims and lowercases an email.
fn normalize_email(email: Option<&str>) -> String {
    email.unwrap_or_default().trim().to_lowercase()
}

/// Checks email shape and length.
fn validate_email(email: &str, errors: &mut ValidationErrors) {
    let length = email.chars().count();
    if length == 0 {
        errors.add("email", "The email field is required.");
    } else if length < MIN_EMAIL_CHARS || !email.contains('@') {
        errors.add("email", "The email must be a valid email address.");
    } else if length > MAX_EMAIL_CHARS {
        errors.add("email", format!("The email may not be greater than {MAX_EMAIL_CHARS} characters."));
    }
}

/// Hashes a password into an Argon2id PHC string.
fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AccountError::Hashing(err.to_string()))
}

/// Checks a password against a stored PHC string.
fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .is_ok_and(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

/// Generates a fresh session token.
fn generate_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
