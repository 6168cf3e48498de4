// polyglot-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Catalog Store
// Description: Durable TranslationStore and AccountStore backed by SQLite WAL.
// Purpose: Persist translation entries, tag indexes, accounts, and sessions.
// Dependencies: polyglot-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every write runs in one `IMMEDIATE` transaction that updates the entry
//! row, its case-folded content copy, its tag side table, and the FTS5 index
//! together, so a failed write leaves no trace. Uniqueness of `(entry_key, locale)` and of user emails is
//! enforced by `SQLite` constraints and surfaces as [`StoreError::Conflict`].
//! Rows are integrity-checked on read: malformed ids, tag JSON, or a primary
//! tag that disagrees with the tag list fail closed as corruption.

// ============================================================================//
// SECTION: Imports
// ============================================================================//

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use polyglot_core::AccountStore;
use polyglot_core::ContentMatchMode;
use polyglot_core::EntryId;
use polyglot_core::EntryPatch;
use polyglot_core::EntryView;
use polyglot_core::NewEntry;
use polyglot_core::NewUser;
use polyglot_core::SessionRecord;
use polyglot_core::StoreError;
use polyglot_core::Timestamp;
use polyglot_core::TranslationEntry;
use polyglot_core::TranslationStore;
use polyglot_core::UserAccount;
use polyglot_core::UserId;
use polyglot_core::core::text::fold_case;
use polyglot_core::core::text::tokenize;
use polyglot_core::primary_tag_of;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::TransactionBehavior;
use rusqlite::ffi;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================//
// SECTION: Constants
// ============================================================================//

/// `SQLite` schema version for the store.
pub const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Column list shared by every entry read, aliased on `t`.
const ENTRY_SELECT: &str = "SELECT t.id, t.entry_key, t.locale, t.content, t.tags_json, \
                            t.primary_tag, t.created_at, t.updated_at FROM translations t";
/// Column list shared by every user read.
const USER_SELECT: &str = "SELECT id, name, email, password_hash, created_at FROM users";

// ============================================================================//
// SECTION: Config
// ============================================================================//

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` catalog store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Returns a config for `path` with default tuning.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================//
// SECTION: Errors
// ============================================================================//

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Database is busy or locked past the busy timeout.
    #[error("sqlite store busy: {0}")]
    Busy(String),
    /// A unique constraint rejected the write.
    #[error("sqlite store conflict: {0}")]
    Conflict(String),
    /// The addressed row does not exist.
    #[error("sqlite store row not found: {0}")]
    NotFound(String),
    /// Store corruption or integrity mismatch.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message)
            | SqliteStoreError::Db(message)
            | SqliteStoreError::Busy(message) => Self::Unavailable(message),
            SqliteStoreError::Conflict(message) => Self::Conflict(message),
            SqliteStoreError::NotFound(message) => Self::NotFound(message),
            SqliteStoreError::Corrupt(message) | SqliteStoreError::VersionMismatch(message) => {
                Self::Corrupt(message)
            }
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

// ============================================================================//
// SECTION: Store
// ============================================================================//

/// `SQLite`-backed catalog and account store with WAL support.
#[derive(Clone)]
pub struct SqliteCatalogStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteCatalogStore {
    /// Opens an `SQLite`-backed catalog store, creating the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized, or carries an unsupported schema version.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))
    }

    /// Runs `f` inside an immediate write transaction.
    fn write<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction_with_behavior(TransactionBehavior::Immediate).map_err(db_error)?;
        let value = f(&tx)?;
        tx.commit().map_err(db_error)?;
        drop(guard);
        Ok(value)
    }

    /// Runs an entry query and projects the rows.
    fn query_views(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<EntryView>, SqliteStoreError> {
        let guard = self.lock()?;
        let entries = query_entries(&guard, sql, params)?;
        drop(guard);
        Ok(entries.iter().map(TranslationEntry::view).collect())
    }

    /// Inserts an entry row, its side tags, and its FTS row.
    fn insert_entry(
        tx: &Transaction<'_>,
        entry: NewEntry,
        now: Timestamp,
    ) -> Result<TranslationEntry, SqliteStoreError> {
        let tags_json = encode_tags(&entry.tags)?;
        let primary_tag = primary_tag_of(&entry.tags);
        tx.execute(
            "INSERT INTO translations (entry_key, locale, content, content_folded, tags_json, \
             primary_tag, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                entry.key,
                entry.locale,
                entry.content,
                fold_case(&entry.content),
                tags_json,
                primary_tag,
                now.unix_millis()
            ],
        )
        .map_err(|err| conflict_or_db(err, &entry.key, &entry.locale))?;
        let id = entry_id_from_row(tx.last_insert_rowid())?;
        write_side_tags(tx, id, &entry.tags)?;
        tx.execute(
            "INSERT INTO translations_fts (rowid, content) VALUES (?1, ?2)",
            params![id_to_sql(id)?, entry.content],
        )
        .map_err(db_error)?;
        Ok(TranslationEntry::from_new(id, entry, now))
    }

    /// Applies a patch to a stored entry inside a transaction.
    fn update_entry(
        tx: &Transaction<'_>,
        id: EntryId,
        patch: &EntryPatch,
    ) -> Result<TranslationEntry, SqliteStoreError> {
        let sql_id = id_to_sql(id)?;
        let current = query_entries(tx, &format!("{ENTRY_SELECT} WHERE t.id = ?1"), params![sql_id])?
            .pop()
            .ok_or_else(|| SqliteStoreError::NotFound(format!("translation {id}")))?;
        let mut next = current.clone();
        let tags_changed = patch.apply_to(&mut next);
        next.updated_at = Timestamp::now().max(current.created_at);
        tx.execute(
            "UPDATE translations SET entry_key = ?1, locale = ?2, content = ?3, \
             content_folded = ?4, tags_json = ?5, primary_tag = ?6, updated_at = ?7 WHERE id = ?8",
            params![
                next.key,
                next.locale,
                next.content,
                fold_case(&next.content),
                encode_tags(&next.tags)?,
                next.primary_tag,
                next.updated_at.unix_millis(),
                sql_id
            ],
        )
        .map_err(|err| conflict_or_db(err, &next.key, &next.locale))?;
        if tags_changed {
            tx.execute("DELETE FROM translation_tags WHERE entry_id = ?1", params![sql_id])
                .map_err(db_error)?;
            write_side_tags(tx, id, &next.tags)?;
        }
        if next.content != current.content {
            tx.execute(
                "INSERT INTO translations_fts (translations_fts, rowid, content) VALUES \
                 ('delete', ?1, ?2)",
                params![sql_id, current.content],
            )
            .map_err(db_error)?;
            tx.execute(
                "INSERT INTO translations_fts (rowid, content) VALUES (?1, ?2)",
                params![sql_id, next.content],
            )
            .map_err(db_error)?;
        }
        Ok(next)
    }
}

impl TranslationStore for SqliteCatalogStore {
    fn insert(&self, entry: NewEntry) -> Result<TranslationEntry, StoreError> {
        let now = Timestamp::now();
        Ok(self.write(|tx| Self::insert_entry(tx, entry, now))?)
    }

    fn insert_batch(&self, entries: Vec<NewEntry>) -> Result<usize, StoreError> {
        let now = Timestamp::now();
        Ok(self.write(|tx| {
            let count = entries.len();
            for entry in entries {
                Self::insert_entry(tx, entry, now)?;
            }
            Ok(count)
        })?)
    }

    fn update(&self, id: EntryId, patch: &EntryPatch) -> Result<TranslationEntry, StoreError> {
        Ok(self.write(|tx| Self::update_entry(tx, id, patch))?)
    }

    fn get(&self, id: EntryId) -> Result<Option<TranslationEntry>, StoreError> {
        let sql_id = id_to_sql(id)?;
        let guard = self.lock()?;
        let mut rows = query_entries(&guard, &format!("{ENTRY_SELECT} WHERE t.id = ?1"), params![sql_id])?;
        drop(guard);
        Ok(rows.pop())
    }

    fn find_by_key_and_locale(
        &self,
        key: &str,
        locale: &str,
    ) -> Result<Option<TranslationEntry>, StoreError> {
        let guard = self.lock()?;
        let mut rows = query_entries(
            &guard,
            &format!("{ENTRY_SELECT} WHERE t.entry_key = ?1 AND t.locale = ?2"),
            params![key, locale],
        )?;
        drop(guard);
        Ok(rows.pop())
    }

    fn match_content(
        &self,
        query: &str,
        mode: ContentMatchMode,
        limit: usize,
    ) -> Result<Vec<EntryView>, StoreError> {
        let limit = limit_to_sql(limit);
        let views = match mode {
            ContentMatchMode::FullText => {
                let Some(phrase) = fts_phrase(query) else {
                    return Ok(Vec::new());
                };
                self.query_views(
                    &format!(
                        "{ENTRY_SELECT} WHERE t.id IN (SELECT rowid FROM translations_fts \
                         WHERE translations_fts MATCH ?1) ORDER BY t.id LIMIT ?2"
                    ),
                    params![phrase, limit],
                )?
            }
            ContentMatchMode::Substring => {
                if query.is_empty() {
                    return Ok(Vec::new());
                }
                self.query_views(
                    &format!(
                        "{ENTRY_SELECT} WHERE instr(t.content_folded, ?1) > 0 ORDER BY t.id \
                         LIMIT ?2"
                    ),
                    params![fold_case(query), limit],
                )?
            }
        };
        Ok(views)
    }

    fn match_tag(&self, tag: &str, limit: usize) -> Result<Vec<EntryView>, StoreError> {
        Ok(self.query_views(
            &format!(
                "{ENTRY_SELECT} WHERE t.primary_tag = ?1 OR t.id IN (SELECT entry_id FROM \
                 translation_tags WHERE tag = ?1) ORDER BY t.id LIMIT ?2"
            ),
            params![tag, limit_to_sql(limit)],
        )?)
    }

    fn match_key(&self, key: &str, limit: usize) -> Result<Vec<EntryView>, StoreError> {
        Ok(self.query_views(
            &format!("{ENTRY_SELECT} WHERE t.entry_key = ?1 ORDER BY t.id LIMIT ?2"),
            params![key, limit_to_sql(limit)],
        )?)
    }

    fn list(&self, after: Option<EntryId>, limit: usize) -> Result<Vec<EntryView>, StoreError> {
        let after = after.map(id_to_sql).transpose()?.unwrap_or(0);
        Ok(self.query_views(
            &format!("{ENTRY_SELECT} WHERE t.id > ?1 ORDER BY t.id LIMIT ?2"),
            params![after, limit_to_sql(limit)],
        )?)
    }
}

impl AccountStore for SqliteCatalogStore {
    fn create_user(&self, user: NewUser) -> Result<UserAccount, StoreError> {
        let created_at = Timestamp::now();
        Ok(self.write(|tx| {
            tx.execute(
                "INSERT INTO users (name, email, password_hash, created_at) VALUES (?1, ?2, ?3, \
                 ?4)",
                params![user.name, user.email, user.password_hash, created_at.unix_millis()],
            )
            .map_err(|err| match classify(err) {
                SqliteStoreError::Conflict(_) => {
                    SqliteStoreError::Conflict("email already registered".to_string())
                }
                other => other,
            })?;
            let id = user_id_from_row(tx.last_insert_rowid())?;
            Ok(UserAccount {
                id,
                name: user.name,
                email: user.email,
                password_hash: user.password_hash,
                created_at,
            })
        })?)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let guard = self.lock()?;
        let user = query_user(&guard, &format!("{USER_SELECT} WHERE email = ?1"), params![email])?;
        drop(guard);
        Ok(user)
    }

    fn get_user(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        let sql_id = i64::try_from(id.get())
            .map_err(|_| SqliteStoreError::Invalid("user id out of range".to_string()))?;
        let guard = self.lock()?;
        let user = query_user(&guard, &format!("{USER_SELECT} WHERE id = ?1"), params![sql_id])?;
        drop(guard);
        Ok(user)
    }

    fn create_session(&self, session: SessionRecord) -> Result<(), StoreError> {
        let user_id = i64::try_from(session.user_id.get())
            .map_err(|_| SqliteStoreError::Invalid("user id out of range".to_string()))?;
        Ok(self.write(|tx| {
            tx.execute(
                "DELETE FROM sessions WHERE expires_at <= ?1",
                params![session.created_at.unix_millis()],
            )
            .map_err(db_error)?;
            tx.execute(
                "INSERT INTO sessions (token_fingerprint, user_id, created_at, expires_at) VALUES \
                 (?1, ?2, ?3, ?4)",
                params![
                    session.token_fingerprint,
                    user_id,
                    session.created_at.unix_millis(),
                    session.expires_at.unix_millis()
                ],
            )
            .map_err(classify)?;
            Ok(())
        })?)
    }

    fn find_session(
        &self,
        fingerprint: &str,
        now: Timestamp,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                "SELECT token_fingerprint, user_id, created_at, expires_at FROM sessions WHERE \
                 token_fingerprint = ?1 AND expires_at > ?2",
                params![fingerprint, now.unix_millis()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(db_error)?;
        drop(guard);
        let Some((token_fingerprint, user_id, created_at, expires_at)) = row else {
            return Ok(None);
        };
        Ok(Some(SessionRecord {
            token_fingerprint,
            user_id: user_id_from_row(user_id)?,
            created_at: Timestamp::from_unix_millis(created_at),
            expires_at: Timestamp::from_unix_millis(expires_at),
        }))
    }

    fn revoke_session(&self, fingerprint: &str) -> Result<bool, StoreError> {
        Ok(self.write(|tx| {
            let removed = tx
                .execute("DELETE FROM sessions WHERE token_fingerprint = ?1", params![fingerprint])
                .map_err(db_error)?;
            Ok(removed > 0)
        })?)
    }
}

// ============================================================================//
// SECTION: Row Mapping
// ============================================================================//

/// Raw entry row as stored, before integrity checks.
struct RawEntryRow {
    /// Row id.
    id: i64,
    /// Entry key.
    key: String,
    /// Locale code.
    locale: String,
    /// Entry content.
    content: String,
    /// JSON-encoded tag array.
    tags_json: String,
    /// Derived primary tag column.
    primary_tag: Option<String>,
    /// Creation time (unix ms).
    created_at: i64,
    /// Last update time (unix ms).
    updated_at: i64,
}

impl RawEntryRow {
    /// Reads a row selected with [`ENTRY_SELECT`].
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            key: row.get(1)?,
            locale: row.get(2)?,
            content: row.get(3)?,
            tags_json: row.get(4)?,
            primary_tag: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    /// Converts the raw row into an entry, failing closed on inconsistency.
    fn into_entry(self) -> Result<TranslationEntry, SqliteStoreError> {
        let id = entry_id_from_row(self.id)?;
        let tags: Vec<String> = serde_json::from_str(&self.tags_json).map_err(|err| {
            SqliteStoreError::Corrupt(format!("invalid tags_json for translation {id}: {err}"))
        })?;
        if primary_tag_of(&tags) != self.primary_tag {
            return Err(SqliteStoreError::Corrupt(format!(
                "primary_tag out of sync with tags for translation {id}"
            )));
        }
        Ok(TranslationEntry {
            id,
            key: self.key,
            locale: self.locale,
            content: self.content,
            tags,
            primary_tag: self.primary_tag,
            created_at: Timestamp::from_unix_millis(self.created_at),
            updated_at: Timestamp::from_unix_millis(self.updated_at),
        })
    }
}

/// Runs an entry query and converts every row.
fn query_entries(
    connection: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<TranslationEntry>, SqliteStoreError> {
    let mut stmt = connection.prepare_cached(sql).map_err(db_error)?;
    let rows = stmt
        .query_map(params, RawEntryRow::read)
        .map_err(db_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(db_error)?;
    rows.into_iter().map(RawEntryRow::into_entry).collect()
}

/// Runs a single-user query.
fn query_user(
    connection: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Option<UserAccount>, SqliteStoreError> {
    let row = connection
        .query_row(sql, params, |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })
        .optional()
        .map_err(db_error)?;
    let Some((id, name, email, password_hash, created_at)) = row else {
        return Ok(None);
    };
    Ok(Some(UserAccount {
        id: user_id_from_row(id)?,
        name,
        email,
        password_hash,
        created_at: Timestamp::from_unix_millis(created_at),
    }))
}

// ============================================================================//
// SECTION: Helpers
// ============================================================================//

/// Rewrites the side-table rows for tags after the first.
fn write_side_tags(
    tx: &Transaction<'_>,
    id: EntryId,
    tags: &[String],
) -> Result<(), SqliteStoreError> {
    let sql_id = id_to_sql(id)?;
    let mut stmt = tx
        .prepare_cached(
            "INSERT INTO translation_tags (entry_id, position, tag) VALUES (?1, ?2, ?3)",
        )
        .map_err(db_error)?;
    for (position, tag) in tags.iter().enumerate().skip(1) {
        let position = i64::try_from(position)
            .map_err(|_| SqliteStoreError::Invalid("tag position out of range".to_string()))?;
        stmt.execute(params![sql_id, position, tag]).map_err(db_error)?;
    }
    Ok(())
}

/// Encodes tags as a JSON array.
fn encode_tags(tags: &[String]) -> Result<String, SqliteStoreError> {
    serde_json::to_string(tags).map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

/// Builds an FTS5 phrase query, or `None` when the query has no tokens.
fn fts_phrase(query: &str) -> Option<String> {
    if tokenize(query).is_empty() {
        return None;
    }
    Some(format!("\"{}\"", query.replace('"', "\"\"")))
}

/// Converts an entry id to its SQL integer form.
fn id_to_sql(id: EntryId) -> Result<i64, SqliteStoreError> {
    i64::try_from(id.get()).map_err(|_| SqliteStoreError::Invalid("entry id out of range".to_string()))
}

/// Converts a stored row id to an entry id.
fn entry_id_from_row(raw: i64) -> Result<EntryId, SqliteStoreError> {
    u64::try_from(raw)
        .ok()
        .and_then(EntryId::from_raw)
        .ok_or_else(|| SqliteStoreError::Corrupt(format!("invalid translation id {raw}")))
}

/// Converts a stored row id to a user id.
fn user_id_from_row(raw: i64) -> Result<UserId, SqliteStoreError> {
    u64::try_from(raw)
        .ok()
        .and_then(UserId::from_raw)
        .ok_or_else(|| SqliteStoreError::Corrupt(format!("invalid user id {raw}")))
}

/// Clamps a result limit to the SQL integer range.
fn limit_to_sql(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Maps an engine error, keeping busy and constraint failures distinct.
fn classify(err: rusqlite::Error) -> SqliteStoreError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        match failure.code {
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                return SqliteStoreError::Busy(err.to_string());
            }
            ErrorCode::ConstraintViolation
                if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                return SqliteStoreError::Conflict(err.to_string());
            }
            _ => {}
        }
    }
    SqliteStoreError::Db(err.to_string())
}

/// Maps an engine error where a constraint failure is not expected.
fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    match classify(err) {
        SqliteStoreError::Conflict(message) => SqliteStoreError::Db(message),
        other => other,
    }
}

/// Maps an entry write error, naming the pair on conflict.
fn conflict_or_db(err: rusqlite::Error, key: &str, locale: &str) -> SqliteStoreError {
    match classify(err) {
        SqliteStoreError::Conflict(_) => SqliteStoreError::Conflict(format!(
            "translation for key '{key}' and locale '{locale}' already exists"
        )),
        other => other,
    }
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.is_empty() {
        return Err(SqliteStoreError::Invalid("store path is empty".to_string()));
    }
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms)).map_err(db_error)?;
    connection.execute_batch("PRAGMA foreign_keys = ON;").map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction_with_behavior(TransactionBehavior::Immediate).map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS translations (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    entry_key TEXT NOT NULL,
                    locale TEXT NOT NULL,
                    content TEXT NOT NULL,
                    content_folded TEXT NOT NULL,
                    tags_json TEXT NOT NULL,
                    primary_tag TEXT,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL,
                    UNIQUE (entry_key, locale)
                );
                CREATE INDEX IF NOT EXISTS idx_translations_primary_tag
                    ON translations (primary_tag);
                CREATE TABLE IF NOT EXISTS translation_tags (
                    entry_id INTEGER NOT NULL,
                    position INTEGER NOT NULL CHECK (position >= 1),
                    tag TEXT NOT NULL,
                    PRIMARY KEY (entry_id, position),
                    FOREIGN KEY (entry_id) REFERENCES translations(id) ON DELETE CASCADE
                );
                CREATE INDEX IF NOT EXISTS idx_translation_tags_tag
                    ON translation_tags (tag, entry_id);
                CREATE VIRTUAL TABLE IF NOT EXISTS translations_fts USING fts5(
                    content,
                    content = 'translations',
                    content_rowid = 'id',
                    tokenize = 'unicode61 remove_diacritics 0'
                );
                CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS sessions (
                    token_fingerprint TEXT PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    created_at INTEGER NOT NULL,
                    expires_at INTEGER NOT NULL,
                    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
                );
                CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions (expires_at);",
            )
            .map_err(db_error)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_error)?;
    Ok(())
}
