// polyglot-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Store Tests
// Description: Validate SQLite TranslationStore and AccountStore behavior.
// Purpose: Ensure durable persistence, index maintenance, and integrity checks.
// Dependencies: polyglot-store-sqlite, polyglot-core, rusqlite, tempfile
// ============================================================================

//! ## Overview
//! Conformance tests for the SQLite-backed catalog store. Exercises
//! uniqueness, primary-tag maintenance, FTS5 phrase matching, batch
//! atomicity, session expiry, and fail-closed reads of tampered rows.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use polyglot_core::AccountStore;
use polyglot_core::ContentMatchMode;
use polyglot_core::EntryId;
use polyglot_core::EntryPatch;
use polyglot_core::EntryView;
use polyglot_core::InMemoryTranslationStore;
use polyglot_core::NewEntry;
use polyglot_core::NewUser;
use polyglot_core::SearchEngine;
use polyglot_core::SessionRecord;
use polyglot_core::StoreError;
use polyglot_core::Timestamp;
use polyglot_core::TranslationStore;
use polyglot_store_sqlite::SqliteCatalogStore;
use polyglot_store_sqlite::SqliteStoreConfig;
use polyglot_store_sqlite::SqliteStoreError;
use polyglot_store_sqlite::SqliteStoreMode;
use polyglot_store_sqlite::SqliteSyncMode;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn config_for(path: &std::path::Path) -> SqliteStoreConfig {
    SqliteStoreConfig {
        path: path.to_path_buf(),
        busy_timeout_ms: 1_000,
        journal_mode: SqliteStoreMode::Wal,
        sync_mode: SqliteSyncMode::Full,
    }
}

fn store_for(path: &std::path::Path) -> SqliteCatalogStore {
    SqliteCatalogStore::new(&config_for(path)).expect("store init")
}

fn ids(views: &[EntryView]) -> Vec<u64> {
    views.iter().map(|view| view.id.get()).collect()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

// ============================================================================
// SECTION: Translation Tests
// ============================================================================

#[test]
fn sqlite_store_roundtrip_preserves_tag_order() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("catalog.sqlite"));
    let created = store.insert(NewEntry::new("k", "en", "Some text", &["web", "mobile"])).unwrap();
    assert_eq!(created.id.get(), 1);
    let found = store.find_by_key_and_locale("k", "en").unwrap().expect("entry present");
    assert_eq!(found.content, "Some text");
    assert_eq!(found.tags, strings(&["web", "mobile"]));
    assert_eq!(found.primary_tag.as_deref(), Some("web"));
    assert_eq!(store.get(created.id).unwrap(), Some(found));
}

#[test]
fn sqlite_store_rejects_duplicate_pair() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("catalog.sqlite"));
    store.insert(NewEntry::new("k", "en", "a", &[])).unwrap();
    let err = store.insert(NewEntry::new("k", "en", "b", &[])).unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    store.insert(NewEntry::new("k", "fr", "b", &[])).unwrap();
}

#[test]
fn sqlite_store_persists_across_instances() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("catalog.sqlite");
    {
        let store = store_for(&path);
        store.insert(NewEntry::new("k", "en", "Hello there", &["web"])).unwrap();
    }
    let store = store_for(&path);
    assert!(store.find_by_key_and_locale("k", "en").unwrap().is_some());
    let hits = store.match_content("hello", ContentMatchMode::FullText, 10).unwrap();
    assert_eq!(ids(&hits), vec![1]);
}

#[test]
fn sqlite_store_update_moves_primary_and_side_tags() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("catalog.sqlite"));
    let entry = store.insert(NewEntry::new("k", "en", "text", &["a", "b"])).unwrap();
    let patch = EntryPatch {
        tags: Some(strings(&["c", "d"])),
        ..EntryPatch::default()
    };
    let updated = store.update(entry.id, &patch).unwrap();
    assert_eq!(updated.primary_tag.as_deref(), Some("c"));
    for gone in ["a", "b"] {
        assert!(store.match_tag(gone, 10).unwrap().is_empty(), "{gone} still indexed");
    }
    assert_eq!(ids(&store.match_tag("c", 10).unwrap()), vec![1]);
    assert_eq!(ids(&store.match_tag("d", 10).unwrap()), vec![1]);
}

#[test]
fn sqlite_store_update_reindexes_content() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("catalog.sqlite"));
    let entry = store.insert(NewEntry::new("k", "en", "old words", &[])).unwrap();
    let patch = EntryPatch {
        content: Some("new words".to_string()),
        ..EntryPatch::default()
    };
    store.update(entry.id, &patch).unwrap();
    assert!(store.match_content("old", ContentMatchMode::FullText, 10).unwrap().is_empty());
    assert_eq!(ids(&store.match_content("new", ContentMatchMode::FullText, 10).unwrap()), vec![1]);
}

#[test]
fn sqlite_store_update_conflict_leaves_row_untouched() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("catalog.sqlite"));
    store.insert(NewEntry::new("a", "en", "first", &[])).unwrap();
    let second = store.insert(NewEntry::new("b", "en", "second", &["x"])).unwrap();
    let patch = EntryPatch {
        key: Some("a".to_string()),
        tags: Some(strings(&["y"])),
        ..EntryPatch::default()
    };
    let err = store.update(second.id, &patch).unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    let unchanged = store.get(second.id).unwrap().unwrap();
    assert_eq!(unchanged.key, "b");
    assert_eq!(unchanged.tags, strings(&["x"]));
    assert!(store.match_tag("y", 10).unwrap().is_empty());
}

#[test]
fn sqlite_store_update_own_pair_and_missing_id() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("catalog.sqlite"));
    let entry = store.insert(NewEntry::new("k", "en", "text", &[])).unwrap();
    let patch = EntryPatch {
        key: Some("k".to_string()),
        ..EntryPatch::default()
    };
    store.update(entry.id, &patch).unwrap();
    let missing = store.update(EntryId::from_raw(99).unwrap(), &patch).unwrap_err();
    assert!(matches!(missing, StoreError::NotFound(_)));
}

#[test]
fn sqlite_store_full_text_is_phrase_match() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("catalog.sqlite"));
    store.insert(NewEntry::new("a", "en", "Hello, World!", &[])).unwrap();
    store.insert(NewEntry::new("b", "fr", "Bonjour, le monde!", &[])).unwrap();
    store.insert(NewEntry::new("c", "es", "Hola, Mundo!", &[])).unwrap();
    let full = |query: &str| ids(&store.match_content(query, ContentMatchMode::FullText, 100).unwrap());
    assert_eq!(full("Hello"), vec![1]);
    assert_eq!(full("HELLO world"), vec![1]);
    assert!(full("hello mundo").is_empty());
    assert!(full("Hel").is_empty());
    assert!(full("\"").is_empty());
    assert!(full("!!").is_empty());
    assert_eq!(full("\"Hola\", Mundo"), vec![3]);
}

#[test]
fn sqlite_store_substring_mode_is_literal() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("catalog.sqlite"));
    store.insert(NewEntry::new("a", "en", "Hello, World!", &[])).unwrap();
    let sub = |query: &str| ids(&store.match_content(query, ContentMatchMode::Substring, 100).unwrap());
    assert_eq!(sub("LO, WO"), vec![1]);
    assert!(sub("world hello").is_empty());
    assert!(sub("").is_empty());
}

#[test]
fn sqlite_store_substring_folds_case_like_memory_store() {
    let temp = TempDir::new().unwrap();
    let sqlite = store_for(&temp.path().join("catalog.sqlite"));
    let memory = InMemoryTranslationStore::new();
    for store in [&sqlite as &dyn TranslationStore, &memory] {
        store.insert(NewEntry::new("welcome", "fr", "Bienvenue à l'École", &[])).unwrap();
        store.insert(NewEntry::new("street", "de", "STRASSE ÜBER", &[])).unwrap();
    }
    let sqlite = SearchEngine::new(sqlite, ContentMatchMode::Substring);
    let memory = SearchEngine::new(memory, ContentMatchMode::Substring);
    for query in ["école", "ÉCOLE", "à l'é", "über", "strasse ü"] {
        let expected = ids(&memory.search(query).unwrap());
        assert!(!expected.is_empty(), "{query}");
        assert_eq!(ids(&sqlite.search(query).unwrap()), expected, "{query}");
    }
}

#[test]
fn sqlite_store_substring_tracks_updated_content() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("catalog.sqlite"));
    let entry = store.insert(NewEntry::new("welcome", "fr", "Bienvenue à l'École", &[])).unwrap();
    let patch = EntryPatch {
        content: Some("Ça marche".to_string()),
        ..EntryPatch::default()
    };
    store.update(entry.id, &patch).unwrap();
    let sub = |query: &str| ids(&store.match_content(query, ContentMatchMode::Substring, 100).unwrap());
    assert!(sub("école").is_empty());
    assert_eq!(sub("ça"), vec![1]);
}

#[test]
fn sqlite_store_key_and_tag_matchers_are_exact() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("catalog.sqlite"));
    store.insert(NewEntry::new("greeting.hello", "en", "Hi", &["mobile", "web"])).unwrap();
    store.insert(NewEntry::new("greeting.hello", "fr", "Salut", &[])).unwrap();
    store.insert(NewEntry::new("greeting", "en", "Hey", &["web"])).unwrap();
    assert_eq!(ids(&store.match_key("greeting.hello", 10).unwrap()), vec![1, 2]);
    assert_eq!(ids(&store.match_tag("web", 10).unwrap()), vec![1, 3]);
    assert!(store.match_tag("mob", 10).unwrap().is_empty());
    assert_eq!(ids(&store.match_tag("web", 1).unwrap()), vec![1]);
}

#[test]
fn sqlite_store_search_caps_and_dedups() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("catalog.sqlite"));
    let batch: Vec<NewEntry> = (0..150)
        .map(|index| NewEntry::new(&format!("k{index}"), "en", "shared words", &["shared"]))
        .collect();
    assert_eq!(store.insert_batch(batch).unwrap(), 150);
    let engine = SearchEngine::new(store, ContentMatchMode::FullText);
    let results = engine.search("shared").unwrap();
    assert_eq!(ids(&results), (1..=100).collect::<Vec<u64>>());
}

#[test]
fn sqlite_store_batch_is_all_or_nothing() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("catalog.sqlite"));
    store.insert(NewEntry::new("taken", "en", "x", &[])).unwrap();
    let batch = vec![NewEntry::new("fresh", "en", "x", &["t"]), NewEntry::new("taken", "en", "y", &[])];
    let err = store.insert_batch(batch).unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    assert!(store.find_by_key_and_locale("fresh", "en").unwrap().is_none());
    assert!(store.match_tag("t", 10).unwrap().is_empty());
    assert_eq!(store.list(None, 10).unwrap().len(), 1);
}

#[test]
fn sqlite_store_list_pages_by_id() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("catalog.sqlite"));
    for index in 0..5 {
        store.insert(NewEntry::new(&format!("k{index}"), "en", "x", &[])).unwrap();
    }
    assert_eq!(ids(&store.list(None, 2).unwrap()), vec![1, 2]);
    assert_eq!(ids(&store.list(EntryId::from_raw(3), 10).unwrap()), vec![4, 5]);
}

#[test]
fn sqlite_store_detects_primary_tag_drift() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("catalog.sqlite");
    let store = store_for(&path);
    let entry = store.insert(NewEntry::new("k", "en", "x", &["a"])).unwrap();
    {
        let connection = rusqlite::Connection::open(&path).unwrap();
        connection
            .execute("UPDATE translations SET primary_tag = 'zzz' WHERE id = 1", rusqlite::params![])
            .unwrap();
    }
    assert!(matches!(store.get(entry.id), Err(StoreError::Corrupt(_))));
}

#[test]
fn sqlite_store_detects_malformed_tags_json() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("catalog.sqlite");
    let store = store_for(&path);
    store.insert(NewEntry::new("k", "en", "x", &[])).unwrap();
    {
        let connection = rusqlite::Connection::open(&path).unwrap();
        connection
            .execute("UPDATE translations SET tags_json = '\"web\"' WHERE id = 1", rusqlite::params![])
            .unwrap();
    }
    assert!(matches!(store.find_by_key_and_locale("k", "en"), Err(StoreError::Corrupt(_))));
}

#[test]
fn sqlite_store_rejects_version_mismatch() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("catalog.sqlite");
    let _store = store_for(&path);
    let connection = rusqlite::Connection::open(&path).unwrap();
    connection.execute("UPDATE store_meta SET version = 999", rusqlite::params![]).unwrap();
    let result = SqliteCatalogStore::new(&config_for(&path));
    assert!(matches!(result, Err(SqliteStoreError::VersionMismatch(_))));
}

#[test]
fn sqlite_store_rejects_directory_path() {
    let temp = TempDir::new().unwrap();
    let result = SqliteCatalogStore::new(&config_for(temp.path()));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
}

#[test]
fn sqlite_store_rejects_overlong_path_component() {
    let temp = TempDir::new().unwrap();
    let result = SqliteCatalogStore::new(&config_for(&temp.path().join("x".repeat(300))));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
}

#[test]
fn sqlite_store_allows_concurrent_inserts() {
    let temp = TempDir::new().unwrap();
    let store = std::sync::Arc::new(store_for(&temp.path().join("catalog.sqlite")));
    let mut handles = Vec::new();
    for index in 0..10 {
        let store = std::sync::Arc::clone(&store);
        handles.push(std::thread::spawn(move || {
            store.insert(NewEntry::new("same", &format!("l{index}"), "x", &[])).is_ok()
        }));
    }
    let inserted = handles.into_iter().map(|handle| handle.join().unwrap()).filter(|ok| *ok).count();
    assert_eq!(inserted, 10);
    assert_eq!(store.match_key("same", 100).unwrap().len(), 10);
}

#[test]
fn sqlite_store_concurrent_duplicate_pair_has_one_winner() {
    let temp = TempDir::new().unwrap();
    let store = std::sync::Arc::new(store_for(&temp.path().join("catalog.sqlite")));
    let barrier = std::sync::Arc::new(std::sync::Barrier::new(8));
    let mut handles = Vec::new();
    for index in 0..8 {
        let store = std::sync::Arc::clone(&store);
        let barrier = std::sync::Arc::clone(&barrier);
        handles.push(std::thread::spawn(move || {
            barrier.wait();
            store.insert(NewEntry::new("same", "en", &format!("writer {index}"), &[]))
        }));
    }
    let results: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|result| result.as_ref().err())
            .all(|err| matches!(err, StoreError::Conflict(_)))
    );
    assert_eq!(store.match_key("same", 100).unwrap().len(), 1);
}

// ============================================================================
// SECTION: Account Tests
// ============================================================================

fn new_user(email: &str) -> NewUser {
    NewUser {
        name: "Ada".to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$stub".to_string(),
    }
}

#[test]
fn sqlite_accounts_enforce_unique_email() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("catalog.sqlite"));
    let user = store.create_user(new_user("ada@example.com")).unwrap();
    assert_eq!(store.get_user(user.id).unwrap().unwrap().email, "ada@example.com");
    assert_eq!(store.find_user_by_email("ada@example.com").unwrap().unwrap().id, user.id);
    let err = store.create_user(new_user("ada@example.com")).unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[test]
fn sqlite_sessions_expire_and_revoke() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("catalog.sqlite"));
    let user = store.create_user(new_user("ada@example.com")).unwrap();
    let issued = Timestamp::from_unix_millis(1_000);
    store
        .create_session(SessionRecord {
            token_fingerprint: "fp-1".to_string(),
            user_id: user.id,
            created_at: issued,
            expires_at: Timestamp::from_unix_millis(2_000),
        })
        .unwrap();
    assert!(store.find_session("fp-1", Timestamp::from_unix_millis(1_500)).unwrap().is_some());
    assert!(store.find_session("fp-1", Timestamp::from_unix_millis(2_000)).unwrap().is_none());
    assert!(store.revoke_session("fp-1").unwrap());
    assert!(!store.revoke_session("fp-1").unwrap());
}

#[test]
fn sqlite_sessions_purge_expired_on_create() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("catalog.sqlite");
    let store = store_for(&path);
    let user = store.create_user(new_user("ada@example.com")).unwrap();
    for (fingerprint, created, expires) in [("old", 0, 10), ("new", 20, 100)] {
        store
            .create_session(SessionRecord {
                token_fingerprint: fingerprint.to_string(),
                user_id: user.id,
                created_at: Timestamp::from_unix_millis(created),
                expires_at: Timestamp::from_unix_millis(expires),
            })
            .unwrap();
    }
    let connection = rusqlite::Connection::open(&path).unwrap();
    let count: i64 =
        connection.query_row("SELECT COUNT(*) FROM sessions", rusqlite::params![], |row| row.get(0)).unwrap();
    assert_eq!(count, 1);
}
