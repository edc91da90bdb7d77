use super::*;
use crate::net::types::Role;

fn profile(role: Role) -> UserProfile {
    UserProfile {
        id: 1,
        company_id: 1,
        name: "Sato".to_owned(),
        email: "sato@example.com".to_owned(),
        role,
        position: None,
        branch_id: Some(2),
        department_id: None,
        is_active: true,
        created_at: None,
        updated_at: None,
    }
}

fn credential(token: &str, role: Role) -> Credential {
    Credential { token: token.to_owned(), user: profile(role) }
}

// =============================================================================
// SessionStore over MemoryStorage
// =============================================================================

#[test]
fn empty_store_has_no_credential() {
    let store = SessionStore::in_memory();
    assert!(store.load().unwrap().is_none());
    assert!(store.token().unwrap().is_none());
    assert!(store.bearer_token().is_none());
}

#[test]
fn persist_then_load_returns_pair() {
    let store = SessionStore::in_memory();
    store.persist(&credential("t1", Role::Staff)).unwrap();
    assert_eq!(store.load().unwrap(), Some(credential("t1", Role::Staff)));
    assert_eq!(store.bearer_token().as_deref(), Some("t1"));
}

#[test]
fn clear_removes_both_keys() {
    let storage = Arc::new(MemoryStorage::new());
    let store = SessionStore::new(storage.clone());
    store.persist(&credential("t1", Role::Staff)).unwrap();
    store.clear().unwrap();
    assert!(storage.get(TOKEN_KEY).unwrap().is_none());
    assert!(storage.get(USER_KEY).unwrap().is_none());
}

#[test]
fn clear_on_empty_store_is_ok() {
    SessionStore::in_memory().clear().unwrap();
}

#[test]
fn token_without_user_is_not_a_credential() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set_many(&[(TOKEN_KEY, "t1")]).unwrap();
    let store = SessionStore::new(storage);
    assert!(store.load().unwrap().is_none());
    // The gateway still sends whatever token is there.
    assert_eq!(store.bearer_token().as_deref(), Some("t1"));
}

#[test]
fn undecodable_user_is_not_a_credential() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set_many(&[(TOKEN_KEY, "t1"), (USER_KEY, "{not json")]).unwrap();
    assert!(SessionStore::new(storage).load().unwrap().is_none());
}

#[test]
fn empty_token_counts_as_absent() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set_many(&[(TOKEN_KEY, "")]).unwrap();
    assert!(SessionStore::new(storage).token().unwrap().is_none());
}

#[test]
fn refresh_profile_overwrites_cached_user() {
    let store = SessionStore::in_memory();
    store.persist(&credential("t1", Role::Staff)).unwrap();
    assert!(store.refresh_profile(&profile(Role::Manager)).unwrap());
    assert_eq!(store.load().unwrap(), Some(credential("t1", Role::Manager)));
}

#[test]
fn refresh_profile_without_token_writes_nothing() {
    let storage = Arc::new(MemoryStorage::new());
    let store = SessionStore::new(storage.clone());
    assert!(!store.refresh_profile(&profile(Role::Manager)).unwrap());
    assert!(storage.get(USER_KEY).unwrap().is_none());
}

// =============================================================================
// FileStorage
// =============================================================================

#[test]
fn file_storage_survives_new_instance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("session.json");

    SessionStore::new(Arc::new(FileStorage::new(&path)))
        .persist(&credential("t1", Role::Admin))
        .unwrap();

    let reopened = SessionStore::new(Arc::new(FileStorage::new(&path)));
    assert_eq!(reopened.load().unwrap(), Some(credential("t1", Role::Admin)));
}

#[test]
fn file_storage_clear_deletes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let store = SessionStore::new(Arc::new(FileStorage::new(&path)));

    store.persist(&credential("t1", Role::Staff)).unwrap();
    assert!(path.exists());
    store.clear().unwrap();
    assert!(!path.exists());
    assert!(store.load().unwrap().is_none());
}

#[test]
fn file_storage_missing_file_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("absent.json"));
    assert!(storage.get(TOKEN_KEY).unwrap().is_none());
    storage.remove_many(&[TOKEN_KEY]).unwrap();
    assert!(!storage.path().exists());
}

#[test]
fn file_storage_corrupt_file_errors_on_read_and_recovers_on_clear() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "garbage").unwrap();

    let store = SessionStore::new(Arc::new(FileStorage::new(&path)));
    assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
    assert!(store.bearer_token().is_none());

    store.clear().unwrap();
    assert!(store.load().unwrap().is_none());
}

#[test]
fn file_storage_keeps_unrelated_keys() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path().join("session.json")));
    storage.set_many(&[("theme", "dark")]).unwrap();

    let store = SessionStore::new(storage.clone());
    store.persist(&credential("t1", Role::Staff)).unwrap();
    store.clear().unwrap();

    assert_eq!(storage.get("theme").unwrap().as_deref(), Some("dark"));
}
