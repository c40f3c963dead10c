use std::fs;

use promptdesk_engine::{CredentialStore, FileCredentialStore, MemoryCredentialStore};

#[test]
fn file_store_round_trips_and_clears() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state").join("credentials.json");
    let store = FileCredentialStore::new(&path);

    assert_eq!(store.load(), None);
    store.save("tok-1").expect("save");
    assert_eq!(store.load().as_deref(), Some("tok-1"));

    store.save("tok-2").expect("overwrite");
    assert_eq!(store.load().as_deref(), Some("tok-2"));

    store.clear().expect("clear");
    assert_eq!(store.load(), None);
    assert!(!path.exists());
    // Clearing twice is fine.
    store.clear().expect("clear again");
}

#[test]
fn corrupt_file_loads_as_absent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("credentials.json");
    fs::write(&path, "{ not json").expect("write");

    assert_eq!(FileCredentialStore::new(&path).load(), None);
}

#[test]
fn memory_store_behaves_like_file_store() {
    let store = MemoryCredentialStore::new(Some("tok".to_string()));
    assert_eq!(store.load().as_deref(), Some("tok"));
    store.clear().expect("clear");
    assert_eq!(store.load(), None);
}
