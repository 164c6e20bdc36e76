use jotter::api::JotterApi;
use jotter::config::JotterConfig;
use jotter::error::JotterError;
use jotter::persist::backend::StorageBackend;
use jotter::persist::fs_backend::{FsBackend, DATA_FILENAME};
use jotter::persist::Persister;
use jotter::store::{NoteStore, Snapshot};
use std::fs;
use tempfile::TempDir;

fn snapshot_with_one_note() -> Snapshot {
    let mut store = NoteStore::new();
    let id = store.create_note("Journal", "first", None).unwrap();
    store.update_note(&id, "second").unwrap();
    store.snapshot()
}

#[test]
fn test_load_from_empty_dir_is_none() {
    let dir = TempDir::new().unwrap();
    let backend = FsBackend::new(dir.path());
    assert!(backend.load().unwrap().is_none());
}

#[test]
fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let backend = FsBackend::new(dir.path());
    let snapshot = snapshot_with_one_note();

    backend.save(&snapshot).unwrap();
    let loaded = backend.load().unwrap().unwrap();

    assert_eq!(loaded, snapshot);
    assert_eq!(loaded.notes[0].versions().len(), 2);
}

#[test]
fn test_save_creates_missing_dir() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");
    let backend = FsBackend::new(&nested);

    backend.save(&Snapshot::default()).unwrap();
    assert!(nested.join(DATA_FILENAME).exists());
    assert_eq!(backend.location(), nested.join(DATA_FILENAME));
}

#[test]
fn test_atomic_write_leaves_no_tmp_files() {
    let dir = TempDir::new().unwrap();
    let backend = FsBackend::new(dir.path());

    backend.save(&snapshot_with_one_note()).unwrap();
    backend.save(&snapshot_with_one_note()).unwrap();

    for entry in fs::read_dir(dir.path()).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(!name.ends_with(".tmp"), "Found leftover tmp file: {}", name);
    }
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(DATA_FILENAME), "{ not json").unwrap();
    let backend = FsBackend::new(dir.path());
    assert!(matches!(backend.load(), Err(JotterError::Serialization(_))));
}

#[test]
fn test_ledger_gap_on_disk_is_rejected() {
    let dir = TempDir::new().unwrap();
    let backend = FsBackend::new(dir.path());
    backend.save(&snapshot_with_one_note()).unwrap();

    // Renumber the second ledger entry so versions skip from 1 to 3.
    let path = dir.path().join(DATA_FILENAME);
    let mut raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    raw["notes"][0]["versions"][1]["version"] = serde_json::json!(3);
    fs::write(&path, serde_json::to_string(&raw).unwrap()).unwrap();

    assert!(matches!(
        Persister::new(FsBackend::new(dir.path())).load(),
        Err(JotterError::Corrupt(_))
    ));
}

#[test]
fn test_api_round_trip_through_disk() {
    let dir = TempDir::new().unwrap();
    {
        let api = JotterApi::open_dir(dir.path()).unwrap();
        let parent = api.create_note("Work", "", None).unwrap();
        let child = api
            .create_note("Ideas", "draft", Some(parent.as_str()))
            .unwrap();
        api.update_note(child.as_str(), "draft two").unwrap();
    }

    let api = JotterApi::open(
        Persister::new(FsBackend::new(dir.path())),
        JotterConfig::default(),
    )
    .unwrap();
    let tree = api.tree();
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].0, 0);
    assert_eq!(tree[1].0, 1);

    let child = &tree[1].1;
    assert_eq!(child.version(), 2);
    assert_eq!(child.content(), "draft two");
    assert_eq!(api.selected_note().map(|n| n.id().clone()), Some(child.id().clone()));

    let titles: Vec<_> = api
        .note_path(child.id().as_str())
        .unwrap()
        .into_iter()
        .map(|s| s.title)
        .collect();
    assert_eq!(titles, vec!["Work", "Ideas"]);
}
