use examdesk::data::DataManager;
use examdesk::error::ExamError;
use examdesk::model::{Partition, SCHEMA_VERSION};
use examdesk::store::backend::StorageBackend;
use examdesk::store::fs_backend::FsBackend;
use examdesk::store::{Record, RecordStore};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

fn setup() -> (TempDir, FsBackend) {
    let dir = TempDir::new().unwrap();
    let backend = FsBackend::new(dir.path().join("store"));
    (dir, backend)
}

#[test]
fn test_open_lays_out_partition_files() {
    let (dir, backend) = setup();
    let store = RecordStore::open(backend).unwrap();
    assert_eq!(store.version(), SCHEMA_VERSION);

    let root = dir.path().join("store");
    assert!(root.join("schema.json").is_file());
    for partition in Partition::all() {
        assert!(root.join(format!("{}.json", partition.name())).is_file());
    }
}

#[test]
fn test_records_survive_reopen() {
    let (dir, backend) = setup();
    {
        let store = RecordStore::open(backend).unwrap();
        store
            .partition(Partition::UserSettings)
            .put(&Record::new("timeLimit", 45))
            .unwrap();
    }

    let store = RecordStore::open(FsBackend::new(dir.path().join("store"))).unwrap();
    let value: Option<u64> = store
        .partition(Partition::UserSettings)
        .get("timeLimit")
        .unwrap();
    assert_eq!(value, Some(45));
}

#[test]
fn test_envelope_layout_on_disk() {
    let (dir, backend) = setup();
    let store = RecordStore::open(backend).unwrap();
    store
        .partition(Partition::ExamData)
        .put(&Record::new("examMeta", json!({"startedAt": "2024-01-01T00:00:00Z"})))
        .unwrap();

    let raw = fs::read_to_string(dir.path().join("store").join("examData.json")).unwrap();
    let on_disk: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(on_disk["examMeta"]["id"], "examMeta");
    assert_eq!(on_disk["examMeta"]["data"]["startedAt"], "2024-01-01T00:00:00Z");
}

#[test]
fn test_atomic_write_leaves_no_tmp_files() {
    let (dir, backend) = setup();
    let store = RecordStore::open(backend).unwrap();
    for i in 0..5 {
        store
            .partition(Partition::ExamResults)
            .put(&Record::new(format!("r{}", i), i))
            .unwrap();
    }

    for entry in fs::read_dir(dir.path().join("store")).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(!name.ends_with(".tmp"), "Found leftover tmp file: {}", name);
    }
}

#[test]
fn test_upgrade_from_v1_keeps_records() {
    let (dir, _) = setup();
    let root = dir.path().join("store");
    fs::create_dir_all(&root).unwrap();
    fs::write(
        root.join("schema.json"),
        r#"{"version": 1, "partitions": ["userSettings", "examData", "examResults"]}"#,
    )
    .unwrap();
    fs::write(
        root.join("userSettings.json"),
        r#"{"darkMode": {"id": "darkMode", "value": true}}"#,
    )
    .unwrap();
    fs::write(root.join("examData.json"), "{}").unwrap();
    fs::write(root.join("examResults.json"), "{}").unwrap();

    let store = RecordStore::open(FsBackend::new(root.clone())).unwrap();

    assert_eq!(store.version(), SCHEMA_VERSION);
    assert!(root.join("images.json").is_file());
    let dark: Option<bool> = store
        .partition(Partition::UserSettings)
        .get("darkMode")
        .unwrap();
    assert_eq!(dark, Some(true));
}

#[test]
fn test_newer_schema_is_refused() {
    let (dir, _) = setup();
    let root = dir.path().join("store");
    fs::create_dir_all(&root).unwrap();
    fs::write(
        root.join("schema.json"),
        format!(r#"{{"version": {}, "partitions": []}}"#, SCHEMA_VERSION + 1),
    )
    .unwrap();

    let err = RecordStore::open(FsBackend::new(root)).err().unwrap();
    assert!(matches!(err, ExamError::StoreUnavailable(_)));
}

#[test]
fn test_root_that_is_a_file_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("not-a-dir");
    fs::write(&file, "x").unwrap();

    let backend = FsBackend::new(file);
    assert!(matches!(
        backend.probe().unwrap_err(),
        ExamError::StoreUnavailable(_)
    ));
}

#[test]
fn test_fallback_when_root_unusable() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("not-a-dir");
    fs::write(&file, "x").unwrap();

    let backend: Box<dyn StorageBackend> = Box::new(FsBackend::new(file));
    let data = DataManager::open_with_fallback(backend).unwrap();

    assert!(data.is_volatile());
    assert!(data.set_user_setting("darkMode", &true));
    assert!(data.get_user_setting("darkMode", false));
}

#[test]
fn test_corrupt_partition_reads_as_default() {
    let (dir, backend) = setup();
    let data = DataManager::open(backend).unwrap();
    assert!(data.set_user_setting("timeLimit", &30));

    fs::write(dir.path().join("store").join("userSettings.json"), "{not json").unwrap();

    assert_eq!(data.get_user_setting("timeLimit", 60), 60);
}
