use super::*;
use tempfile::TempDir;

fn create_test_store() -> (RecordStore, TempDir) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store = RecordStore::open(temp_dir.path().join("data").join("documents.jsonl"));
    (store, temp_dir)
}

#[test]
fn open_missing_file_is_empty() {
    let (store, _temp_dir) = create_test_store();

    assert!(store.is_empty());
    assert!(store.list().is_empty());
    assert!(!store.path().exists());
}

#[test]
fn add_assigns_identifier() {
    let (mut store, _temp_dir) = create_test_store();
    let input = ChunkRecord::new("notes.pdf", "first chunk");

    let id = store.add(input.clone()).expect("add should succeed");

    assert!(!id.is_empty());
    let stored = store.get(&id).expect("record should exist");
    assert_eq!(stored, &input.with_id(id.clone()));
}

#[test]
fn add_keeps_existing_identifier_and_overwrites() {
    let (mut store, _temp_dir) = create_test_store();

    store
        .add(ChunkRecord::new("a.pdf", "old").with_id("fixed"))
        .expect("add should succeed");
    let id = store
        .add(ChunkRecord::new("a.pdf", "new").with_id("fixed"))
        .expect("add should succeed");

    assert_eq!(id, "fixed");
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("fixed").map(|r| r.text.as_str()), Some("new"));
}

#[test]
fn add_creates_data_directory() {
    let (mut store, _temp_dir) = create_test_store();

    store
        .add(ChunkRecord::new("a.pdf", "text"))
        .expect("add should succeed");

    assert!(store.path().exists());
}

#[test]
fn add_batch_persists_all_records() {
    let (mut store, temp_dir) = create_test_store();
    let records = vec![
        ChunkRecord::new("a.pdf", "one").with_id("doc_0"),
        ChunkRecord::new("a.pdf", "two").with_id("doc_1"),
        ChunkRecord::new("b.pdf", "three"),
    ];

    let ids = store.add_batch(records).expect("add_batch should succeed");
    assert_eq!(ids.len(), 3);
    assert_eq!(&ids[..2], ["doc_0", "doc_1"]);

    let content = std::fs::read_to_string(store.path()).expect("should read store file");
    assert_eq!(content.lines().count(), 3);

    let reopened = RecordStore::open(temp_dir.path().join("data").join("documents.jsonl"));
    assert_eq!(reopened.len(), 3);
    for id in &ids {
        assert_eq!(reopened.get(id), store.get(id));
    }
}

#[test]
fn update_existing_record() {
    let (mut store, _temp_dir) = create_test_store();
    let id = store
        .add(ChunkRecord::new("a.pdf", "before"))
        .expect("add should succeed");

    store.update(&id, "after").expect("update should succeed");

    assert_eq!(store.get(&id).map(|r| r.text.as_str()), Some("after"));
}

#[test]
fn update_missing_record_leaves_store_unchanged() {
    let (mut store, _temp_dir) = create_test_store();
    store
        .add(ChunkRecord::new("a.pdf", "kept").with_id("present"))
        .expect("add should succeed");
    let before: Vec<ChunkRecord> = store.list().into_iter().cloned().collect();

    let result = store.update("absent", "changed");

    assert!(matches!(result, Err(RecordStoreError::NotFound(id)) if id == "absent"));
    let after: Vec<ChunkRecord> = store.list().into_iter().cloned().collect();
    assert_eq!(before, after);
}

#[test]
fn delete_existing_record() {
    let (mut store, _temp_dir) = create_test_store();
    let id = store
        .add(ChunkRecord::new("a.pdf", "gone"))
        .expect("add should succeed");

    let removed = store.delete(&id).expect("delete should succeed");

    assert_eq!(removed.text, "gone");
    assert!(store.get(&id).is_none());
    assert!(store.is_empty());
}

#[test]
fn delete_missing_record_leaves_store_unchanged() {
    let (mut store, _temp_dir) = create_test_store();
    store
        .add(ChunkRecord::new("a.pdf", "kept"))
        .expect("add should succeed");

    let result = store.delete("absent");

    assert!(matches!(result, Err(RecordStoreError::NotFound(_))));
    assert_eq!(store.len(), 1);
}

#[test]
fn malformed_file_resets_to_empty() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("documents.jsonl");
    std::fs::write(
        &path,
        "{\"id\":\"ok\",\"source\":\"a.pdf\",\"page\":null,\"text\":\"fine\"}\nnot json\n",
    )
    .expect("should write store file");

    let store = RecordStore::open(&path);

    assert!(store.is_empty());
    // The stale file is left in place until the next save
    assert!(path.exists());
}

#[test]
fn blank_lines_are_ignored_on_load() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("documents.jsonl");
    std::fs::write(
        &path,
        "\n{\"id\":\"a\",\"source\":\"a.pdf\",\"page\":null,\"text\":\"x\"}\n\n",
    )
    .expect("should write store file");

    let store = RecordStore::open(&path);

    assert_eq!(store.len(), 1);
    assert!(store.contains("a"));
}

#[test]
fn save_failure_keeps_in_memory_mutation() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    // A directory where the store file should be makes every write fail
    let path = temp_dir.path().join("documents.jsonl");
    std::fs::create_dir_all(&path).expect("should create blocking directory");
    let mut store = RecordStore::open(&path);

    let result = store.add(ChunkRecord::new("a.pdf", "orphan").with_id("x"));

    assert!(matches!(result, Err(RecordStoreError::Persist { .. })));
    assert!(store.contains("x"));
}

#[test]
fn count_by_source_groups_chunks() {
    let (mut store, _temp_dir) = create_test_store();
    store
        .add_batch(vec![
            ChunkRecord::new("a.pdf", "1"),
            ChunkRecord::new("a.pdf", "2"),
            ChunkRecord::new("b.pdf", "3"),
        ])
        .expect("add_batch should succeed");

    let counts = store.count_by_source();

    assert_eq!(counts.get("a.pdf"), Some(&2));
    assert_eq!(counts.get("b.pdf"), Some(&1));
}
