use std::sync::Arc;

use tempfile::TempDir;

use super::*;
use crate::embeddings::fake::HashEmbedder;

fn stores(temp_dir: &TempDir) -> (RecordStore, VectorIndex) {
    let records = RecordStore::open(temp_dir.path().join("documents.jsonl"));
    let index = VectorIndex::load_or_create(
        temp_dir.path().join("vectors.arrow"),
        temp_dir.path().join("metadata.jsonl"),
        32,
        Arc::new(HashEmbedder::new(32)),
    )
    .expect("should create index");
    (records, index)
}

fn chunk(id: &str, source: &str, text: &str) -> ChunkRecord {
    ChunkRecord::new(source, text).with_id(id)
}

#[test]
fn consistency_report_creation() {
    let report = ConsistencyReport {
        stored_records: 100,
        indexed_vectors: 95,
        missing_in_index: vec!["doc_1".to_string(), "doc_2".to_string()],
        is_consistent: false,
        ..ConsistencyReport::default()
    };

    assert_eq!(report.total_issues(), 2);
    assert!(report.summary().contains("inconsistencies found"));
}

#[test]
fn consistency_report_summary_formats_correctly() {
    let report = ConsistencyReport {
        stored_records: 150,
        indexed_vectors: 140,
        missing_in_index: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        orphaned_in_index: vec!["orphan".to_string()],
        inconsistent_sources: vec![SourceConsistencyIssue {
            source: "manual.pdf".to_string(),
            stored_records: 10,
            indexed_vectors: 8,
        }],
        is_consistent: false,
        ..ConsistencyReport::default()
    };

    let summary = report.summary();
    assert!(summary.contains("3 missing in index"));
    assert!(summary.contains("1 orphaned in index"));
    assert!(summary.contains("1 sources with issues"));
}

#[test]
fn empty_stores_are_consistent() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let (records, index) = stores(&temp_dir);

    let report = check(&records, &index);

    assert!(report.is_consistent);
    assert_eq!(report.total_issues(), 0);
    assert!(report.summary().contains("Stores are consistent"));
}

#[test]
fn matching_stores_are_consistent() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let (mut records, mut index) = stores(&temp_dir);
    let chunks = vec![
        chunk("d_0", "a.pdf", "first chunk"),
        chunk("d_1", "a.pdf", "second chunk"),
    ];
    index.add_documents(&chunks).expect("should index");
    records.add_batch(chunks).expect("should store");

    let report = check(&records, &index);

    assert!(report.is_consistent);
    assert_eq!(report.stored_records, 2);
    assert_eq!(report.indexed_vectors, 2);
}

#[test]
fn flags_missing_and_orphaned_records() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let (mut records, mut index) = stores(&temp_dir);
    index
        .add_documents(&[chunk("indexed_only", "a.pdf", "vector without record")])
        .expect("should index");
    records
        .add(chunk("stored_only", "b.pdf", "record without vector"))
        .expect("should store");

    let report = check(&records, &index);

    assert!(!report.is_consistent);
    assert_eq!(report.missing_in_index, vec!["stored_only".to_string()]);
    assert_eq!(report.orphaned_in_index, vec!["indexed_only".to_string()]);
    assert_eq!(report.inconsistent_sources.len(), 2);
    assert_eq!(report.total_issues(), 2);
}

#[test]
fn flags_duplicated_rows() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let (mut records, mut index) = stores(&temp_dir);
    let record = chunk("d_0", "a.pdf", "repeated chunk");
    index
        .add_documents(&[record.clone(), record.clone()])
        .expect("should index");
    records.add(record).expect("should store");

    let report = check(&records, &index);

    assert!(!report.is_consistent);
    assert_eq!(report.duplicated_in_index, vec!["d_0".to_string()]);
    assert!(report.missing_in_index.is_empty());
}

#[test]
fn flags_records_edited_after_indexing() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let (mut records, mut index) = stores(&temp_dir);
    let record = chunk("d_0", "a.pdf", "original text");
    index
        .add_documents(std::slice::from_ref(&record))
        .expect("should index");
    records.add(record).expect("should store");
    records.update("d_0", "edited text").expect("should update");

    let report = check(&records, &index);

    assert!(!report.is_consistent);
    assert_eq!(report.stale_in_index, vec!["d_0".to_string()]);
}

#[test]
fn deleted_record_leaves_orphan() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let (mut records, mut index) = stores(&temp_dir);
    let chunks = vec![
        chunk("d_0", "a.pdf", "kept"),
        chunk("d_1", "a.pdf", "deleted"),
    ];
    index.add_documents(&chunks).expect("should index");
    records.add_batch(chunks).expect("should store");
    records.delete("d_1").expect("should delete");

    let report = check(&records, &index);

    assert_eq!(report.orphaned_in_index, vec!["d_1".to_string()]);
    assert_eq!(
        report.inconsistent_sources,
        vec![SourceConsistencyIssue {
            source: "a.pdf".to_string(),
            stored_records: 1,
            indexed_vectors: 2,
        }]
    );
}
