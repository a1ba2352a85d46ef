use super::*;

#[test]
fn record_serializes_with_null_page() {
    let record = ChunkRecord::new("manual.pdf", "Some text").with_id("doc_0");

    let json = serde_json::to_string(&record).expect("can serialize json");
    assert_eq!(
        json,
        r#"{"id":"doc_0","source":"manual.pdf","page":null,"text":"Some text"}"#
    );
}

#[test]
fn record_without_id_parses() {
    let record: ChunkRecord =
        serde_json::from_str(r#"{"source":"a.pdf","text":"hello"}"#).expect("can parse json");

    assert!(!record.has_id());
    assert_eq!(record.page, None);
    assert_eq!(record.text, "hello");
}
