use std::path::Path;

use tempfile::TempDir;

use super::*;

#[test]
fn pdf_extension_is_case_insensitive() {
    assert!(is_pdf_path(Path::new("manual.pdf")));
    assert!(is_pdf_path(Path::new("/docs/REPORT.PDF")));
    assert!(is_pdf_path(Path::new("mixed.Pdf")));
    assert!(!is_pdf_path(Path::new("notes.txt")));
    assert!(!is_pdf_path(Path::new("pdf")));
    assert!(!is_pdf_path(Path::new("archive.pdf.zip")));
}

#[test]
fn non_pdf_path_is_rejected() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("notes.txt");
    std::fs::write(&path, "plain text").expect("should write file");

    let err = extract_text(&path).expect_err("should reject non-pdf");
    assert!(matches!(err, RagError::Pdf(ref msg) if msg.contains("Not a PDF")));
}

#[test]
fn missing_pdf_is_rejected() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let err = extract_text(&temp_dir.path().join("missing.pdf")).expect_err("should fail");
    assert!(matches!(err, RagError::Pdf(ref msg) if msg.contains("not found")));
}

#[test]
fn unparseable_pdf_is_reported() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("broken.pdf");
    std::fs::write(&path, b"this is not a pdf").expect("should write file");

    assert!(matches!(extract_text(&path), Err(RagError::Pdf(_))));
}
