use super::*;

fn numbered_text(len: usize) -> String {
    (0..len)
        .map(|i| char::from(b'a' + (i % 26) as u8))
        .collect()
}

#[test]
fn default_config() {
    let config = ChunkingConfig::default();
    assert_eq!(config.chunk_size, 800);
    assert_eq!(config.overlap, 100);
    assert_eq!(config.stride(), Ok(700));
}

#[test]
fn window_offsets_for_default_config() {
    let text = numbered_text(1700);
    let config = ChunkingConfig::default();

    let windows = chunk_text(&text, &config).expect("chunk_text should succeed");

    let starts: Vec<usize> = windows.iter().map(|w| w.start).collect();
    assert_eq!(starts, vec![0, 700, 1400]);
    assert_eq!(windows[0].text.chars().count(), 800);
    assert_eq!(windows[1].text.chars().count(), 800);
    assert_eq!(windows[2].text.chars().count(), 300);
}

#[test]
fn windows_cover_source_text() {
    let text = numbered_text(2345);
    let config = ChunkingConfig {
        chunk_size: 500,
        overlap: 120,
    };

    let windows = chunk_text(&text, &config).expect("chunk_text should succeed");
    let chars: Vec<char> = text.chars().collect();

    for window in &windows {
        let len = window.text.chars().count();
        assert!(len <= config.chunk_size);
        assert!(window.start + len <= chars.len());
        let expected: String = chars[window.start..window.start + len].iter().collect();
        assert_eq!(window.text, expected);
    }

    for pair in windows.windows(2) {
        assert_eq!(pair[1].start - pair[0].start, 380);
    }

    let last = windows.last().expect("should have windows");
    assert_eq!(last.start + last.text.chars().count(), chars.len());
}

#[test]
fn multibyte_characters_are_counted_once() {
    let text = "é".repeat(10);
    let config = ChunkingConfig {
        chunk_size: 4,
        overlap: 1,
    };

    let windows = chunk_text(&text, &config).expect("chunk_text should succeed");

    let starts: Vec<usize> = windows.iter().map(|w| w.start).collect();
    assert_eq!(starts, vec![0, 3, 6, 9]);
    assert_eq!(windows[0].text, "éééé");
    assert_eq!(windows[3].text, "é");
}

#[test]
fn stops_at_whitespace_window() {
    let text = format!("{}{}", "x".repeat(10), " ".repeat(20));
    let config = ChunkingConfig {
        chunk_size: 10,
        overlap: 0,
    };

    let windows = chunk_text(&text, &config).expect("chunk_text should succeed");

    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].text, "x".repeat(10));
}

#[test]
fn empty_text_has_no_windows() {
    let windows =
        chunk_text("", &ChunkingConfig::default()).expect("chunk_text should succeed");
    assert!(windows.is_empty());

    let windows =
        chunk_text("   \n\t ", &ChunkingConfig::default()).expect("chunk_text should succeed");
    assert!(windows.is_empty());
}

#[test]
fn rejects_non_advancing_window() {
    let config = ChunkingConfig {
        chunk_size: 100,
        overlap: 100,
    };
    assert_eq!(
        chunk_text("text", &config),
        Err(ChunkingError::InvalidWindow {
            chunk_size: 100,
            overlap: 100
        })
    );

    let config = ChunkingConfig {
        chunk_size: 0,
        overlap: 0,
    };
    assert!(chunk_text("text", &config).is_err());
}

#[test]
fn document_records_share_document_id() {
    let text = numbered_text(1700);
    let (document_id, records) = chunk_document(
        &text,
        Path::new("/tmp/uploads/report.pdf"),
        &ChunkingConfig::default(),
    )
    .expect("chunk_document should succeed");

    assert_eq!(records.len(), 3);
    for (seq, record) in records.iter().enumerate() {
        assert_eq!(record.id, format!("{}_{}", document_id, seq));
        assert_eq!(record.source, "report.pdf");
        assert_eq!(record.page, None);
    }
}

#[test]
fn source_name_strips_directories() {
    assert_eq!(source_name(Path::new("a/b/c.pdf")), "c.pdf");
    assert_eq!(source_name(Path::new("plain.pdf")), "plain.pdf");
}
