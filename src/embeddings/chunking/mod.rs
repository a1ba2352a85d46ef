#[cfg(test)]
mod tests;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::documents::ChunkRecord;

/// Configuration for fixed-window chunking, measured in characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Width of each window
    pub chunk_size: usize,
    /// Characters shared by adjacent windows
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 800,
            overlap: 100,
        }
    }
}

impl ChunkingConfig {
    /// Distance between the starts of adjacent windows
    #[inline]
    pub fn stride(&self) -> Result<usize, ChunkingError> {
        if self.chunk_size == 0 || self.overlap >= self.chunk_size {
            return Err(ChunkingError::InvalidWindow {
                chunk_size: self.chunk_size,
                overlap: self.overlap,
            });
        }
        Ok(self.chunk_size - self.overlap)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    #[error(
        "Invalid chunk window: size {chunk_size}, overlap {overlap} (size must be positive and larger than overlap)"
    )]
    InvalidWindow { chunk_size: usize, overlap: usize },
}

/// A window of text cut from a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWindow {
    /// Character offset of the window within the source text
    pub start: usize,
    pub text: String,
}

/// Slide a fixed-width window across `text`.
///
/// Windows start at offset 0 and advance by `chunk_size - overlap`
/// characters. Chunking stops at the end of the text, or at the first
/// window that is empty or entirely whitespace.
#[inline]
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<TextWindow>, ChunkingError> {
    let stride = config.stride()?;

    // Byte offset of every character, plus the end of the string
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = boundaries.len() - 1;

    let mut windows = Vec::new();
    let mut start = 0;
    while start < char_count {
        let end = (start + config.chunk_size).min(char_count);
        let window = &text[boundaries[start]..boundaries[end]];
        if window.trim().is_empty() {
            break;
        }
        windows.push(TextWindow {
            start,
            text: window.to_string(),
        });
        start += stride;
    }

    Ok(windows)
}

/// Chunk a document's extracted text into records ready for indexing.
///
/// Every record shares a freshly generated document identifier and is
/// numbered in window order: `{document_id}_{seq}`.
#[inline]
pub fn chunk_document(
    text: &str,
    source_path: &Path,
    config: &ChunkingConfig,
) -> Result<(String, Vec<ChunkRecord>), ChunkingError> {
    let document_id = Uuid::new_v4().to_string();
    let source = source_name(source_path);

    let records: Vec<ChunkRecord> = chunk_text(text, config)?
        .into_iter()
        .enumerate()
        .map(|(seq, window)| ChunkRecord {
            id: format!("{}_{}", document_id, seq),
            source: source.clone(),
            page: None,
            text: window.text,
        })
        .collect();

    debug!(
        "Chunked '{}' into {} chunks (size {}, overlap {})",
        source,
        records.len(),
        config.chunk_size,
        config.overlap
    );

    Ok((document_id, records))
}

/// File name of a source path, without its directory
#[inline]
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy())
        .into_owned()
}
