// Indexer module
// Turns extracted document text into chunks held by both the vector index and the record store

pub mod consistency;


use std::path::Path;

use tracing::{info, warn};

use crate::RagError;
use crate::database::VectorIndex;
use crate::documents::RecordStore;
use crate::embeddings::chunking::{ChunkingConfig, chunk_document, source_name};
use crate::pdf;

pub use consistency::{ConsistencyReport, SourceConsistencyIssue, check};

/// Outcome of ingesting one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Identifier shared by every chunk of the document
    pub document_id: String,
    /// Base name of the ingested file
    pub source: String,
    /// Number of chunks written to each store
    pub chunks: usize,
}

/// Chunk `text` and write the chunks to the vector index, then to the record store.
///
/// Text that produces no chunks writes nothing. If the index write fails the
/// record store is left untouched. If the record store write fails after the
/// index succeeded, the two diverge until the next consistency check reports it.
#[inline]
pub fn ingest_text(
    text: &str,
    source: &str,
    chunking: &ChunkingConfig,
    index: &mut VectorIndex,
    records: &mut RecordStore,
) -> Result<IngestReport, RagError> {
    let (document_id, chunks) = chunk_document(text, Path::new(source), chunking)?;
    let source = source_name(Path::new(source));

    if chunks.is_empty() {
        warn!("No text to index in '{}'", source);
        return Ok(IngestReport {
            document_id,
            source,
            chunks: 0,
        });
    }

    index.add_documents(&chunks)?;
    let ids = records.add_batch(chunks)?;

    info!(
        "Indexed '{}' as document {} ({} chunks)",
        source,
        document_id,
        ids.len()
    );

    Ok(IngestReport {
        document_id,
        source,
        chunks: ids.len(),
    })
}

/// Extract a PDF's text and ingest it under the file's base name
#[inline]
pub fn ingest_pdf(
    path: &Path,
    chunking: &ChunkingConfig,
    index: &mut VectorIndex,
    records: &mut RecordStore,
) -> Result<IngestReport, RagError> {
    let text = pdf::extract_text(path)?;
    let source = source_name(path);
    ingest_text(&text, &source, chunking, index, records)
}
