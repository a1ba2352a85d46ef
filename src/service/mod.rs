
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::RagError;
use crate::config::Config;
use crate::database::VectorIndex;
use crate::documents::RecordStore;
use crate::embeddings::{Embedder, Generator, OllamaClient};
use crate::indexer::{self, ConsistencyReport, IngestReport};
use crate::retriever::Retriever;

/// Per-source chunk counts of the record store
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentSummary {
    pub total_chunks: usize,
    pub sources: BTreeMap<String, usize>,
}

impl fmt::Display for DocumentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total_chunks == 0 {
            return write!(f, "📝 No documents loaded");
        }
        writeln!(f, "📚 Loaded documents: {} chunks", self.total_chunks)?;
        for (source, count) in &self.sources {
            write!(f, "\n• {}: {} chunks", source, count)?;
        }
        Ok(())
    }
}

/// Owns both stores and the providers; every front end goes through one instance
pub struct RagService {
    config: Config,
    records: RecordStore,
    index: VectorIndex,
    retriever: Retriever,
}

impl fmt::Debug for RagService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RagService")
            .field("base_dir", &self.config.get_base_dir())
            .field("records", &self.records.len())
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl RagService {
    /// Load both stores from the configured data directory
    #[inline]
    pub fn open(
        config: Config,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self, RagError> {
        let records = RecordStore::open(config.documents_path());
        let dimension = usize::try_from(config.ollama.embedding_dimension)
            .map_err(|e| RagError::Config(e.to_string()))?;
        let index = VectorIndex::load_or_create(
            config.index_path(),
            config.index_metadata_path(),
            dimension,
            embedder,
        )?;

        let service = Self {
            config,
            records,
            index,
            retriever: Retriever::new(generator),
        };

        let report = service.consistency();
        if !report.is_consistent {
            warn!("Record store and vector index diverge: {}", report.summary());
        }

        info!(
            "RAG service ready: {} records, {} indexed chunks",
            service.records.len(),
            service.index.len()
        );
        Ok(service)
    }

    /// Open with an Ollama client serving both embeddings and answers
    #[inline]
    pub fn from_config(config: Config) -> Result<Self, RagError> {
        let client = Arc::new(
            OllamaClient::new(&config.ollama).context("Failed to initialize Ollama client")?,
        );
        let embedder: Arc<dyn Embedder> = Arc::<OllamaClient>::clone(&client);
        Self::open(config, embedder, client)
    }

    /// Ingest a PDF file
    #[inline]
    pub fn upload_pdf(&mut self, path: &Path) -> Result<IngestReport, RagError> {
        indexer::ingest_pdf(
            path,
            &self.config.chunking,
            &mut self.index,
            &mut self.records,
        )
    }

    /// Ingest already-extracted text under a source name
    #[inline]
    pub fn ingest_text(&mut self, text: &str, source: &str) -> Result<IngestReport, RagError> {
        indexer::ingest_text(
            text,
            source,
            &self.config.chunking,
            &mut self.index,
            &mut self.records,
        )
    }

    /// Answer a single message; no history is kept between calls
    #[inline]
    pub fn chat(&self, message: &str) -> Result<String, RagError> {
        self.retriever.answer(&self.index, message)
    }

    #[inline]
    pub fn documents_summary(&self) -> DocumentSummary {
        DocumentSummary {
            total_chunks: self.records.len(),
            sources: self.records.count_by_source(),
        }
    }

    #[inline]
    pub fn consistency(&self) -> ConsistencyReport {
        indexer::check(&self.records, &self.index)
    }

    #[inline]
    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Direct record store access. Edits here are not reflected in the index.
    #[inline]
    pub fn records_mut(&mut self) -> &mut RecordStore {
        &mut self.records
    }

    #[inline]
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Status line shown after a successful upload
#[inline]
pub fn upload_success_message(source: &str) -> String {
    format!("✅ PDF '{}' uploaded and processed successfully!", source)
}

/// Status line shown after a failed upload
#[inline]
pub fn upload_error_message(error: &RagError) -> String {
    format!("❌ Error during upload: {}", error)
}
