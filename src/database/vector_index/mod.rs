
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow};
use arrow::array::{Array, FixedSizeListArray, Float32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::RagError;
use crate::documents::ChunkRecord;
use crate::embeddings::Embedder;

/// Row marker for "no hit", as reported by flat ANN searches that return
/// fewer than `k` candidates
const NO_HIT: i64 = -1;

/// Exhaustive inner-product index over row-major vectors
#[derive(Debug, Clone, PartialEq)]
struct FlatIpIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIpIndex {
    fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    fn ntotal(&self) -> usize {
        self.data.len() / self.dimension
    }

    fn add(&mut self, vectors: &[Vec<f32>]) {
        self.data.reserve(vectors.len() * self.dimension);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
    }

    /// Top `k` rows by inner product, best first. When `k` exceeds the row
    /// count a single `NO_HIT` entry marks the end of the hits.
    fn search(&self, query: &[f32], k: usize) -> Vec<(f32, i64)> {
        let ntotal = self.ntotal();
        let mut hits: Vec<(f32, i64)> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(row, vector)| {
                let score = vector.iter().zip(query).map(|(a, b)| a * b).sum::<f32>();
                (score, row as i64)
            })
            .k_smallest_by(k.min(ntotal), |a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)))
            .collect();
        hits.resize(k.min(ntotal.saturating_add(1)), (f32::NEG_INFINITY, NO_HIT));
        hits
    }
}

/// Drop sentinel and out-of-range rows and repeated rows, keeping rank order
#[inline]
pub fn reconcile_hits(hits: &[(f32, i64)], metadata_len: usize) -> Vec<(usize, f32)> {
    hits.iter()
        .filter_map(|&(score, row)| {
            usize::try_from(row)
                .ok()
                .filter(|&row| row < metadata_len)
                .map(|row| (row, score))
        })
        .unique_by(|&(row, _)| row)
        .collect()
}

/// A record returned by similarity search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub record: ChunkRecord,
    /// Inner product between the query and the stored vector
    pub similarity_score: f32,
}

/// Vector index holding embeddings and the chunk records they were computed
/// from, aligned by row.
///
/// Both halves are rewritten to disk after every batch. They are written one
/// after the other with no transaction between them.
pub struct VectorIndex {
    index_path: PathBuf,
    metadata_path: PathBuf,
    flat: FlatIpIndex,
    metadata: Vec<ChunkRecord>,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("index_path", &self.index_path)
            .field("metadata_path", &self.metadata_path)
            .field("dimension", &self.flat.dimension)
            .field("len", &self.metadata.len())
            .finish_non_exhaustive()
    }
}

impl VectorIndex {
    /// Load the persisted index pair, or start empty.
    ///
    /// The pair is only loaded when both files exist. A blob or metadata file
    /// that fails to parse, disagrees on row count, or stores vectors of a
    /// different dimension is logged and replaced by an empty index. The
    /// stale files stay on disk until the next save.
    #[inline]
    pub fn load_or_create<P: AsRef<Path>, Q: AsRef<Path>>(
        index_path: P,
        metadata_path: Q,
        dimension: usize,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, RagError> {
        if dimension == 0 {
            return Err(RagError::Index(
                "Vector dimension must be positive".to_string(),
            ));
        }

        let mut index = Self {
            index_path: index_path.as_ref().to_path_buf(),
            metadata_path: metadata_path.as_ref().to_path_buf(),
            flat: FlatIpIndex::new(dimension),
            metadata: Vec::new(),
            embedder,
        };

        if index.index_path.exists() && index.metadata_path.exists() {
            match index.load() {
                Ok((flat, metadata)) => {
                    index.flat = flat;
                    index.metadata = metadata;
                    info!("Loaded existing index with {} vectors", index.len());
                }
                Err(e) => {
                    warn!("Failed to load existing index, creating new index: {:#}", e);
                }
            }
        } else {
            info!("Created new vector index with dimension {}", dimension);
        }

        Ok(index)
    }

    fn load(&self) -> anyhow::Result<(FlatIpIndex, Vec<ChunkRecord>)> {
        let flat = read_vectors(&self.index_path, self.flat.dimension)?;
        let metadata = read_metadata(&self.metadata_path)?;

        if flat.ntotal() != metadata.len() {
            return Err(anyhow!(
                "Index holds {} vectors but metadata holds {} records",
                flat.ntotal(),
                metadata.len()
            ));
        }

        Ok((flat, metadata))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flat.ntotal() == 0 || self.metadata.is_empty()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.flat.dimension
    }

    /// Indexed records in row order
    #[inline]
    pub fn records(&self) -> &[ChunkRecord] {
        &self.metadata
    }

    /// Embed and append records, then persist both files.
    ///
    /// The embedding response is checked before anything is appended. If
    /// persisting fails, the appended rows remain in memory.
    #[inline]
    pub fn add_documents(&mut self, records: &[ChunkRecord]) -> Result<usize, RagError> {
        if records.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
        let embeddings = self
            .embedder
            .embed(&texts)
            .map_err(|e| RagError::Embedding(format!("{:#}", e)))?;

        if embeddings.len() != records.len() {
            return Err(RagError::Embedding(format!(
                "Expected {} embeddings, provider returned {}",
                records.len(),
                embeddings.len()
            )));
        }
        if let Some(bad) = embeddings.iter().find(|v| v.len() != self.flat.dimension) {
            return Err(RagError::Embedding(format!(
                "Embedding has {} dimensions, index expects {}",
                bad.len(),
                self.flat.dimension
            )));
        }

        self.flat.add(&embeddings);
        self.metadata.extend_from_slice(records);
        self.persist()?;

        info!("Added {} documents to index", records.len());
        Ok(records.len())
    }

    /// Return up to `k` distinct records most similar to `query`, best first
    #[inline]
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>, RagError> {
        if self.is_empty() || k == 0 {
            debug!("No documents in index, skipping search");
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed(&[query.to_string()])
            .map_err(|e| RagError::Embedding(format!("{:#}", e)))?
            .pop()
            .ok_or_else(|| RagError::Embedding("Provider returned no query embedding".to_string()))?;

        if query_vector.len() != self.flat.dimension {
            return Err(RagError::Embedding(format!(
                "Query embedding has {} dimensions, index expects {}",
                query_vector.len(),
                self.flat.dimension
            )));
        }

        let hits = self.flat.search(&query_vector, k);
        let results: Vec<SearchResult> = reconcile_hits(&hits, self.metadata.len())
            .into_iter()
            .map(|(row, similarity_score)| SearchResult {
                record: self.metadata[row].clone(),
                similarity_score,
            })
            .collect();

        debug!("Found {} results for query", results.len());
        Ok(results)
    }

    fn persist(&self) -> Result<(), RagError> {
        for path in [&self.index_path, &self.metadata_path] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    RagError::Index(format!(
                        "Failed to create index directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        write_vectors(&self.index_path, &self.flat)
            .map_err(|e| RagError::Index(format!("Failed to save index: {:#}", e)))?;
        write_metadata(&self.metadata_path, &self.metadata)
            .map_err(|e| RagError::Index(format!("Failed to save index metadata: {:#}", e)))?;

        debug!("Index saved: {} vectors", self.flat.ntotal());
        Ok(())
    }
}

fn vector_field() -> Arc<Field> {
    Arc::new(Field::new("item", DataType::Float32, false))
}

fn vector_schema(dimension: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![Field::new(
        "vector",
        DataType::FixedSizeList(vector_field(), dimension),
        false,
    )]))
}

fn write_vectors(path: &Path, flat: &FlatIpIndex) -> anyhow::Result<()> {
    let dimension = i32::try_from(flat.dimension).context("Vector dimension too large")?;
    let schema = vector_schema(dimension);

    let values = Float32Array::from(flat.data.clone());
    let vectors = FixedSizeListArray::try_new(vector_field(), dimension, Arc::new(values), None)
        .context("Failed to create vector array")?;
    let batch = RecordBatch::try_new(Arc::clone(&schema), vec![Arc::new(vectors)])
        .context("Failed to create record batch")?;

    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = FileWriter::try_new(file, &schema)?;
    writer.write(&batch)?;
    writer.finish()?;
    Ok(())
}

fn read_vectors(path: &Path, dimension: usize) -> anyhow::Result<FlatIpIndex> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = FileReader::try_new(file, None).context("Failed to read index blob")?;

    let mut flat = FlatIpIndex::new(dimension);
    for batch in reader {
        let batch = batch.context("Failed to read index batch")?;
        let vectors = batch
            .column_by_name("vector")
            .ok_or_else(|| anyhow!("Missing vector column"))?
            .as_any()
            .downcast_ref::<FixedSizeListArray>()
            .ok_or_else(|| anyhow!("Invalid vector column type"))?;

        let stored_dimension = usize::try_from(vectors.value_length())?;
        if stored_dimension != dimension {
            return Err(anyhow!(
                "Stored vectors have {} dimensions, expected {}",
                stored_dimension,
                dimension
            ));
        }

        let values = vectors
            .values()
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| anyhow!("Invalid vector value type"))?;
        let start = vectors.offset() * dimension;
        let end = start + vectors.len() * dimension;
        if values.len() < end {
            return Err(anyhow!("Truncated vector column"));
        }
        flat.data.extend_from_slice(&values.values()[start..end]);
    }

    Ok(flat)
}

fn read_metadata(path: &Path) -> anyhow::Result<Vec<ChunkRecord>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(line_no, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Malformed metadata on line {}", line_no + 1))
        })
        .collect()
}

fn write_metadata(path: &Path, metadata: &[ChunkRecord]) -> anyhow::Result<()> {
    let mut content = String::new();
    for record in metadata {
        content.push_str(&serde_json::to_string(record)?);
        content.push('\n');
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
