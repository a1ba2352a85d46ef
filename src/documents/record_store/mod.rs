#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::ChunkRecord;

#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Failed to write record store {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Key-value store of chunk records mirrored to a JSON-lines file.
///
/// Every mutation rewrites the whole file. A failed write leaves the
/// in-memory mutation in place, so memory and disk may diverge until the
/// next successful save.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    records: BTreeMap<String, ChunkRecord>,
}

impl RecordStore {
    /// Open the store at `path`, loading any existing records.
    ///
    /// A missing file yields an empty store. An unreadable or malformed file
    /// is logged and also yields an empty store.
    #[inline]
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let records = if path.exists() {
            match Self::load(&path) {
                Ok(records) => {
                    info!("Loaded {} records from {}", records.len(), path.display());
                    records
                }
                Err(e) => {
                    warn!(
                        "Failed to load record store {}, starting empty: {:#}",
                        path.display(),
                        e
                    );
                    BTreeMap::new()
                }
            }
        } else {
            debug!("No record store at {}, starting empty", path.display());
            BTreeMap::new()
        };

        Self { path, records }
    }

    fn load(path: &Path) -> anyhow::Result<BTreeMap<String, ChunkRecord>> {
        let content = fs::read_to_string(path)?;
        let mut records = BTreeMap::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: ChunkRecord = serde_json::from_str(line)
                .map_err(|e| anyhow::anyhow!("line {}: {}", line_no + 1, e))?;
            records.insert(record.id.clone(), record);
        }
        Ok(records)
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All stored records, in identifier order
    #[inline]
    pub fn list(&self) -> Vec<&ChunkRecord> {
        self.records.values().collect()
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<&ChunkRecord> {
        self.records.get(id)
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Insert or overwrite a record and persist. Returns the record's identifier,
    /// generating one when the record has none.
    #[inline]
    pub fn add(&mut self, record: ChunkRecord) -> Result<String, RecordStoreError> {
        let id = self.insert(record);
        self.save()?;
        Ok(id)
    }

    /// Insert or overwrite several records, persisting once at the end
    #[inline]
    pub fn add_batch(&mut self, records: Vec<ChunkRecord>) -> Result<Vec<String>, RecordStoreError> {
        let count = records.len();
        let ids = records
            .into_iter()
            .map(|record| self.insert(record))
            .collect();
        self.save()?;
        info!("Added {} records to the record store", count);
        Ok(ids)
    }

    /// Replace the text of an existing record
    #[inline]
    pub fn update(&mut self, id: &str, text: &str) -> Result<(), RecordStoreError> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| RecordStoreError::NotFound(id.to_string()))?;
        text.clone_into(&mut record.text);
        self.save()
    }

    /// Remove a record, returning it
    #[inline]
    pub fn delete(&mut self, id: &str) -> Result<ChunkRecord, RecordStoreError> {
        let removed = self
            .records
            .remove(id)
            .ok_or_else(|| RecordStoreError::NotFound(id.to_string()))?;
        self.save()?;
        Ok(removed)
    }

    /// Number of stored chunks per source file
    #[inline]
    pub fn count_by_source(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in self.records.values() {
            *counts.entry(record.source.clone()).or_insert(0) += 1;
        }
        counts
    }

    fn insert(&mut self, mut record: ChunkRecord) -> String {
        if !record.has_id() {
            record.id = Uuid::new_v4().to_string();
        }
        let id = record.id.clone();
        self.records.insert(id.clone(), record);
        id
    }

    fn save(&self) -> Result<(), RecordStoreError> {
        let persist_err = |source| RecordStoreError::Persist {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(persist_err)?;
        }

        let mut content = String::new();
        for record in self.records.values() {
            content.push_str(&serde_json::to_string(record)?);
            content.push('\n');
        }

        fs::write(&self.path, content).map_err(persist_err)?;
        debug!("Record store saved: {} records", self.records.len());
        Ok(())
    }
}
