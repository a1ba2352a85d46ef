// Document records shared by the record store and the vector index

#[cfg(test)]
mod tests;

pub mod record_store;

use serde::{Deserialize, Serialize};

pub use record_store::{RecordStore, RecordStoreError};

/// A chunk of extracted document text, stored as an independently retrievable unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique identifier. Empty means "not yet assigned".
    #[serde(default)]
    pub id: String,
    /// File name the chunk was extracted from (basename only)
    pub source: String,
    /// Page number, reserved and currently always `None`
    #[serde(default)]
    pub page: Option<u32>,
    /// The chunk text
    pub text: String,
}

impl ChunkRecord {
    /// Create a record without an identifier; one is assigned when it is stored
    #[inline]
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            source: source.into(),
            page: None,
            text: text.into(),
        }
    }

    #[inline]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[inline]
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }
}
