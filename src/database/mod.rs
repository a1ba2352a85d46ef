// Database module
// Flat vector index persisted as an Arrow IPC blob plus aligned JSON-lines metadata

pub mod vector_index;

pub use vector_index::{SearchResult, VectorIndex};
