// Embeddings module
// Chunking of extracted text and the providers that embed and answer

pub mod chunking;
#[cfg(test)]
pub(crate) mod fake;
pub mod ollama;

pub use chunking::{ChunkingConfig, ChunkingError, TextWindow, chunk_document, chunk_text};
pub use ollama::OllamaClient;

/// Turns texts into fixed-dimensionality vectors.
///
/// Implementations must return exactly one vector per input, in input order.
/// Inner-product search assumes the vectors are normalized.
pub trait Embedder: Send + Sync {
    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Produces a text completion for a single prompt
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
