
use std::sync::Arc;

use tracing::debug;

use crate::RagError;
use crate::database::VectorIndex;
use crate::embeddings::Generator;

/// Instruction preamble placed at the top of every prompt
pub const SYSTEM_PROMPT: &str = "You are an AI assistant for a document management system. \
Use the provided context to answer questions in a concise and accurate manner. \
If you don't find relevant information, clearly state that you don't have that information.";

/// Number of chunks pulled into the context of every answer
pub const RETRIEVAL_TOP_K: usize = 4;

/// Answers questions from retrieved chunks using a generation provider
#[derive(Clone)]
pub struct Retriever {
    generator: Arc<dyn Generator>,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever").finish_non_exhaustive()
    }
}

impl Retriever {
    #[inline]
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Assemble the grounding prompt; contexts are joined by blank lines in the given order
    #[inline]
    pub fn build_prompt(query: &str, contexts: &[&str]) -> String {
        let context = contexts.join("\n\n");
        format!("{SYSTEM_PROMPT}\n\nContext:\n{context}\n\nQuestion: {query}")
    }

    /// Retrieve context for `query` and return the provider's answer verbatim.
    ///
    /// An empty index still produces a call to the provider, with an empty context.
    #[inline]
    pub fn answer(&self, index: &VectorIndex, query: &str) -> Result<String, RagError> {
        let results = index.search(query, RETRIEVAL_TOP_K)?;
        let contexts: Vec<&str> = results.iter().map(|r| r.record.text.as_str()).collect();
        debug!("Answering with {} context chunks", contexts.len());

        let prompt = Self::build_prompt(query, &contexts);
        self.generator
            .generate(&prompt)
            .map_err(|e| RagError::Generation(format!("{:#}", e)))
    }
}
