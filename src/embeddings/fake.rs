// Deterministic providers for hermetic tests

use std::sync::Mutex;

use super::{Embedder, Generator};

/// Hashes words into buckets and normalizes, so texts sharing words score higher
pub(crate) struct HashEmbedder {
    pub dimension: usize,
}

impl HashEmbedder {
    pub(crate) fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub(crate) fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension];
        for word in text.split_whitespace() {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(7_usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize))
                % self.dimension;
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}

/// Always fails, for exercising provider error paths
pub(crate) struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn embed(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Err(anyhow::anyhow!("embedding provider unavailable"))
    }
}

/// Returns a canned answer and remembers every prompt it was given
#[derive(Default)]
pub(crate) struct RecordingGenerator {
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub(crate) fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().ok().and_then(|p| p.last().cloned())
    }
}

impl Generator for RecordingGenerator {
    fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        Ok("generated answer".to_string())
    }
}

/// Always fails, for exercising generation error paths
pub(crate) struct FailingGenerator;

impl Generator for FailingGenerator {
    fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        Err(anyhow::anyhow!("generation provider unavailable"))
    }
}
