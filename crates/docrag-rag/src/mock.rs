//! Deterministic embedder used by the unit tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use docrag_core::{EmbeddingProvider, Error, Result};

const VOCABULARY: [&str; 6] = ["job", "order", "invoice", "customer", "close", "release"];

/// Embeds text as keyword counts over a small vocabulary plus a constant bias
/// component, so no vector is ever all zeros.
#[derive(Default)]
pub struct KeywordEmbedder {
    /// Number of upcoming calls that fail with a network error
    pub fail_calls: AtomicUsize,
    /// Any batch containing this marker fails on every attempt
    pub poison: Option<String>,
    /// Drop the last vector of every response
    pub short_response: bool,
    pub calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(calls: usize) -> Self {
        Self {
            fail_calls: AtomicUsize::new(calls),
            ..Self::default()
        }
    }

    pub fn poisoned(marker: &str) -> Self {
        Self {
            poison: Some(marker.to_string()),
            ..Self::default()
        }
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = VOCABULARY
            .iter()
            .map(|word| lower.matches(word).count() as f32)
            .collect();
        vector.push(0.1);
        vector
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let remaining = self.fail_calls.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_calls.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::Network("connection reset".to_string()));
        }

        if let Some(marker) = &self.poison {
            if texts.iter().any(|t| t.contains(marker.as_str())) {
                return Err(Error::Embedding(format!("rejected input {}", marker)));
            }
        }

        let mut vectors: Vec<Vec<f32>> = texts.iter().map(|t| Self::vector(t)).collect();
        if self.short_response {
            vectors.pop();
        }
        Ok(vectors)
    }

    fn model_id(&self) -> &str {
        "keyword-test"
    }
}
