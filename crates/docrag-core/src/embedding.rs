//! Embedding provider trait

use async_trait::async_trait;

use crate::{Error, Result};

/// Trait for text embedding services (e.g., the OpenAI embeddings endpoint)
///
/// Implementations perform a single request per call. Retrying is left to the
/// caller so that batch-level and query-level policies can differ.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, returning one vector per input in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::Embedding("Empty embedding response for query".to_string()))
    }

    /// Get the embedding model identifier
    fn model_id(&self) -> &str;
}
