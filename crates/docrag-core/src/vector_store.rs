//! Vector store trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{EmbeddingRow, Result};

/// A stored row together with its similarity to the query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRow {
    pub row: EmbeddingRow,
    pub score: f32,
}

/// Search result from vector store, best match first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub rows: Vec<ScoredRow>,
    /// Number of rows that were scored
    pub scanned: usize,
}

/// Configuration for vector search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub top_k: usize,
    pub score_threshold: Option<f32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            score_threshold: None,
        }
    }
}

/// Trait for embedding tables
///
/// A store holds rows of a single embedding dimension and answers
/// nearest-neighbour queries by cosine similarity.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append rows; either all rows are stored or none are
    async fn insert(&self, rows: Vec<EmbeddingRow>) -> Result<usize>;

    /// Search using a query embedding
    async fn search_by_vector(&self, vector: &[f32], config: &SearchConfig) -> Result<SearchResult>;

    /// Snapshot of every stored row in insertion order
    async fn rows(&self) -> Result<Vec<EmbeddingRow>>;

    /// Get the total number of rows
    async fn count(&self) -> Result<usize>;

    /// Remove all rows
    async fn clear(&self) -> Result<()>;

    /// Dimension shared by the stored rows, `None` while empty
    async fn dimension(&self) -> Result<Option<usize>>;

    /// Embedding model that produced the stored vectors, when the store records it
    fn model_id(&self) -> Option<&str> {
        None
    }
}
