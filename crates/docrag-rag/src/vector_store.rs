//! In-memory embedding table with JSON persistence

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

use docrag_core::{
    EmbeddingRow, Error, Result, ScoredRow, SearchConfig, SearchResult, VectorStore,
};

/// On-disk layout of a saved table
#[derive(Debug, Serialize, Deserialize)]
struct TableFile {
    embedding_model: String,
    dimension: Option<usize>,
    created_at: String,
    rows: Vec<EmbeddingRow>,
}

/// Ordered, in-memory table of embedded chunks
pub struct EmbeddingTable {
    rows: Arc<RwLock<Vec<EmbeddingRow>>>,
    embedding_model: String,
}

impl EmbeddingTable {
    /// Create an empty table for vectors produced by `embedding_model`
    pub fn new(embedding_model: impl Into<String>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
            embedding_model: embedding_model.into(),
        }
    }

    /// Model that produced the stored vectors
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Write the table to `path` as JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let rows = self.read()?.clone();
        let file = TableFile {
            embedding_model: self.embedding_model.clone(),
            dimension: rows.first().map(EmbeddingRow::dimension),
            created_at: chrono::Local::now().to_rfc3339(),
            rows,
        };

        let content = serde_json::to_string_pretty(&file)?;
        fs::write(path, content)?;
        info!("Saved {} row(s) to {:?}", file.rows.len(), path);
        Ok(())
    }

    /// Read a table written by [`EmbeddingTable::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let file: TableFile = serde_json::from_str(&content)?;

        let dimension = check_dimensions(None, &file.rows)?;
        if let (Some(recorded), Some(actual)) = (file.dimension, dimension) {
            if recorded != actual {
                return Err(Error::InvalidInput(format!(
                    "Table {:?} records dimension {} but its rows have {}",
                    path, recorded, actual
                )));
            }
        }

        debug!(
            "Loaded {} row(s) from {:?} (model {}, created {})",
            file.rows.len(),
            path,
            file.embedding_model,
            file.created_at
        );

        Ok(Self {
            rows: Arc::new(RwLock::new(file.rows)),
            embedding_model: file.embedding_model,
        })
    }

    /// Row count, distinct files, dimension and embedding model
    pub fn summary(&self) -> Result<serde_json::Value> {
        let rows = self.read()?;
        Ok(serde_json::json!({
            "dimension": rows.first().map(EmbeddingRow::dimension),
            "embedding_model": self.embedding_model,
            "files": distinct_files(&rows),
            "rows": rows.len(),
        }))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<EmbeddingRow>>> {
        self.rows
            .read()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<EmbeddingRow>>> {
        self.rows
            .write()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))
    }
}

/// `embeddings_<YYYY-MM-DD_HH-MM-SS>.json` inside `dir`, stamped with the local time
pub fn default_table_path(dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    dir.join(format!("embeddings_{}.json", stamp))
}

/// Number of distinct source files among `rows`.
///
/// Rows saved without a `source` are counted by their extension-less `file`.
pub fn distinct_files(rows: &[EmbeddingRow]) -> usize {
    rows.iter()
        .map(|row| {
            let name = if row.source.is_empty() { &row.file } else { &row.source };
            (row.folder.as_str(), name.as_str())
        })
        .collect::<BTreeSet<_>>()
        .len()
}

/// Cosine similarity, 0.0 when either vector has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Verify that `rows` share one non-zero dimension, matching `expected` when given
fn check_dimensions(expected: Option<usize>, rows: &[EmbeddingRow]) -> Result<Option<usize>> {
    let mut dimension = expected;

    for row in rows {
        if row.dimension() == 0 {
            return Err(Error::InvalidInput(format!("Row {} has an empty embedding", row.id)));
        }
        match dimension {
            Some(dim) if dim != row.dimension() => {
                return Err(Error::InvalidInput(format!(
                    "Row {} has dimension {}, table uses {}",
                    row.id,
                    row.dimension(),
                    dim
                )));
            }
            Some(_) => {}
            None => dimension = Some(row.dimension()),
        }
    }

    Ok(dimension)
}

#[async_trait]
impl VectorStore for EmbeddingTable {
    async fn insert(&self, rows: Vec<EmbeddingRow>) -> Result<usize> {
        let mut table = self.write()?;
        check_dimensions(table.first().map(EmbeddingRow::dimension), &rows)?;

        let added = rows.len();
        table.extend(rows);
        Ok(added)
    }

    async fn search_by_vector(&self, vector: &[f32], config: &SearchConfig) -> Result<SearchResult> {
        let table = self.read()?;

        let Some(dimension) = table.first().map(EmbeddingRow::dimension) else {
            return Err(Error::VectorStore("Embedding table is empty".to_string()));
        };
        if vector.len() != dimension {
            return Err(Error::InvalidInput(format!(
                "Query vector has dimension {}, table uses {}",
                vector.len(),
                dimension
            )));
        }

        let mut results: Vec<ScoredRow> = table
            .iter()
            .map(|row| ScoredRow {
                score: cosine_similarity(vector, &row.embedding),
                row: row.clone(),
            })
            .filter(|scored| config.score_threshold.is_none_or(|min| scored.score >= min))
            .collect();

        // Stable sort, so equal scores keep insertion order
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(config.top_k);

        Ok(SearchResult {
            rows: results,
            scanned: table.len(),
        })
    }

    async fn rows(&self) -> Result<Vec<EmbeddingRow>> {
        Ok(self.read()?.clone())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    async fn clear(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }

    async fn dimension(&self) -> Result<Option<usize>> {
        Ok(self.read()?.first().map(EmbeddingRow::dimension))
    }

    fn model_id(&self) -> Option<&str> {
        Some(self.embedding_model.as_str())
    }
}
