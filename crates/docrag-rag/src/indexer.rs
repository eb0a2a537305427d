//! Batch embedding of chunks into a vector store

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use docrag_core::{
    ChunkRecord, EmbeddingProvider, EmbeddingRow, Error, IndexingConfig, IndexingResult, Result,
    RetryConfig, VectorStore, retry,
};

use crate::chunk::break_and_clean;
use crate::extract::process_folder;

/// Embeds chunks in batches and appends the resulting rows to a store
pub struct EmbeddingIndexer<E: EmbeddingProvider, V: VectorStore> {
    embedder: Arc<E>,
    store: Arc<V>,
    config: IndexingConfig,
    retry: RetryConfig,
}

impl<E: EmbeddingProvider, V: VectorStore> EmbeddingIndexer<E, V> {
    pub fn new(embedder: Arc<E>, store: Arc<V>) -> Self {
        Self {
            embedder,
            store,
            config: IndexingConfig::default(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: IndexingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Embed `chunks` batch by batch and append them to the store.
    ///
    /// A batch that fails after all retry attempts, or whose response does not
    /// hold one vector per chunk, is skipped and counted in the result.
    pub async fn create_and_append_embeddings(&self, chunks: Vec<ChunkRecord>) -> Result<IndexingResult> {
        if self.config.batch_size == 0 {
            return Err(Error::InvalidInput("batch_size must be at least 1".to_string()));
        }

        let mut result = IndexingResult::default();
        let batches: Vec<&[ChunkRecord]> = chunks.chunks(self.config.batch_size).collect();
        let total = batches.len();

        for (i, batch) in batches.into_iter().enumerate() {
            result.batches_total += 1;
            let label = format!("Embedding batch {}/{}", i + 1, total);

            match self.embed_batch(&label, batch).await {
                Ok(added) => {
                    result.rows_indexed += added;
                    info!("{}: appended {} row(s)", label, added);
                }
                Err(e) => {
                    warn!("{} skipped: {}", label, e);
                    result.batches_failed += 1;
                    result.rows_skipped += batch.len();
                    result.errors.push(format!("{}: {}", label, e));
                }
            }
        }

        let size = self.store.count().await?;
        info!(
            "Indexed {} row(s) in {} batch(es), {} failed; table holds {} row(s)",
            result.rows_indexed, result.batches_total, result.batches_failed, size
        );

        Ok(result)
    }

    async fn embed_batch(&self, label: &str, batch: &[ChunkRecord]) -> Result<usize> {
        let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = retry(&self.retry, label, || self.embedder.embed(&texts)).await?;

        if vectors.len() != batch.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                batch.len(),
                vectors.len()
            )));
        }

        let rows = batch
            .iter()
            .cloned()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddingRow::new(row_id(&chunk), chunk, vector))
            .collect();

        self.store.insert(rows).await
    }

    /// Extract, chunk and embed every supported file under `root`
    pub async fn index_folder(&self, root: &Path) -> Result<IndexingResult> {
        let report = process_folder(root)?;
        let chunks = break_and_clean(&report.documents, &self.config)?;
        info!(
            "Split {} document(s) into {} chunk(s)",
            report.documents.len(),
            chunks.len()
        );

        let mut result = self.create_and_append_embeddings(chunks).await?;
        result.errors.extend(
            report
                .failures
                .into_iter()
                .map(|failure| format!("{}: {}", failure.path, failure.error)),
        );
        Ok(result)
    }
}

/// Row id: md5 of the chunk's `folder/source#index` key
pub fn row_id(chunk: &ChunkRecord) -> String {
    format!("{:x}", md5::compute(chunk.key()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::KeywordEmbedder;
    use crate::vector_store::EmbeddingTable;

    fn chunk(file: &str, index: usize, text: &str) -> ChunkRecord {
        ChunkRecord {
            file: file.to_string(),
            source: file.to_string(),
            folder: "production".to_string(),
            text: text.to_string(),
            title: None,
            headings: vec![],
            images: vec![],
            chunk_index: index,
        }
    }

    fn build(embedder: KeywordEmbedder, batch_size: usize) -> (EmbeddingIndexer<KeywordEmbedder, EmbeddingTable>, Arc<EmbeddingTable>) {
        let store = Arc::new(EmbeddingTable::new("keyword-test"));
        let indexer = EmbeddingIndexer::new(Arc::new(embedder), store.clone())
            .with_config(IndexingConfig {
                batch_size,
                ..Default::default()
            })
            .with_retry(RetryConfig::immediate(2));
        (indexer, store)
    }

    #[tokio::test]
    async fn test_batches_are_appended_in_order() {
        let (indexer, store) = build(KeywordEmbedder::new(), 2);
        let chunks = vec![
            chunk("jobs", 0, "Release the job"),
            chunk("jobs", 1, "Close the job"),
            chunk("orders", 0, "Enter the order"),
        ];

        let result = indexer.create_and_append_embeddings(chunks).await.unwrap();

        assert_eq!(result.batches_total, 2);
        assert_eq!(result.rows_indexed, 3);
        assert_eq!(result.batches_failed, 0);

        let rows = store.rows().await.unwrap();
        let texts: Vec<&str> = rows.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Release the job", "Close the job", "Enter the order"]);
        assert_eq!(rows[0].embedding, KeywordEmbedder::vector("Release the job"));
        assert_eq!(rows[0].id, format!("{:x}", md5::compute("production/jobs#0")));
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let (indexer, store) = build(KeywordEmbedder::failing(1), 10);

        let result = indexer
            .create_and_append_embeddings(vec![chunk("jobs", 0, "Close the job")])
            .await
            .unwrap();

        assert_eq!(result.rows_indexed, 1);
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(indexer.embedder.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_batch_is_skipped() {
        let (indexer, store) = build(KeywordEmbedder::poisoned("BAD"), 1);
        let chunks = vec![
            chunk("a", 0, "Close the job"),
            chunk("b", 0, "BAD input"),
            chunk("c", 0, "Enter the order"),
        ];

        let result = indexer.create_and_append_embeddings(chunks).await.unwrap();

        assert_eq!(result.batches_total, 3);
        assert_eq!(result.batches_failed, 1);
        assert_eq!(result.rows_skipped, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Embedding batch 2/3"));
        assert_eq!(store.count().await.unwrap(), 2);
        // two attempts for the rejected batch, one for each of the others
        assert_eq!(indexer.embedder.call_count(), 4);
    }

    #[tokio::test]
    async fn test_short_response_skips_batch() {
        let embedder = KeywordEmbedder {
            short_response: true,
            ..KeywordEmbedder::default()
        };
        let (indexer, store) = build(embedder, 5);

        let result = indexer
            .create_and_append_embeddings(vec![chunk("a", 0, "one"), chunk("a", 1, "two")])
            .await
            .unwrap();

        assert_eq!(result.batches_failed, 1);
        assert_eq!(result.rows_skipped, 2);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_edge_cases() {
        let (indexer, _) = build(KeywordEmbedder::new(), 0);
        let result = indexer.create_and_append_embeddings(vec![chunk("a", 0, "x")]).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let (indexer, store) = build(KeywordEmbedder::new(), 100);
        let result = indexer.create_and_append_embeddings(vec![]).await.unwrap();
        assert_eq!(result.batches_total, 0);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_index_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("jobs.htm"),
            "<title>Jobs</title>\n<p>Release the job. Close the job when done.</p>",
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.pdf"), b"garbage").unwrap();

        let store = Arc::new(EmbeddingTable::new("keyword-test"));
        let indexer = EmbeddingIndexer::new(Arc::new(KeywordEmbedder::new()), store.clone())
            .with_config(IndexingConfig {
                max_sentences: 1,
                ..Default::default()
            })
            .with_retry(RetryConfig::immediate(1));

        let result = indexer.index_folder(dir.path()).await.unwrap();

        assert_eq!(result.rows_indexed, 2);
        assert_eq!(result.errors.len(), 1);

        let rows = store.rows().await.unwrap();
        assert_eq!(rows[0].file, "jobs");
        assert_eq!(rows[0].folder, ".");
        assert_eq!(rows[0].title.as_deref(), Some("Jobs"));
        assert_eq!(rows[0].text, "Jobs Release the job");
        assert_eq!(rows[1].text, "Close the job when done");
    }

    #[tokio::test]
    async fn test_same_stem_files_get_distinct_ids() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("guide.htm"), "<p>Release the job.</p>").unwrap();
        std::fs::write(dir.path().join("guide.md"), "Close the job.").unwrap();

        let store = Arc::new(EmbeddingTable::new("keyword-test"));
        let indexer = EmbeddingIndexer::new(Arc::new(KeywordEmbedder::new()), store.clone())
            .with_retry(RetryConfig::immediate(1));

        let result = indexer.index_folder(dir.path()).await.unwrap();
        assert_eq!(result.rows_indexed, 2);

        let rows = store.rows().await.unwrap();
        assert_eq!(rows[0].file, "guide");
        assert_eq!(rows[1].file, "guide");
        assert_eq!(rows[0].source, "guide.htm");
        assert_eq!(rows[1].source, "guide.md");
        assert_ne!(rows[0].id, rows[1].id);
        assert_eq!(rows[0].id, format!("{:x}", md5::compute("./guide.htm#0")));
        assert_eq!(store.summary().unwrap()["files"], 2);
    }
}
