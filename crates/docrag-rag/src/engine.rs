//! RAG engine implementation

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::vector_store::distinct_files;

use docrag_core::{
    EmbeddingProvider, Error, RAGEngine, RAGQuery, RAGResult, Result, RetryConfig, SearchConfig,
    VectorStore, retry,
};

/// RAG engine over a local embedding table
pub struct LocalRAGEngine<V: VectorStore, E: EmbeddingProvider> {
    vector_store: Arc<V>,
    embedder: Arc<E>,
    retry: RetryConfig,
}

impl<V: VectorStore, E: EmbeddingProvider> LocalRAGEngine<V, E> {
    /// Create a new local RAG engine
    pub fn new(vector_store: Arc<V>, embedder: Arc<E>) -> Self {
        Self {
            vector_store,
            embedder,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        retry(&self.retry, "Query embedding", || self.embedder.embed_query(query))
            .await
            .map_err(|e| match e {
                Error::Embedding(_) => e,
                other => Error::Embedding(format!("Query embedding failed: {}", other)),
            })
    }
}

#[async_trait]
impl<V: VectorStore + 'static, E: EmbeddingProvider + 'static> RAGEngine for LocalRAGEngine<V, E> {
    async fn retrieve(&self, query: &RAGQuery) -> Result<RAGResult> {
        let question = query.query.trim();
        if question.is_empty() {
            return Err(Error::InvalidInput("Query must not be empty".to_string()));
        }

        let vector = self.embed_query(question).await?;

        let search_config = SearchConfig {
            top_k: query.top_k,
            score_threshold: query.score_threshold,
        };
        let search_result = self
            .vector_store
            .search_by_vector(&vector, &search_config)
            .await?;
        debug!(
            "Selected {} of {} row(s) for {:?}",
            search_result.rows.len(),
            search_result.scanned,
            question
        );

        let context = self.build_context(&search_result.rows, query.context_limit);
        let prompt = self.build_prompt(&query.query, &context);

        Ok(RAGResult {
            documents: search_result.rows,
            context,
            prompt,
        })
    }

    async fn stats(&self) -> Result<serde_json::Value> {
        let rows = self.vector_store.rows().await?;
        let model = self
            .vector_store
            .model_id()
            .unwrap_or_else(|| self.embedder.model_id());

        Ok(json!({
            "dimension": self.vector_store.dimension().await?,
            "embedding_model": model,
            "files": distinct_files(&rows),
            "rows": rows.len(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::KeywordEmbedder;
    use crate::vector_store::EmbeddingTable;
    use docrag_core::EmbeddingRow;

    async fn engine_with(texts: &[&str], embedder: KeywordEmbedder) -> LocalRAGEngine<EmbeddingTable, KeywordEmbedder> {
        engine_over("keyword-test", texts, embedder).await
    }

    async fn engine_over(
        table_model: &str,
        texts: &[&str],
        embedder: KeywordEmbedder,
    ) -> LocalRAGEngine<EmbeddingTable, KeywordEmbedder> {
        let store = Arc::new(EmbeddingTable::new(table_model));
        let rows = texts
            .iter()
            .enumerate()
            .map(|(i, text)| EmbeddingRow {
                id: format!("row{}", i),
                file: format!("file{}", i % 2),
                source: format!("file{}.htm", i % 2),
                folder: ".".to_string(),
                text: text.to_string(),
                title: None,
                headings: vec![],
                images: vec![],
                chunk_index: i,
                embedding: KeywordEmbedder::vector(text),
            })
            .collect();
        store.insert(rows).await.unwrap();

        LocalRAGEngine::new(store, Arc::new(embedder)).with_retry(RetryConfig::immediate(2))
    }

    #[tokio::test]
    async fn test_retrieve_ranks_and_builds_prompt() {
        let engine = engine_with(
            &[
                "Send the invoice to the customer",
                "Release the job to the floor",
                "Close the job after the last operation",
            ],
            KeywordEmbedder::new(),
        )
        .await;

        let mut query = RAGQuery::new("How do I close a job?");
        query.top_k = 2;
        let result = engine.retrieve(&query).await.unwrap();

        assert_eq!(result.documents.len(), 2);
        assert_eq!(result.documents[0].row.text, "Close the job after the last operation");
        assert!(result.documents[0].score >= result.documents[1].score);
        assert_eq!(
            result.context,
            "Close the job after the last operation Release the job to the floor"
        );
        assert!(result.prompt.ends_with("Question: How do I close a job?\nAnswer:"));
    }

    #[tokio::test]
    async fn test_context_limit_is_applied() {
        let engine = engine_with(&["Close the job now", "Release the job"], KeywordEmbedder::new()).await;

        let mut query = RAGQuery::new("close job");
        query.context_limit = 9;
        let result = engine.retrieve(&query).await.unwrap();

        assert_eq!(result.context, "Close the");
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let embedder = KeywordEmbedder::new();
        let engine = engine_with(&["Close the job"], embedder).await;

        let result = engine.retrieve(&RAGQuery::new("   ")).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_query_embedding_retries_then_fails() {
        let engine = engine_with(&["Close the job"], KeywordEmbedder::failing(1)).await;
        assert!(engine.retrieve(&RAGQuery::new("close")).await.is_ok());

        let engine = engine_with(&["Close the job"], KeywordEmbedder::failing(5)).await;
        let result = engine.retrieve(&RAGQuery::new("close")).await;
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[tokio::test]
    async fn test_empty_table_is_an_error() {
        let engine = engine_with(&[], KeywordEmbedder::new()).await;
        let result = engine.retrieve(&RAGQuery::new("close")).await;
        assert!(matches!(result, Err(Error::VectorStore(_))));
    }

    #[tokio::test]
    async fn test_stats() {
        let engine = engine_with(&["Close the job", "Release the job", "Enter the order"], KeywordEmbedder::new()).await;

        let stats = engine.stats().await.unwrap();
        assert_eq!(stats["rows"], 3);
        assert_eq!(stats["files"], 2);
        assert_eq!(stats["dimension"], 7);
        assert_eq!(stats["embedding_model"], "keyword-test");
    }

    #[tokio::test]
    async fn test_stats_report_the_table_model() {
        let engine = engine_over("text-embedding-ada-002", &["Close the job"], KeywordEmbedder::new()).await;

        let stats = engine.stats().await.unwrap();
        assert_eq!(stats["embedding_model"], "text-embedding-ada-002");
        assert_eq!(stats, engine.vector_store.summary().unwrap());
    }
}
