//! RAG (Retrieval-Augmented Generation) engine trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, ScoredRow};

/// Default number of chunks placed in the context
pub const DEFAULT_TOP_K: usize = 3;

/// Default context budget, in characters
pub const DEFAULT_CONTEXT_LIMIT: usize = 3750;

/// Query for RAG retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RAGQuery {
    pub query: String,
    pub top_k: usize,
    /// Maximum number of characters of retrieved text placed in the prompt
    pub context_limit: usize,
    pub score_threshold: Option<f32>,
}

impl RAGQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

impl Default for RAGQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            top_k: DEFAULT_TOP_K,
            context_limit: DEFAULT_CONTEXT_LIMIT,
            score_threshold: None,
        }
    }
}

/// Result from RAG retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RAGResult {
    /// Selected rows, best match first
    pub documents: Vec<ScoredRow>,
    pub context: String,
    pub prompt: String,
}

/// Trait for RAG engines
///
/// An engine embeds the query, ranks the stored rows against it and turns the
/// best ones into a prompt for a question-answering model.
#[async_trait]
pub trait RAGEngine: Send + Sync {
    /// Retrieve relevant rows for a query and build the prompt
    async fn retrieve(&self, query: &RAGQuery) -> Result<RAGResult>;

    /// Join the text of the selected rows, capped at `limit` characters
    fn build_context(&self, documents: &[ScoredRow], limit: usize) -> String {
        let joined = documents
            .iter()
            .map(|doc| doc.row.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        truncate_chars(&joined, limit).to_string()
    }

    /// Template the context and question into the final prompt
    fn build_prompt(&self, query: &str, context: &str) -> String {
        format!(
            "Answer the question based on the context below.\n\n\
            Context:\n {}\n\n\
            Question: {}\nAnswer:",
            context, query
        )
    }

    /// Get statistics about the RAG engine
    async fn stats(&self) -> Result<serde_json::Value>;
}

/// Longest prefix of `text` holding at most `limit` characters
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
