//! Document RAG pipeline for docrag
//!
//! This crate turns a folder of HTML, PDF and Markdown files into an embedding
//! table and answers questions against it: extraction, sentence chunking,
//! batched embedding and cosine retrieval.

pub mod chunk;
pub mod extract;
mod engine;
mod indexer;
mod vector_store;

#[cfg(test)]
mod mock;

pub use chunk::{break_and_clean, clean_text, split_sentences, split_text_into_chunks};
pub use engine::LocalRAGEngine;
pub use extract::{ExtractionFailure, ExtractionReport, process_folder};
pub use indexer::{EmbeddingIndexer, row_id};
pub use vector_store::{EmbeddingTable, cosine_similarity, default_table_path, distinct_files};

// Re-export core types for convenience
pub use docrag_core::{
    ChunkRecord, EmbeddingProvider, EmbeddingRow, Error, ExtractedDocument, IndexingConfig,
    IndexingResult, RAGEngine, RAGQuery, RAGResult, Result, RetryConfig, ScoredRow, SearchConfig,
    SearchResult, VectorStore,
};
