//! Core traits and types for docrag
//!
//! This crate defines the fundamental traits and types shared by the rest of the workspace:
//! embedding and language-model providers, the embedding table, document extractors
//! and the retrieval engine.

pub mod document;
pub mod embedding;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod rag;
pub mod retry;
pub mod types;
pub mod vector_store;

pub use document::{ChunkRecord, EmbeddingRow, ExtractedDocument};
pub use embedding::EmbeddingProvider;
pub use error::{Error, Result};
pub use extractor::DocumentExtractor;
pub use llm::{GenerationConfig, GenerationResult, LLMProvider};
pub use rag::{RAGEngine, RAGQuery, RAGResult};
pub use retry::retry;
pub use types::*;
pub use vector_store::{ScoredRow, SearchConfig, SearchResult, VectorStore};
