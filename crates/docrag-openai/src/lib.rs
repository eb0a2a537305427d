//! OpenAI integration for docrag
//!
//! This crate provides the OpenAI implementation of the EmbeddingProvider and
//! LLMProvider traits.

mod client;
mod config;

#[cfg(test)]
mod tests;

pub use client::OpenAIClient;
pub use config::OpenAIConfig;

// Re-export core types for convenience
pub use docrag_core::{
    EmbeddingProvider, GenerationConfig, GenerationResult, LLMProvider, Error, Result,
};
