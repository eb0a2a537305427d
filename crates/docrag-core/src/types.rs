//! Common types used across the docrag pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for retry behavior around external API calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    /// Retry configuration that never sleeps, for tests and local runs
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::ZERO,
        }
    }
}

/// Configuration for chunking and embedding documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Number of chunks sent to the embedding API per request
    pub batch_size: usize,
    /// Maximum number of sentences per chunk
    pub max_sentences: usize,
    /// Remove every `.` from chunk text after splitting
    pub strip_periods: bool,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_sentences: 10,
            strip_periods: true,
        }
    }
}

/// Result of an indexing operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexingResult {
    pub batches_total: usize,
    pub batches_failed: usize,
    pub rows_indexed: usize,
    pub rows_skipped: usize,
    pub errors: Vec<String>,
}
