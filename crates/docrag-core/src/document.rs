//! Records flowing through the pipeline: extracted documents, chunks and embedded rows

use serde::{Deserialize, Serialize};

/// A document extracted from a file on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// File name, without the directory
    pub file: String,
    /// Directory of the file relative to the walked root, `"."` for the root itself
    pub folder: String,
    pub text: String,
    pub title: Option<String>,
    pub headings: Vec<String>,
    pub images: Vec<String>,
}

/// One chunk of a document's text, carrying the document's metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub file: String,
    /// File name as found on disk, extension included
    pub source: String,
    pub folder: String,
    pub text: String,
    pub title: Option<String>,
    pub headings: Vec<String>,
    pub images: Vec<String>,
    /// Position of the chunk within its document (0-indexed)
    pub chunk_index: usize,
}

impl ChunkRecord {
    /// Build a chunk record from a document and one piece of its text
    pub fn from_document(document: &ExtractedDocument, text: String, chunk_index: usize) -> Self {
        Self {
            file: document.file.clone(),
            source: document.file.clone(),
            folder: document.folder.clone(),
            text,
            title: document.title.clone(),
            headings: document.headings.clone(),
            images: document.images.clone(),
            chunk_index,
        }
    }

    /// Stable key identifying this chunk inside a table, `folder/source#index`
    pub fn key(&self) -> String {
        format!("{}/{}#{}", self.folder, self.source, self.chunk_index)
    }
}

/// A row of the embedding table: chunk metadata plus its vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRow {
    pub id: String,
    pub file: String,
    #[serde(default)]
    pub source: String,
    pub folder: String,
    pub text: String,
    pub title: Option<String>,
    pub headings: Vec<String>,
    pub images: Vec<String>,
    pub chunk_index: usize,
    pub embedding: Vec<f32>,
}

impl EmbeddingRow {
    /// Attach an embedding to a chunk
    pub fn new(id: String, chunk: ChunkRecord, embedding: Vec<f32>) -> Self {
        Self {
            id,
            file: chunk.file,
            source: chunk.source,
            folder: chunk.folder,
            text: chunk.text,
            title: chunk.title,
            headings: chunk.headings,
            images: chunk.images,
            chunk_index: chunk.chunk_index,
            embedding,
        }
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}
