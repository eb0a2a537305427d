//! Document extractor trait

use std::path::Path;

use crate::{ExtractedDocument, Result};

/// Trait for turning the raw bytes of one file into an [`ExtractedDocument`]
pub trait DocumentExtractor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Whether this extractor handles the given path (usually by extension)
    fn can_extract(&self, path: &Path) -> bool;

    /// Extract text and metadata.
    ///
    /// `file` and `folder` of the returned document are filled in by the caller,
    /// which knows the walk root.
    fn extract(&self, path: &Path, bytes: &[u8]) -> Result<ExtractedDocument>;
}

/// Case-insensitive extension check shared by the extractors
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}
