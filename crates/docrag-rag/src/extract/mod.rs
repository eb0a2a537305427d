//! Document extraction: walk a folder and turn every supported file into an
//! [`ExtractedDocument`]

mod html;
mod markdown;
mod pdf;

use std::path::Path;

use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use docrag_core::{DocumentExtractor, Error, ExtractedDocument, Result};

pub use html::{HtmlExtractor, decode_html_bytes};
pub use markdown::MarkdownExtractor;
pub use pdf::PdfExtractor;

/// A file that matched an extractor but could not be read or parsed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionFailure {
    pub path: String,
    pub error: String,
}

/// Outcome of a folder walk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub documents: Vec<ExtractedDocument>,
    pub failures: Vec<ExtractionFailure>,
}

/// The extractors used by [`process_folder`], in priority order
pub fn default_extractors() -> Vec<Box<dyn DocumentExtractor>> {
    vec![
        Box::new(HtmlExtractor::new()),
        Box::new(PdfExtractor::new()),
        Box::new(MarkdownExtractor::new()),
    ]
}

/// Walk `root` recursively with the default extractors
pub fn process_folder(root: &Path) -> Result<ExtractionReport> {
    process_folder_with(root, &default_extractors())
}

/// Walk `root` recursively, handing each file to the first extractor that claims it
pub fn process_folder_with(root: &Path, extractors: &[Box<dyn DocumentExtractor>]) -> Result<ExtractionReport> {
    if !root.is_dir() {
        return Err(Error::InvalidInput(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut report = ExtractionReport::default();
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to read directory entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        let Some(extractor) = extractors.iter().find(|x| x.can_extract(path)) else {
            debug!("Skipping unsupported file {:?}", path);
            continue;
        };

        match extract_file(root, path, extractor.as_ref()) {
            Ok(document) => report.documents.push(document),
            Err(e) => {
                warn!("Failed to extract {:?} with {}: {}", path, extractor.name(), e);
                report.failures.push(ExtractionFailure {
                    path: path.display().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        "Extracted {} document(s) from {:?}, {} failure(s)",
        report.documents.len(),
        root,
        report.failures.len()
    );

    Ok(report)
}

fn extract_file(root: &Path, path: &Path, extractor: &dyn DocumentExtractor) -> Result<ExtractedDocument> {
    let bytes = std::fs::read(path)?;
    let mut document = extractor.extract(path, &bytes)?;

    document.file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    document.folder = relative_folder(root, path);

    Ok(document)
}

/// Parent directory of `path` relative to `root`, `"."` for files directly under it
fn relative_folder(root: &Path, path: &Path) -> String {
    let relative = path
        .parent()
        .and_then(|parent| parent.strip_prefix(root).ok())
        .map(|dir| dir.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();

    if relative.is_empty() { ".".to_string() } else { relative }
}
