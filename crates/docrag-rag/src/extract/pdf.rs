//! PDF extractor.
//!
//! Uses pdf-extract for the text layer and lopdf for the Info dictionary and
//! image listing.

use std::path::Path;

use lopdf::{Document, Object};
use tracing::{debug, warn};

use docrag_core::extractor::has_extension;
use docrag_core::{DocumentExtractor, Error, ExtractedDocument, Result};

/// Extractor for `.pdf` files
#[derive(Debug, Default, Clone)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentExtractor for PdfExtractor {
    fn name(&self) -> &str {
        "pdf"
    }

    fn can_extract(&self, path: &Path) -> bool {
        has_extension(path, &["pdf"])
    }

    fn extract(&self, path: &Path, bytes: &[u8]) -> Result<ExtractedDocument> {
        debug!("Extracting PDF {:?}", path);

        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| Error::Extraction(format!("PDF text extraction failed: {}", e)))?;

        let fallback_title = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (title, images) = match Document::load_mem(bytes) {
            Ok(doc) => (
                info_title(&doc).unwrap_or(fallback_title),
                list_images(&doc),
            ),
            Err(e) => {
                warn!("Failed to read PDF structure of {:?}: {}", path, e);
                (fallback_title, Vec::new())
            }
        };

        Ok(ExtractedDocument {
            file: String::new(),
            folder: String::new(),
            text: text.trim().to_string(),
            headings: vec![title.clone()],
            title: Some(title),
            images,
        })
    }
}

/// `/Title` from the trailer's Info dictionary, if present and non-empty
fn info_title(doc: &Document) -> Option<String> {
    let info = resolve(doc, doc.trailer.get(b"Info").ok()?)?;
    let title = resolve(doc, info.as_dict().ok()?.get(b"Title").ok()?)?;

    match title {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)).filter(|t| !t.is_empty()),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Decode a PDF text string: UTF-16BE when it carries a BOM, byte-per-char otherwise
pub(crate) fn decode_pdf_string(bytes: &[u8]) -> String {
    let decoded = match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        None => bytes.iter().map(|&b| char::from(b)).collect(),
    };
    decoded.trim().to_string()
}

/// One label per image XObject, `page-<n>-image-<object id>`
fn list_images(doc: &Document) -> Vec<String> {
    let mut images = Vec::new();

    for (page_num, page_id) in doc.get_pages() {
        match doc.get_page_images(page_id) {
            Ok(page_images) => {
                images.extend(
                    page_images
                        .iter()
                        .map(|image| format!("page-{}-image-{}", page_num, image.id.0)),
                );
            }
            Err(e) => debug!("Failed to list images on page {}: {}", page_num, e),
        }
    }

    images
}
