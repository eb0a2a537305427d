//! HTML extractor built on `scraper`

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use docrag_core::extractor::has_extension;
use docrag_core::{DocumentExtractor, Error, ExtractedDocument, Result};

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];
const SKIPPED_TAGS: [&str; 2] = ["script", "style"];

/// Extractor for `.htm` / `.html` files
#[derive(Debug, Default, Clone)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract text and metadata from an HTML string
    pub fn parse(&self, html: &str) -> Result<ExtractedDocument> {
        let document = Html::parse_document(html);

        let title = document
            .select(&selector("title")?)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty());

        // Grouped by level: all h1 first, then all h2, and so on
        let mut headings = Vec::new();
        for tag in HEADING_TAGS {
            for heading in document.select(&selector(tag)?) {
                let text = element_text(heading);
                if !text.is_empty() {
                    headings.push(text);
                }
            }
        }

        let images = document
            .select(&selector("img")?)
            .filter_map(|img| img.value().attr("src"))
            .map(str::to_string)
            .collect();

        Ok(ExtractedDocument {
            file: String::new(),
            folder: String::new(),
            text: visible_text(&document),
            title,
            headings,
            images,
        })
    }
}

impl DocumentExtractor for HtmlExtractor {
    fn name(&self) -> &str {
        "html"
    }

    fn can_extract(&self, path: &Path) -> bool {
        has_extension(path, &["htm", "html"])
    }

    fn extract(&self, path: &Path, bytes: &[u8]) -> Result<ExtractedDocument> {
        let html = decode_html_bytes(bytes);
        debug!("Parsing HTML {:?} ({} bytes)", path, bytes.len());
        self.parse(&html)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Extraction(format!("Invalid selector {}: {}", css, e)))
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// All text nodes outside `<script>` and `<style>`, whitespace-collapsed
fn visible_text(document: &Html) -> String {
    let mut text = String::new();

    for node in document.tree.root().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_TAGS.contains(&el.name()))
        });

        if !hidden {
            text.push_str(fragment);
        }
    }

    collapse_whitespace(&text)
}

/// Decode HTML bytes as UTF-8 (dropping a BOM), falling back to Latin-1
pub fn decode_html_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            debug!("Input is not valid UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| char::from(b)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title> Sales Order   Entry </title>
  <style>body { color: red; }</style>
  <script>var tracking = "ignore me";</script>
</head>
<body>
  <h2>Line items</h2>
  <h1>Sales Orders</h1>
  <p>Enter the customer
     number first.</p>
  <img src="images/so_entry.gif" alt="entry screen">
  <img alt="no source">
  <h2>Pricing</h2>
  <p>Prices come from the <b>price book</b>.</p>
</body>
</html>"#;

    #[test]
    fn extracts_title_headings_images_and_text() {
        let doc = HtmlExtractor::new().parse(PAGE).unwrap();

        assert_eq!(doc.title.as_deref(), Some("Sales Order Entry"));
        assert_eq!(doc.headings, vec!["Sales Orders", "Line items", "Pricing"]);
        assert_eq!(doc.images, vec!["images/so_entry.gif"]);
        assert_eq!(
            doc.text,
            "Sales Order Entry Line items Sales Orders Enter the customer number first. Pricing Prices come from the price book."
        );
        assert!(!doc.text.contains("tracking"));
        assert!(!doc.text.contains("color"));
    }

    #[test]
    fn missing_title_is_none() {
        let doc = HtmlExtractor::new()
            .parse("<html><body><p>Just text</p></body></html>")
            .unwrap();
        assert!(doc.title.is_none());
        assert!(doc.headings.is_empty());
        assert_eq!(doc.text, "Just text");
    }

    #[test]
    fn decodes_bom_and_latin1() {
        assert_eq!(decode_html_bytes(b"\xEF\xBB\xBFcaf\xC3\xA9"), "café");
        assert_eq!(decode_html_bytes(b"caf\xE9"), "café");
    }

    #[test]
    fn handles_htm_and_html_extensions() {
        let extractor = HtmlExtractor::new();
        assert!(extractor.can_extract(Path::new("help/Orders.HTM")));
        assert!(extractor.can_extract(Path::new("index.html")));
        assert!(!extractor.can_extract(Path::new("orders.pdf")));
    }
}
