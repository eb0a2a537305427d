//! Markdown extractor built on `pulldown-cmark`

use std::path::Path;

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

use docrag_core::extractor::has_extension;
use docrag_core::{DocumentExtractor, ExtractedDocument, Result};

/// Extractor for `.md` / `.markdown` files
#[derive(Debug, Default, Clone)]
pub struct MarkdownExtractor;

impl MarkdownExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, markdown: &str) -> ExtractedDocument {
        let mut text = String::new();
        let mut headings = Vec::new();
        let mut images = Vec::new();
        let mut title = None;
        let mut heading: Option<(HeadingLevel, String)> = None;

        for event in Parser::new(markdown) {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    heading = Some((level, String::new()));
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((level, raw)) = heading.take() {
                        let content = collapse(&raw);
                        if content.is_empty() {
                            continue;
                        }
                        if level == HeadingLevel::H1 && title.is_none() {
                            title = Some(content.clone());
                        }
                        headings.push(content);
                    }
                }
                Event::Start(Tag::Image { dest_url, .. }) => {
                    images.push(dest_url.to_string());
                }
                Event::Text(fragment) | Event::Code(fragment) => {
                    if let Some((_, raw)) = heading.as_mut() {
                        raw.push_str(&fragment);
                    }
                    text.push_str(&fragment);
                    text.push(' ');
                }
                Event::SoftBreak | Event::HardBreak => {
                    text.push(' ');
                }
                _ => {}
            }
        }

        ExtractedDocument {
            file: String::new(),
            folder: String::new(),
            text: collapse(&text),
            title,
            headings,
            images,
        }
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl DocumentExtractor for MarkdownExtractor {
    fn name(&self) -> &str {
        "markdown"
    }

    fn can_extract(&self, path: &Path) -> bool {
        has_extension(path, &["md", "markdown"])
    }

    fn extract(&self, _path: &Path, bytes: &[u8]) -> Result<ExtractedDocument> {
        Ok(self.parse(&String::from_utf8_lossy(bytes)))
    }
}
