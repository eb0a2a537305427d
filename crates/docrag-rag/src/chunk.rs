//! Sentence splitting and sentence-count chunking

use std::path::Path;

use tracing::debug;

use docrag_core::{ChunkRecord, Error, ExtractedDocument, IndexingConfig, Result};

/// Lowercased tokens that end in a period without ending a sentence
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "vs", "etc", "e.g", "i.e",
    "inc", "ltd", "co", "corp", "dept", "no", "nos", "fig", "figs", "approx", "est",
    "vol", "ch", "sec", "pp", "ref", "jan", "feb", "mar", "apr", "jun", "jul", "aug",
    "sep", "sept", "oct", "nov", "dec", "u.s", "u.k", "a.m", "p.m",
];

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_closing(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '}' | '”' | '’' | '»')
}

fn is_opening(c: char) -> bool {
    matches!(c, '"' | '\'' | '(' | '[' | '{' | '“' | '‘' | '«')
}

/// Split text into sentences.
///
/// A sentence ends at `.`, `!` or `?` (with any trailing closing quotes or
/// brackets) followed by whitespace or the end of the text. A period after a
/// known abbreviation or a single-letter initial does not end a sentence, and
/// neither does one followed by a lowercase word.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        if !is_terminator(chars[i].1) {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() && is_terminator(chars[j].1) {
            j += 1;
        }
        while j < chars.len() && is_closing(chars[j].1) {
            j += 1;
        }

        let end = chars.get(j).map_or(text.len(), |(offset, _)| *offset);
        let followed_by_space = chars.get(j).is_none_or(|(_, c)| c.is_whitespace());

        if followed_by_space && ends_sentence(text, &chars, start, i, j) {
            push_sentence(&mut sentences, &text[start..end]);
            start = end;
        }

        i = j;
    }

    push_sentence(&mut sentences, &text[start..]);
    sentences
}

/// Decide whether the terminator run `chars[first..next)` closes the sentence begun at `start`
fn ends_sentence(text: &str, chars: &[(usize, char)], start: usize, first: usize, next: usize) -> bool {
    let Some((_, following)) = chars[next..].iter().find(|(_, c)| !c.is_whitespace()) else {
        return true;
    };

    if following.is_lowercase() {
        return false;
    }

    // Only a lone period can belong to an abbreviation
    let lone_period = chars[first].1 == '.' && (first + 1 == next || !is_terminator(chars[first + 1].1));
    if !lone_period {
        return true;
    }

    let token_end = chars[first].0;
    let token_start = text[start..token_end]
        .rfind(char::is_whitespace)
        .map_or(start, |pos| {
            let ws = text[start + pos..].chars().next().map_or(1, char::len_utf8);
            start + pos + ws
        });
    let token = text[token_start..token_end]
        .trim_start_matches(is_opening)
        .to_lowercase();

    if ABBREVIATIONS.contains(&token.as_str()) {
        return false;
    }

    let mut letters = token.chars();
    !matches!((letters.next(), letters.next()), (Some(c), None) if c.is_alphabetic())
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let sentence = raw.trim();
    if !sentence.is_empty() {
        sentences.push(sentence.to_string());
    }
}

/// Split text into chunks of at most `max_sentences` sentences, joined by single spaces
pub fn split_text_into_chunks(text: &str, max_sentences: usize) -> Result<Vec<String>> {
    if max_sentences == 0 {
        return Err(Error::InvalidInput(
            "max_sentences must be at least 1".to_string(),
        ));
    }

    let sentences = split_sentences(text);
    Ok(sentences
        .chunks(max_sentences)
        .map(|group| group.join(" "))
        .collect())
}

/// Flatten line breaks and, optionally, drop every period
pub fn clean_text(text: &str, strip_periods: bool) -> String {
    let flattened = text.replace("\r\n", " ").replace(['\n', '\r'], " ");
    if strip_periods {
        flattened.replace('.', "")
    } else {
        flattened
    }
}

/// File name without its extension
pub fn strip_extension(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file)
        .to_string()
}

/// Break every document into sentence-count chunks and clean the chunk text.
///
/// Each chunk keeps its document's metadata; the `file` field loses its
/// extension while `source` keeps the name found on disk. Documents without
/// text produce no chunks.
pub fn break_and_clean(documents: &[ExtractedDocument], config: &IndexingConfig) -> Result<Vec<ChunkRecord>> {
    let mut records = Vec::new();

    for document in documents {
        let chunks = split_text_into_chunks(&document.text, config.max_sentences)?;
        debug!("{}/{}: {} chunk(s)", document.folder, document.file, chunks.len());

        for (index, chunk) in chunks.into_iter().enumerate() {
            let mut record = ChunkRecord::from_document(document, clean_text(&chunk, config.strip_periods), index);
            record.file = strip_extension(&record.file);
            records.push(record);
        }
    }

    Ok(records)
}
