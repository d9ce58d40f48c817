/*!
 * Source documents and the chunks cut from them.
 */

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Immutable text to translate plus its language pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    text: Arc<str>,
    source_lang: String,
    target_lang: String,
}

impl SourceDocument {
    /// Create a new document
    pub fn new(text: impl Into<String>, source_lang: &str, target_lang: &str) -> Self {
        Self {
            text: Arc::from(text.into()),
            source_lang: source_lang.trim().to_string(),
            target_lang: target_lang.trim().to_string(),
        }
    }

    /// Full source text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Source language code
    pub fn source_lang(&self) -> &str {
        &self.source_lang
    }

    /// Target language code
    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    /// Length in Unicode scalar values
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the document has no text at all
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A contiguous slice of a document.
///
/// Offsets are byte offsets into the document text and always sit on
/// character boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of the chunk in the document
    pub index: usize,
    /// Byte offset of the first character
    pub start_offset: usize,
    /// Byte offset one past the last character
    pub end_offset: usize,
    /// The chunk text
    pub text: String,
}

impl Chunk {
    /// Create a chunk from a slice of `source`
    pub fn from_source(index: usize, source: &str, start_offset: usize, end_offset: usize) -> Self {
        Self {
            index,
            start_offset,
            end_offset,
            text: source[start_offset..end_offset].to_string(),
        }
    }

    /// Length in Unicode scalar values
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the chunk holds only whitespace
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Split the text into leading whitespace, content and trailing whitespace.
    pub fn padding(&self) -> (&str, &str, &str) {
        split_padding(&self.text)
    }
}

/// Split `text` into `(leading whitespace, core, trailing whitespace)`.
pub fn split_padding(text: &str) -> (&str, &str, &str) {
    let trimmed_start = text.trim_start();
    let lead = &text[..text.len() - trimmed_start.len()];
    let core = trimmed_start.trim_end();
    let trail = &trimmed_start[core.len()..];
    (lead, core, trail)
}

/// Concatenate chunk texts in index order
pub fn reassemble(chunks: &[Chunk]) -> String {
    let mut ordered: Vec<&Chunk> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.index);
    ordered.iter().map(|c| c.text.as_str()).collect()
}
