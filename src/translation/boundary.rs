/*!
 * Boundary detection for semantic chunking.
 *
 * Finds the offsets at which a text can be cut without breaking a
 * meaning-bearing unit, ranked from paragraph breaks down to plain
 * whitespace between words. Cut offsets sit after the delimiter and the
 * whitespace following it, so the next chunk starts on content.
 */

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Strength given to the implicit boundaries at the start and end of the text
pub const HARD_STRENGTH: u8 = 5;

/// Kind of boundary, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BoundaryKind {
    /// Whitespace between words
    Word,
    /// Comma, semicolon, colon
    Clause,
    /// Sentence-ending punctuation or a single line break
    Sentence,
    /// Blank line between paragraphs
    Paragraph,
}

impl BoundaryKind {
    /// Preference rank for this kind (higher is preferred)
    pub fn strength(self) -> u8 {
        match self {
            BoundaryKind::Word => 1,
            BoundaryKind::Clause => 2,
            BoundaryKind::Sentence => 3,
            BoundaryKind::Paragraph => 4,
        }
    }
}

/// A candidate cut point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryCandidate {
    /// Byte offset of the cut
    pub offset: usize,
    /// What kind of unit ends here
    pub kind: BoundaryKind,
    /// Preference rank, `HARD_STRENGTH` for the text edges
    pub strength: u8,
}

impl BoundaryCandidate {
    fn new(offset: usize, kind: BoundaryKind) -> Self {
        Self {
            offset,
            kind,
            strength: kind.strength(),
        }
    }

    fn hard(offset: usize) -> Self {
        Self {
            offset,
            kind: BoundaryKind::Paragraph,
            strength: HARD_STRENGTH,
        }
    }

    /// Whether this is one of the implicit text edges
    pub fn is_hard(&self) -> bool {
        self.strength == HARD_STRENGTH
    }
}

static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n[ \t]*\r?\n\s*").expect("valid paragraph pattern"));

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n\s*").expect("valid line pattern"));

static SENTENCE_LATIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[.!?…]+["'”’»)\]]*\s+"#).expect("valid sentence pattern")
});

static SENTENCE_CJK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[。！？]+["'”’」』）)]*\s*"#).expect("valid CJK sentence pattern"));

static CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[,;:]["'”’)\]]*\s+|[，；：、]\s*"#).expect("valid clause pattern")
});

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid word pattern"));

/// Words whose trailing period does not end a sentence
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "cf", "approx",
    "no", "fig", "inc", "ltd", "co", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep",
    "sept", "oct", "nov", "dec", "mt", "gen", "col", "lt", "sgt",
];

/// Detect every candidate boundary of `text`, ordered by offset.
///
/// Offsets `0` and `text.len()` are always present. When several kinds
/// end at the same offset only the strongest is kept.
pub fn detect(text: &str) -> Vec<BoundaryCandidate> {
    let len = text.len();
    let mut by_offset: BTreeMap<usize, BoundaryKind> = BTreeMap::new();

    let mut record = |offset: usize, kind: BoundaryKind| {
        if offset == 0 || offset >= len {
            return;
        }
        by_offset
            .entry(offset)
            .and_modify(|existing| {
                if kind > *existing {
                    *existing = kind;
                }
            })
            .or_insert(kind);
    };

    for m in WORD.find_iter(text) {
        record(m.end(), BoundaryKind::Word);
    }
    for m in CLAUSE.find_iter(text) {
        record(m.end(), BoundaryKind::Clause);
    }
    for m in SENTENCE_LATIN.find_iter(text) {
        if !ends_with_abbreviation(text, m.start(), m.as_str()) {
            record(m.end(), BoundaryKind::Sentence);
        }
    }
    for m in SENTENCE_CJK.find_iter(text) {
        record(m.end(), BoundaryKind::Sentence);
    }
    for m in LINE_BREAK.find_iter(text) {
        record(m.end(), BoundaryKind::Sentence);
    }
    for m in PARAGRAPH.find_iter(text) {
        record(m.end(), BoundaryKind::Paragraph);
    }

    let mut candidates = Vec::with_capacity(by_offset.len() + 2);
    candidates.push(BoundaryCandidate::hard(0));
    candidates.extend(
        by_offset
            .into_iter()
            .map(|(offset, kind)| BoundaryCandidate::new(offset, kind)),
    );
    if len > 0 {
        candidates.push(BoundaryCandidate::hard(len));
    }
    candidates
}

/// Whether a period run at `start` closes an abbreviation or an initial
fn ends_with_abbreviation(text: &str, start: usize, delimiter: &str) -> bool {
    if !delimiter.starts_with('.') || delimiter.starts_with("..") {
        return false;
    }

    let before = &text[..start];
    let token = before
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches(|c: char| !c.is_alphanumeric());

    if token.is_empty() {
        return false;
    }

    let lowered = token.to_lowercase();
    if ABBREVIATIONS.contains(&lowered.as_str()) {
        return true;
    }

    // Single initials ("J. Smith") and dotted acronyms ("U.S. Army")
    let mut chars = token.chars();
    if let (Some(first), None) = (chars.next(), chars.next()) {
        return first.is_uppercase();
    }
    token.contains('.') && token.split('.').all(|part| part.chars().count() == 1)
}
