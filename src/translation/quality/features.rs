/*!
 * Surface features of text used by the quality heuristics.
 *
 * Everything here is pure and deterministic: the same text always yields the
 * same tokens, numbers and entities, in the same order.
 */

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid word pattern"));

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:[.,\u{00A0}\u{202F} ]\d+)*").expect("valid number pattern")
});

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:https?://|www\.)[^\s<>"')\]]+[^\s<>"')\].,;:!?]"#).expect("valid url pattern")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+").expect("valid email pattern")
});

static ACRONYM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2,}[0-9]*\b").expect("valid acronym pattern"));

static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+(?:[A-Z][a-z]+)*\b").expect("valid name pattern"));

/// Capitalized words that are not names even mid-sentence
const NOT_NAMES: &[&str] = &[
    "I", "I'm", "Mr", "Mrs", "Ms", "Dr", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday",
    "Saturday", "Sunday",
];

/// Kind of entity found in a text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Url,
    Email,
    Acronym,
    Name,
}

impl EntityKind {
    /// Entities written the same way in every script
    pub fn is_script_neutral(self) -> bool {
        !matches!(self, EntityKind::Name)
    }
}

/// Quote style used by a text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QuoteStyle {
    /// "straight"
    Straight,
    /// “curly”
    Curly,
    /// «guillemets»
    Guillemets,
    /// 「corner brackets」
    Corner,
}

/// Whether `c` belongs to a CJK script
pub fn is_cjk_char(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30FF}'   // Hiragana, Katakana
        | '\u{3400}'..='\u{4DBF}' // CJK Extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK Unified Ideographs
        | '\u{AC00}'..='\u{D7AF}' // Hangul syllables
        | '\u{F900}'..='\u{FAFF}' // CJK compatibility ideographs
    )
}

/// Lowercased word tokens; CJK runs are split into single characters.
pub fn tokens(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for m in WORD.find_iter(text) {
        let word = m.as_str();
        if word.chars().any(is_cjk_char) {
            out.extend(word.chars().map(|c| c.to_lowercase().collect::<String>()));
        } else {
            out.push(word.to_lowercase());
        }
    }
    out
}

/// Lowercased alphabetic words of at least `min_chars` characters
pub fn content_words(text: &str, min_chars: usize) -> Vec<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str())
        .filter(|w| w.chars().all(char::is_alphabetic) && !w.chars().any(is_cjk_char))
        .filter(|w| w.chars().count() >= min_chars)
        .map(str::to_lowercase)
        .collect()
}

/// Numbers in order of appearance, reduced to their digits.
///
/// Group and decimal separators are dropped so `1,000.5` and `1 000,5`
/// compare equal. Digits of other scripts (full-width, Arabic-Indic,
/// Devanagari, ...) are mapped to ASCII so `２０２３` matches `2023`.
pub fn numbers(text: &str) -> Vec<String> {
    NUMBER
        .find_iter(text)
        .map(|m| m.as_str().chars().filter_map(ascii_digit).collect::<String>())
        .filter(|digits| !digits.is_empty())
        .collect()
}

/// Code points of the digit zero in decimal digit blocks
const DIGIT_ZEROS: &[u32] = &[
    0x0030, // ASCII
    0x0660, // Arabic-Indic
    0x06F0, // Extended Arabic-Indic
    0x0966, // Devanagari
    0x09E6, // Bengali
    0x0A66, // Gurmukhi
    0x0AE6, // Gujarati
    0x0B66, // Oriya
    0x0BE6, // Tamil
    0x0C66, // Telugu
    0x0CE6, // Kannada
    0x0D66, // Malayalam
    0x0E50, // Thai
    0x0ED0, // Lao
    0x0F20, // Tibetan
    0x1040, // Myanmar
    0x17E0, // Khmer
    0x1810, // Mongolian
    0xFF10, // Full-width
];

/// ASCII form of a decimal digit of any supported script
fn ascii_digit(c: char) -> Option<char> {
    let code = c as u32;
    DIGIT_ZEROS
        .iter()
        .find(|&&zero| (zero..zero + 10).contains(&code))
        .and_then(|&zero| char::from_digit(code - zero, 10))
}

/// Entities that a translation is expected to carry over, deduplicated.
pub fn entities(text: &str) -> BTreeSet<(EntityKind, String)> {
    let mut found = BTreeSet::new();
    let mut covered: Vec<(usize, usize)> = Vec::new();

    for m in URL.find_iter(text) {
        found.insert((EntityKind::Url, m.as_str().to_string()));
        covered.push((m.start(), m.end()));
    }
    for m in EMAIL.find_iter(text) {
        if !overlaps(&covered, m.start(), m.end()) {
            found.insert((EntityKind::Email, m.as_str().to_string()));
            covered.push((m.start(), m.end()));
        }
    }
    for m in ACRONYM.find_iter(text) {
        if !overlaps(&covered, m.start(), m.end()) {
            found.insert((EntityKind::Acronym, m.as_str().to_string()));
        }
    }
    for m in NAME.find_iter(text) {
        let word = m.as_str();
        if overlaps(&covered, m.start(), m.end())
            || NOT_NAMES.contains(&word)
            || starts_sentence(text, m.start())
        {
            continue;
        }
        found.insert((EntityKind::Name, word.to_string()));
    }

    found
}

/// Dominant quote style of a text, if it quotes anything
pub fn quote_style(text: &str) -> Option<QuoteStyle> {
    let mut counts = [
        (QuoteStyle::Straight, 0usize),
        (QuoteStyle::Curly, 0),
        (QuoteStyle::Guillemets, 0),
        (QuoteStyle::Corner, 0),
    ];

    for c in text.chars() {
        let slot = match c {
            '"' => 0,
            '“' | '”' | '„' => 1,
            '«' | '»' => 2,
            '「' | '」' | '『' | '』' => 3,
            _ => continue,
        };
        counts[slot].1 += 1;
    }

    counts
        .iter()
        .filter(|(_, n)| *n > 0)
        .max_by_key(|(style, n)| (*n, std::cmp::Reverse(*style)))
        .map(|(style, _)| *style)
}

/// Count of unbalanced brackets and quotes
pub fn bracket_imbalance(text: &str) -> usize {
    const PAIRS: &[(char, char)] = &[
        ('(', ')'),
        ('[', ']'),
        ('{', '}'),
        ('“', '”'),
        ('«', '»'),
        ('「', '」'),
        ('『', '』'),
        ('（', '）'),
    ];

    let mut imbalance = 0;
    for (open, close) in PAIRS {
        let opens = text.chars().filter(|c| c == open).count();
        let closes = text.chars().filter(|c| c == close).count();
        imbalance += opens.abs_diff(closes);
    }

    if text.chars().filter(|c| *c == '"').count() % 2 == 1 {
        imbalance += 1;
    }
    imbalance
}

/// Share of characters that are replacement or control characters
pub fn garbage_ratio(text: &str) -> f32 {
    let mut total = 0usize;
    let mut garbage = 0usize;
    for c in text.chars() {
        total += 1;
        if c == '\u{FFFD}' || (c.is_control() && !matches!(c, '\n' | '\r' | '\t')) {
            garbage += 1;
        }
    }
    if total == 0 { 0.0 } else { garbage as f32 / total as f32 }
}

fn overlaps(ranges: &[(usize, usize)], start: usize, end: usize) -> bool {
    ranges.iter().any(|(s, e)| start < *e && *s < end)
}

/// Whether the word at `offset` is the first word of a sentence
fn starts_sentence(text: &str, offset: usize) -> bool {
    let before = text[..offset].trim_end_matches(|c: char| {
        c.is_whitespace() || matches!(c, '"' | '\'' | '“' | '‘' | '«' | '(' | '[' | '-' | '*' | '#')
    });
    match before.chars().last() {
        None => true,
        Some(c) => matches!(c, '.' | '!' | '?' | '…' | ':' | '。' | '！' | '？'),
    }
}
