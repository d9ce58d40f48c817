/*!
 * ISO 639 language code handling.
 *
 * Documents may name their languages with ISO 639-1 (`fr`), ISO 639-2/T
 * (`fra`) or ISO 639-2/B (`fre`) codes. Everything keyed by language
 * (length-ratio tables, the size memory, cache fingerprints) goes through
 * [`canonical_code`] so the three spellings behave the same.
 */

use anyhow::{Result, anyhow};
use isolang::Language;

/// Kind of ISO 639 code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// ISO 639-2/B codes that differ from their 639-2/T form
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("dut", "nld"),
    ("fre", "fra"),
    ("geo", "kat"),
    ("ger", "deu"),
    ("gre", "ell"),
    ("ice", "isl"),
    ("mac", "mkd"),
    ("may", "msa"),
    ("per", "fas"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

fn terminology_form(code: &str) -> Option<&'static str> {
    BIBLIOGRAPHIC_CODES
        .iter()
        .find(|(bibliographic, _)| *bibliographic == code)
        .map(|(_, terminology)| *terminology)
}

fn lookup(code: &str) -> Option<(Language, LanguageCodeType)> {
    let code = code.trim().to_lowercase();
    match code.len() {
        2 => Language::from_639_1(&code).map(|lang| (lang, LanguageCodeType::Part1)),
        3 => match terminology_form(&code) {
            Some(part2t) => Language::from_639_3(part2t).map(|lang| (lang, LanguageCodeType::Part2B)),
            None => Language::from_639_3(&code).map(|lang| (lang, LanguageCodeType::Part2T)),
        },
        _ => None,
    }
}

/// Validate an ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    lookup(code)
        .map(|(_, kind)| kind)
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Normalize to ISO 639-1 when the language has a 2-letter code, ISO 639-2/T otherwise
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    lookup(code)
        .map(|(lang, _)| match lang.to_639_1() {
            Some(part1) => part1.to_string(),
            None => lang.to_639_3().to_string(),
        })
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Canonical key for a language code.
///
/// Known codes map to their shortest ISO form; anything else is lowercased
/// and trimmed so unknown codes still compare consistently.
pub fn canonical_code(code: &str) -> String {
    normalize_to_part1_or_part2t(code).unwrap_or_else(|_| code.trim().to_lowercase())
}

/// Check if two language codes represent the same language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (lookup(code1), lookup(code2)) {
        (Some((a, _)), Some((b, _))) => a == b,
        _ => false,
    }
}

/// English name of the language behind a code
pub fn get_language_name(code: &str) -> Result<String> {
    lookup(code)
        .map(|(lang, _)| lang.to_name().to_string())
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))
}
