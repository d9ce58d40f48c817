/*!
 * Heuristic quality assessment of a translated chunk.
 *
 * Fluency looks at the translation alone: repetition loops, unbalanced
 * brackets, garbage characters and a length that does not fit the language
 * pair. Accuracy compares against the source: numbers, URLs, acronyms and
 * names that should survive, plus words left untranslated. Consistency is
 * delegated to the document's `StyleProfile`.
 *
 * All scoring is pure: the same inputs always give the same score.
 */

use std::collections::{HashMap, HashSet};

use super::consistency::{ConsistencyReport, StyleProfile};
use super::features::{self, EntityKind};
use super::language_pairs::{LanguagePairThresholds, Script};
use super::metrics::{QualityConfig, QualityScore};
use crate::language_utils::canonical_code;

/// Scores translated chunks.
#[derive(Debug, Clone, Default)]
pub struct QualityAssessor {
    config: QualityConfig,
}

impl QualityAssessor {
    /// Create an assessor with the given scoring configuration
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Get the scoring configuration
    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Score a translation on its own, without document context.
    pub fn assess(&self, source: &str, translated: &str, source_lang: &str, target_lang: &str) -> QualityScore {
        self.assess_against(source, translated, source_lang, target_lang, &StyleProfile::new())
    }

    /// Score a translation against what earlier chunks did.
    pub fn assess_against(
        &self,
        source: &str,
        translated: &str,
        source_lang: &str,
        target_lang: &str,
        profile: &StyleProfile,
    ) -> QualityScore {
        self.assess_with_report(source, translated, source_lang, target_lang, profile).0
    }

    /// Score a translation and record it into the document profile.
    pub fn assess_in_context(
        &self,
        source: &str,
        translated: &str,
        source_lang: &str,
        target_lang: &str,
        profile: &mut StyleProfile,
    ) -> QualityScore {
        let score = self.assess_against(source, translated, source_lang, target_lang, profile);
        if !translated.trim().is_empty() {
            profile.record(source, translated);
        }
        score
    }

    /// Score a translation and return the consistency findings behind it.
    ///
    /// Empty input on either side scores zero with no report.
    pub fn assess_with_report(
        &self,
        source: &str,
        translated: &str,
        source_lang: &str,
        target_lang: &str,
        profile: &StyleProfile,
    ) -> (QualityScore, Option<ConsistencyReport>) {
        let source = source.trim();
        let translated = translated.trim();
        if source.is_empty() || translated.is_empty() {
            return (QualityScore::zero(), None);
        }

        let pair = LanguagePairThresholds::for_pair(source_lang, target_lang);
        let ratio = translated.chars().count() as f32 / source.chars().count() as f32;

        let mut fluency = fluency_score(translated, &pair, ratio);
        let mut accuracy = accuracy_score(source, translated, &pair, ratio, source_lang, target_lang);

        if is_untranslated(source, translated, source_lang, target_lang) {
            fluency = fluency.min(0.5);
            accuracy = 0.0;
        }

        let report = profile.check(source, translated);
        let score = QualityScore::from_dimensions(fluency, accuracy, report.score, &self.config);
        (score, Some(report))
    }
}

/// Fluency of a translation in `[0, 1]`
pub fn fluency_score(translated: &str, pair: &LanguagePairThresholds, ratio: f32) -> f32 {
    let repetition = repetition_penalty(&features::tokens(translated));
    let punctuation = (features::bracket_imbalance(translated) as f32 * 0.25).min(1.0);
    let length = pair.length_penalty(ratio);
    let garbage = (features::garbage_ratio(translated) * 10.0).min(1.0);

    (1.0 - (0.4 * repetition + 0.15 * punctuation + 0.3 * length + 0.15 * garbage)).clamp(0.0, 1.0)
}

/// Accuracy of a translation in `[0, 1]`
pub fn accuracy_score(
    source: &str,
    translated: &str,
    pair: &LanguagePairThresholds,
    ratio: f32,
    source_lang: &str,
    target_lang: &str,
) -> f32 {
    let numbers = missing_numbers_ratio(source, translated);
    let entities = missing_entities_ratio(source, translated, target_lang);
    let length = pair.length_penalty(ratio);
    let copied = copy_penalty(source, translated, source_lang, target_lang);

    (1.0 - (0.35 * numbers + 0.15 * entities + 0.2 * length + 0.3 * copied)).clamp(0.0, 1.0)
}

/// Penalty for stuttering ("the the the") and looping output.
fn repetition_penalty(tokens: &[String]) -> f32 {
    if tokens.len() < 2 {
        return 0.0;
    }

    let repeats = tokens.windows(2).filter(|w| w[0] == w[1]).count();
    let stutter = (repeats as f32 / (tokens.len() - 1) as f32 * 2.0).min(1.0);

    let trigrams: Vec<&[String]> = tokens.windows(3).collect();
    let looping = if trigrams.len() >= 6 {
        let unique: HashSet<&[String]> = trigrams.iter().copied().collect();
        let duplicated = 1.0 - unique.len() as f32 / trigrams.len() as f32;
        ((duplicated - 0.3) / 0.5).clamp(0.0, 1.0)
    } else {
        0.0
    };

    stutter.max(looping)
}

/// Share of source numbers missing from the translation
fn missing_numbers_ratio(source: &str, translated: &str) -> f32 {
    let expected = features::numbers(source);
    if expected.is_empty() {
        return 0.0;
    }

    let mut available: HashMap<String, usize> = HashMap::new();
    for n in features::numbers(translated) {
        *available.entry(n).or_default() += 1;
    }

    let mut missing = 0;
    for n in &expected {
        match available.get_mut(n) {
            Some(count) if *count > 0 => *count -= 1,
            _ => missing += 1,
        }
    }
    missing as f32 / expected.len() as f32
}

/// Share of source entities missing from the translation.
///
/// Names only count when the target script writes them unchanged.
fn missing_entities_ratio(source: &str, translated: &str, target_lang: &str) -> f32 {
    let keeps_names = Script::of(target_lang).keeps_latin_names();
    let expected: Vec<String> = features::entities(source)
        .into_iter()
        .filter(|(kind, _)| kind.is_script_neutral() || keeps_names)
        .map(|(_, text)| text)
        .collect();

    if expected.is_empty() {
        return 0.0;
    }
    let missing = expected.iter().filter(|e| !translated.contains(e.as_str())).count();
    missing as f32 / expected.len() as f32
}

/// Penalty for source words copied into the translation.
///
/// Up to 20% shared words are tolerated for cognates and loanwords.
fn copy_penalty(source: &str, translated: &str, source_lang: &str, target_lang: &str) -> f32 {
    if canonical_code(source_lang) == canonical_code(target_lang) {
        return 0.0;
    }

    let names: HashSet<String> = features::entities(source)
        .into_iter()
        .filter(|(kind, _)| *kind == EntityKind::Name || *kind == EntityKind::Acronym)
        .map(|(_, text)| text.to_lowercase())
        .collect();
    let source_words: HashSet<String> = features::content_words(source, 4)
        .into_iter()
        .filter(|w| !names.contains(w))
        .collect();

    let target_words = features::content_words(translated, 4);
    if target_words.is_empty() || source_words.is_empty() {
        return 0.0;
    }

    let copied = target_words.iter().filter(|w| source_words.contains(*w)).count();
    let ratio = copied as f32 / target_words.len() as f32;
    ((ratio - 0.2) / 0.5).clamp(0.0, 1.0)
}

/// Output identical to a source that has words in it, across different languages
fn is_untranslated(source: &str, translated: &str, source_lang: &str, target_lang: &str) -> bool {
    source == translated
        && canonical_code(source_lang) != canonical_code(target_lang)
        && source.chars().any(char::is_alphabetic)
}
