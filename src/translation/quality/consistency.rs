/*!
 * Cross-chunk consistency tracking.
 *
 * A `StyleProfile` accumulates what earlier chunks of a document did:
 * - Terminology: glossary renderings, seeded up front or learned on the way
 * - Names: entities that were carried over verbatim
 * - Punctuation: the quote style the translation settled on
 *
 * Later chunks are checked against that profile. The profile is built in
 * chunk index order so scores do not depend on the order in which the
 * backend answered.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::features::{self, EntityKind, QuoteStyle};

/// Source terms and the rendering the translation must use for them.
///
/// Source terms match case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Glossary {
    terms: BTreeMap<String, String>,
}

impl Glossary {
    /// Create an empty glossary
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a term
    pub fn add_term(&mut self, source: impl Into<String>, target: impl Into<String>) {
        let source = source.into().trim().to_string();
        if !source.is_empty() {
            self.terms.insert(source, target.into());
        }
    }

    /// Rendering for a source term
    pub fn get(&self, source: &str) -> Option<&str> {
        let wanted = source.trim().to_lowercase();
        self.terms
            .iter()
            .find(|(term, _)| term.to_lowercase() == wanted)
            .map(|(_, target)| target.as_str())
    }

    /// Whether the glossary has an entry for `source`
    pub fn contains_term(&self, source: &str) -> bool {
        self.get(source).is_some()
    }

    /// Iterate over `(source, target)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.terms.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl<S: Into<String>, T: Into<String>> FromIterator<(S, T)> for Glossary {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        let mut glossary = Glossary::new();
        for (source, target) in iter {
            glossary.add_term(source, target);
        }
        glossary
    }
}

/// Types of consistency issues.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleIssue {
    /// A glossary term was not rendered the agreed way
    InconsistentTerm {
        term: String,
        expected: String,
        found: Option<String>,
    },

    /// A term kept verbatim earlier was dropped or changed
    NameNotPreserved { name: String, found_as: Option<String> },

    /// Quote style differs from earlier chunks
    MixedQuoteStyles { expected: QuoteStyle, found: QuoteStyle },
}

impl StyleIssue {
    /// Severity of this issue (0.0 - 1.0).
    pub fn severity(&self) -> f32 {
        match self {
            StyleIssue::InconsistentTerm { .. } => 1.0,
            StyleIssue::NameNotPreserved { .. } => 0.8,
            StyleIssue::MixedQuoteStyles { .. } => 0.3,
        }
    }

    /// Get a description of this issue.
    pub fn description(&self) -> String {
        match self {
            StyleIssue::InconsistentTerm { term, expected, found } => match found {
                Some(found) => format!("Term '{}' rendered as '{}' instead of '{}'", term, found, expected),
                None => format!("Term '{}' should be rendered as '{}'", term, expected),
            },
            StyleIssue::NameNotPreserved { name, found_as } => match found_as {
                Some(found) => format!("Name '{}' changed to '{}'", name, found),
                None => format!("Name '{}' missing", name),
            },
            StyleIssue::MixedQuoteStyles { expected, found } => {
                format!("Quote style {:?} instead of {:?}", found, expected)
            }
        }
    }
}

/// Report of consistency check results.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencyReport {
    /// All issues found
    pub issues: Vec<StyleIssue>,

    /// Number of glossary terms checked
    pub terms_checked: usize,

    /// Number of preserved names checked
    pub names_checked: usize,

    /// Whether the quote style was compared
    pub quotes_checked: bool,

    /// Overall consistency score (0.0 - 1.0)
    pub score: f32,
}

impl ConsistencyReport {
    fn new() -> Self {
        Self {
            issues: Vec::new(),
            terms_checked: 0,
            names_checked: 0,
            quotes_checked: false,
            score: 1.0,
        }
    }

    fn calculate_score(&mut self) {
        let checks = self.terms_checked + self.names_checked + usize::from(self.quotes_checked);
        if self.issues.is_empty() || checks == 0 {
            self.score = 1.0;
            return;
        }

        let total_severity: f32 = self.issues.iter().map(|i| i.severity()).sum();
        self.score = (1.0 - total_severity / checks as f32).max(0.0);
    }

    /// Get issues by severity (highest first).
    pub fn issues_by_severity(&self) -> Vec<&StyleIssue> {
        let mut sorted: Vec<_> = self.issues.iter().collect();
        sorted.sort_by(|a, b| b.severity().total_cmp(&a.severity()));
        sorted
    }

    /// Get summary string, worst issues first.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Consistency: {:.1}% ({} issues, {} terms, {} names checked)",
            self.score * 100.0,
            self.issues.len(),
            self.terms_checked,
            self.names_checked
        );
        for issue in self.issues_by_severity() {
            summary.push_str("; ");
            summary.push_str(&issue.description());
        }
        summary
    }
}

/// Running record of how a document has been translated so far.
#[derive(Debug, Clone, Default)]
pub struct StyleProfile {
    glossary: Glossary,
    preserved: BTreeMap<String, usize>,
    quote_counts: BTreeMap<QuoteStyle, usize>,
    chunks_recorded: usize,
}

impl StyleProfile {
    /// Create an empty profile
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a profile seeded with a glossary
    pub fn with_glossary(glossary: Glossary) -> Self {
        Self {
            glossary,
            ..Self::default()
        }
    }

    /// Seeded and learned renderings
    pub fn glossary(&self) -> &Glossary {
        &self.glossary
    }

    /// Number of chunks recorded so far
    pub fn chunks_recorded(&self) -> usize {
        self.chunks_recorded
    }

    /// Whether `term` was carried over verbatim by an earlier chunk
    pub fn is_preserved(&self, term: &str) -> bool {
        self.preserved.contains_key(term)
    }

    /// Quote style used by most recorded chunks
    pub fn dominant_quote_style(&self) -> Option<QuoteStyle> {
        self.quote_counts
            .iter()
            .max_by_key(|(style, n)| (**n, std::cmp::Reverse(**style)))
            .map(|(style, _)| *style)
    }

    /// Check a translated chunk against the profile without changing it.
    pub fn check(&self, source: &str, translated: &str) -> ConsistencyReport {
        let mut report = ConsistencyReport::new();
        let source_lower = source.to_lowercase();
        let translated_lower = translated.to_lowercase();

        for (term, rendering) in self.glossary.iter() {
            if !contains_word(&source_lower, &term.to_lowercase()) {
                continue;
            }
            report.terms_checked += 1;
            if !translated_lower.contains(&rendering.to_lowercase()) {
                report.issues.push(StyleIssue::InconsistentTerm {
                    term: term.to_string(),
                    expected: rendering.to_string(),
                    found: find_similar_name(rendering, translated),
                });
            }
        }

        for (_, term) in features::entities(source) {
            if self.glossary.contains_term(&term) || !self.preserved.contains_key(&term) {
                continue;
            }
            report.names_checked += 1;
            if !translated.contains(&term) {
                report.issues.push(StyleIssue::NameNotPreserved {
                    found_as: find_similar_name(&term, translated),
                    name: term,
                });
            }
        }

        if let (Some(expected), Some(found)) =
            (self.dominant_quote_style(), features::quote_style(translated))
        {
            report.quotes_checked = true;
            if expected != found {
                report.issues.push(StyleIssue::MixedQuoteStyles { expected, found });
            }
        }

        report.calculate_score();
        report
    }

    /// Record a translated chunk.
    ///
    /// Entities carried over verbatim become preserved terms. A name that
    /// was replaced by a similar-looking name is learned as a glossary
    /// rendering so later chunks are held to it.
    pub fn record(&mut self, source: &str, translated: &str) {
        self.chunks_recorded += 1;

        for (kind, term) in features::entities(source) {
            if self.glossary.contains_term(&term) {
                continue;
            }
            if translated.contains(&term) {
                *self.preserved.entry(term).or_default() += 1;
            } else if kind == EntityKind::Name && !self.preserved.contains_key(&term) {
                if let Some(rendering) = find_similar_name(&term, translated) {
                    self.glossary.add_term(term, rendering);
                }
            }
        }

        if let Some(style) = features::quote_style(translated) {
            *self.quote_counts.entry(style).or_default() += 1;
        }
    }
}

/// Whether `word` occurs in `text` delimited by non-alphanumeric characters
fn contains_word(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    text.match_indices(word).any(|(idx, _)| {
        let before = text[..idx].chars().next_back();
        let after = text[idx + word.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Capitalized word of similar length sharing the first letter, if any
fn find_similar_name(name: &str, text: &str) -> Option<String> {
    let first = name.chars().next()?.to_lowercase().next()?;
    let name_len = name.chars().count();
    let tolerance = (name_len / 3).max(1);

    text.split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphabetic()))
        .filter(|word| !word.is_empty() && *word != name)
        .find(|word| {
            let mut chars = word.chars();
            let initial = chars.next();
            initial.is_some_and(char::is_uppercase)
                && initial.and_then(|c| c.to_lowercase().next()) == Some(first)
                && word.chars().count().abs_diff(name_len) <= tolerance
        })
        .map(str::to_string)
}
