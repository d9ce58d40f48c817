/*!
 * Length-ratio expectations per language pair.
 *
 * Translations between some languages reliably grow or shrink, counted in
 * characters:
 * - Japanese → English: typically expands 1.5-2x
 * - English → Chinese: typically contracts 0.5-0.8x
 * - English → German: typically expands 1.1-1.3x
 *
 * Both fluency and accuracy use these bounds to penalize output whose length
 * does not fit the pair.
 */

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::language_utils::canonical_code;

/// Writing system of a language, as far as scoring cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Latin,
    Cyrillic,
    Greek,
    Arabic,
    Hebrew,
    Devanagari,
    Cjk,
    Thai,
    Other,
}

impl Script {
    /// Script of a language code; unknown codes are treated as Latin
    pub fn of(lang: &str) -> Self {
        match canonical_code(lang).as_str() {
            "ru" | "uk" | "bg" | "sr" | "mk" | "be" | "kk" | "mn" => Script::Cyrillic,
            "el" => Script::Greek,
            "ar" | "fa" | "ur" | "ps" => Script::Arabic,
            "he" | "yi" => Script::Hebrew,
            "hi" | "mr" | "ne" | "sa" => Script::Devanagari,
            "ja" | "zh" | "ko" | "yue" => Script::Cjk,
            "th" => Script::Thai,
            "am" | "hy" | "ka" | "bn" | "ta" | "te" | "km" | "my" | "si" => Script::Other,
            _ => Script::Latin,
        }
    }

    /// Whether proper names are normally written unchanged in this script
    pub fn keeps_latin_names(self) -> bool {
        self == Script::Latin
    }
}

/// Expected length ratio (translated chars / source chars) for a pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanguagePairThresholds {
    /// Minimum acceptable length ratio
    pub min_length_ratio: f32,
    /// Maximum acceptable length ratio
    pub max_length_ratio: f32,
    /// Typical ratio for this pair
    pub expected_ratio: f32,
}

impl Default for LanguagePairThresholds {
    fn default() -> Self {
        Self {
            min_length_ratio: 0.3,
            max_length_ratio: 3.0,
            expected_ratio: 1.0,
        }
    }
}

impl LanguagePairThresholds {
    /// Create thresholds with custom values
    pub fn new(min: f32, max: f32, expected: f32) -> Self {
        Self {
            min_length_ratio: min,
            max_length_ratio: max,
            expected_ratio: expected,
        }
    }

    /// Thresholds for a pair, falling back to loose defaults for unknown pairs.
    ///
    /// A pair of identical languages expects a ratio of one.
    pub fn for_pair(source_lang: &str, target_lang: &str) -> Self {
        let source = canonical_code(source_lang);
        let target = canonical_code(target_lang);
        if source == target {
            return Self::new(0.8, 1.25, 1.0);
        }

        PAIR_THRESHOLDS
            .get(format!("{}_{}", source, target).as_str())
            .copied()
            .unwrap_or_default()
    }

    /// Check if a length ratio is within acceptable bounds
    pub fn is_ratio_acceptable(&self, ratio: f32) -> bool {
        ratio >= self.min_length_ratio && ratio <= self.max_length_ratio
    }

    /// Distance from the expected ratio, 0.0 at expected and 1.0 at either bound
    pub fn deviation_from_expected(&self, ratio: f32) -> f32 {
        let range = if ratio < self.expected_ratio {
            self.expected_ratio - self.min_length_ratio
        } else {
            self.max_length_ratio - self.expected_ratio
        };

        if range > 0.0 {
            ((ratio - self.expected_ratio).abs() / range).min(1.0)
        } else {
            0.0
        }
    }

    /// Penalty in `[0, 1]` for a length ratio.
    ///
    /// Ratios inside the bounds cost at most 0.25; outside the bounds the
    /// penalty grows with the relative overshoot and reaches 1.0 at twice
    /// (or half) the bound.
    pub fn length_penalty(&self, ratio: f32) -> f32 {
        if !ratio.is_finite() {
            return 1.0;
        }
        if self.is_ratio_acceptable(ratio) {
            return 0.25 * self.deviation_from_expected(ratio);
        }

        let overshoot = if ratio < self.min_length_ratio {
            (self.min_length_ratio - ratio) / self.min_length_ratio.max(f32::EPSILON)
        } else {
            (ratio - self.max_length_ratio) / self.max_length_ratio.max(f32::EPSILON)
        };

        (0.25 + 0.75 * (overshoot * 2.0).min(1.0)).min(1.0)
    }
}

/// Calibrated thresholds for common language pairs
static PAIR_THRESHOLDS: LazyLock<HashMap<&'static str, LanguagePairThresholds>> =
    LazyLock::new(|| {
        let t = LanguagePairThresholds::new;
        HashMap::from([
            ("en_de", t(0.9, 1.4, 1.15)),
            ("en_fr", t(0.9, 1.3, 1.1)),
            ("en_es", t(0.9, 1.3, 1.1)),
            ("en_it", t(0.9, 1.3, 1.1)),
            ("en_pt", t(0.9, 1.3, 1.1)),
            ("en_nl", t(0.9, 1.3, 1.05)),
            ("en_ru", t(0.8, 1.3, 1.0)),
            ("en_ja", t(0.4, 0.9, 0.6)),
            ("en_zh", t(0.4, 0.8, 0.55)),
            ("en_ko", t(0.5, 1.0, 0.7)),
            ("en_ar", t(0.8, 1.4, 1.1)),
            ("en_hi", t(0.9, 1.5, 1.2)),
            ("en_pl", t(0.9, 1.4, 1.15)),
            ("en_tr", t(0.9, 1.4, 1.1)),
            ("en_vi", t(0.9, 1.5, 1.2)),
            ("ja_en", t(1.3, 2.5, 1.8)),
            ("ja_zh", t(0.7, 1.3, 0.95)),
            ("ja_ko", t(0.8, 1.4, 1.1)),
            ("zh_en", t(1.5, 3.0, 2.0)),
            ("zh_ja", t(0.9, 1.4, 1.1)),
            ("ko_en", t(1.2, 2.0, 1.5)),
            ("de_en", t(0.7, 1.1, 0.85)),
            ("de_fr", t(0.85, 1.2, 1.0)),
            ("fr_en", t(0.75, 1.1, 0.9)),
            ("fr_de", t(0.9, 1.3, 1.05)),
            ("es_en", t(0.75, 1.1, 0.9)),
            ("it_en", t(0.75, 1.1, 0.9)),
            ("pt_en", t(0.75, 1.1, 0.9)),
            ("ru_en", t(0.8, 1.3, 1.05)),
        ])
    });
