/*!
 * Tests for translation quality scoring
 */

use adaptrans::providers::mock::pseudo_translate;
use adaptrans::translation::quality::{
    Glossary, Grade, GradeThresholds, QualityAssessor, QualityConfig, QualityScore, QualityWeights,
    StyleProfile,
};

use crate::common::sample_text;

/// The mock's pseudo-translation is good enough to pass every default minimum
#[test]
fn test_assess_withPseudoTranslation_shouldGradeA() {
    let assessor = QualityAssessor::default();
    let source = sample_text(600);
    let score = assessor.assess(&source, &pseudo_translate(&source), "en", "fr");
    assert_eq!(score.grade, Grade::A, "{}", score.summary());
}

/// Echoed output is never acceptable across languages
#[test]
fn test_assess_withEchoedText_shouldGradeF() {
    let assessor = QualityAssessor::default();
    let source = sample_text(600);
    let score = assessor.assess(&source, &source, "en", "fr");
    assert_eq!(score.grade, Grade::F);
    assert_eq!(score.accuracy, 0.0);
}

/// An empty translation scores zero
#[test]
fn test_assess_withEmptyTranslation_shouldScoreZero() {
    let score = QualityAssessor::default().assess("Some text to translate.", "", "en", "fr");
    assert_eq!(score, QualityScore::zero());
    assert_eq!(score.grade, Grade::F);
}

/// Same input, same score
#[test]
fn test_assess_calledRepeatedly_shouldBeDeterministic() {
    let assessor = QualityAssessor::default();
    let source = sample_text(1_200);
    let translated = pseudo_translate(&source);

    let first = assessor.assess(&source, &translated, "en", "de");
    for _ in 0..5 {
        assert_eq!(assessor.assess(&source, &translated, "en", "de"), first);
    }
}

/// Every dimension stays within [0, 1]
#[test]
fn test_assess_withOddInputs_shouldStayInRange() {
    let assessor = QualityAssessor::default();
    let cases = [
        ("Short.", "Une traduction beaucoup trop longue pour une phrase aussi courte que celle-ci."),
        ("A long sentence with many words that ends up as almost nothing.", "Rien."),
        ("Numbers 1 2 3 4 5.", "Nombres."),
        ("(unbalanced", "((((("),
    ];

    for (source, translated) in cases {
        let score = assessor.assess(source, translated, "en", "fr");
        for value in [score.fluency, score.accuracy, score.consistency, score.overall] {
            assert!((0.0..=1.0).contains(&value), "{} -> {}: {:?}", source, translated, score);
        }
    }
}

/// A glossary term rendered differently lowers consistency
#[test]
fn test_assessAgainst_withGlossaryViolation_shouldLowerConsistency() {
    let assessor = QualityAssessor::default();
    let mut glossary = Glossary::new();
    glossary.add_term("board", "conseil");
    let profile = StyleProfile::with_glossary(glossary);

    let source = "The board met on Friday.";
    let kept = assessor.assess_against(source, "Le conseil s'est réuni vendredi.", "en", "fr", &profile);
    let broken = assessor.assess_against(source, "Le comité s'est réuni vendredi.", "en", "fr", &profile);

    assert_eq!(kept.consistency, 1.0);
    assert!(broken.consistency < kept.consistency);
}

/// Overall never decreases when one dimension improves
#[test]
fn test_fromDimensions_shouldBeMonotonic() {
    let config = QualityConfig::default();
    let steps = [0.0, 0.25, 0.5, 0.75, 1.0];

    for &a in &steps {
        for &c in &steps {
            let mut previous = -1.0;
            for &f in &steps {
                let overall = QualityScore::from_dimensions(f, a, c, &config).overall;
                assert!(overall >= previous);
                previous = overall;
            }
        }
    }
}

/// Custom thresholds change the banding
#[test]
fn test_gradeThresholds_custom_shouldBandAccordingly() {
    let config = QualityConfig {
        weights: QualityWeights::default(),
        grades: GradeThresholds {
            a: 0.99,
            b: 0.97,
            c: 0.93,
            d: 0.85,
        },
    };

    let score = QualityScore::from_dimensions(0.95, 0.95, 0.95, &config);
    assert_eq!(score.grade, Grade::C);
    assert_eq!(
        QualityScore::from_dimensions(0.95, 0.95, 0.95, &QualityConfig::default()).grade,
        Grade::A
    );
}

/// Longer chunks weigh more in the document score
#[test]
fn test_weightedAverage_shouldWeighByLength() {
    let config = QualityConfig::default();
    let good = QualityScore::perfect();
    let bad = QualityScore::zero();

    let mostly_good = QualityScore::weighted_average(&[(good, 900), (bad, 100)], &config);
    assert!((mostly_good.overall - 0.9).abs() < 1e-4);
    assert_eq!(mostly_good.grade, Grade::A);

    assert_eq!(QualityScore::weighted_average(&[], &config), QualityScore::perfect());
}

/// Grades parse from letters
#[test]
fn test_grade_fromStr_shouldAcceptLetters() {
    assert_eq!("b".parse::<Grade>(), Ok(Grade::B));
    assert!("Z".parse::<Grade>().is_err());
    assert!(Grade::F.is_below(Grade::D));
    assert!(!Grade::A.is_below(Grade::D));
}
