/*!
 * Quality scores and grades for translated chunks.
 *
 * A score has three dimensions:
 * - Fluency: how well-formed the translated text is on its own
 * - Accuracy: how much of the source content survived
 * - Consistency: agreement with earlier chunks of the same document
 *
 * The overall score is a weighted mean with non-negative weights, so raising
 * one dimension never lowers it. Grades band the overall score.
 */

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Letter grade for a quality score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Numeric rank, F lowest
    pub fn rank(self) -> u8 {
        match self {
            Grade::F => 0,
            Grade::D => 1,
            Grade::C => 2,
            Grade::B => 3,
            Grade::A => 4,
        }
    }

    /// Whether this grade is strictly worse than `other`
    pub fn is_below(self, other: Grade) -> bool {
        self.rank() < other.rank()
    }

    /// Letter for display
    pub fn as_char(self) -> char {
        match self {
            Grade::A => 'A',
            Grade::B => 'B',
            Grade::C => 'C',
            Grade::D => 'D',
            Grade::F => 'F',
        }
    }
}

impl Ord for Grade {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Grade {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Grade::A),
            "B" => Ok(Grade::B),
            "C" => Ok(Grade::C),
            "D" => Ok(Grade::D),
            "F" => Ok(Grade::F),
            other => Err(format!("Invalid grade: {}", other)),
        }
    }
}

/// Weights of each dimension in the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub fluency: f32,
    pub accuracy: f32,
    pub consistency: f32,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            fluency: 0.35,
            accuracy: 0.45,
            consistency: 0.20,
        }
    }
}

impl QualityWeights {
    /// Negative weights count as zero; all-zero weights fall back to equal weights.
    pub fn normalized(&self) -> (f32, f32, f32) {
        let f = self.fluency.max(0.0);
        let a = self.accuracy.max(0.0);
        let c = self.consistency.max(0.0);
        let total = f + a + c;

        if total > 0.0 {
            (f / total, a / total, c / total)
        } else {
            (1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0)
        }
    }
}

/// Lower bounds of each grade band on the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeThresholds {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self {
            a: 0.9,
            b: 0.8,
            c: 0.65,
            d: 0.5,
        }
    }
}

impl GradeThresholds {
    /// Band an overall score
    pub fn grade_for(&self, overall: f32) -> Grade {
        match overall {
            s if s >= self.a => Grade::A,
            s if s >= self.b => Grade::B,
            s if s >= self.c => Grade::C,
            s if s >= self.d => Grade::D,
            _ => Grade::F,
        }
    }

    /// Whether the bands are strictly decreasing inside `(0, 1]`
    pub fn is_valid(&self) -> bool {
        self.a <= 1.0 && self.a > self.b && self.b > self.c && self.c > self.d && self.d > 0.0
    }
}

/// Scoring configuration: dimension weights and grade bands.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub weights: QualityWeights,
    pub grades: GradeThresholds,
}

/// Quality score of one translated chunk (or an aggregate of several).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub fluency: f32,
    pub accuracy: f32,
    pub consistency: f32,
    pub overall: f32,
    pub grade: Grade,
}

impl QualityScore {
    /// Combine dimension scores into an overall score and grade.
    pub fn from_dimensions(fluency: f32, accuracy: f32, consistency: f32, config: &QualityConfig) -> Self {
        let fluency = sanitize(fluency);
        let accuracy = sanitize(accuracy);
        let consistency = sanitize(consistency);

        let (wf, wa, wc) = config.weights.normalized();
        let overall = (fluency * wf + accuracy * wa + consistency * wc).clamp(0.0, 1.0);

        Self {
            fluency,
            accuracy,
            consistency,
            overall,
            grade: config.grades.grade_for(overall),
        }
    }

    /// Score given to empty or unusable input
    pub fn zero() -> Self {
        Self {
            fluency: 0.0,
            accuracy: 0.0,
            consistency: 0.0,
            overall: 0.0,
            grade: Grade::F,
        }
    }

    /// Score given to text that needs no translation (whitespace-only chunks)
    pub fn perfect() -> Self {
        Self {
            fluency: 1.0,
            accuracy: 1.0,
            consistency: 1.0,
            overall: 1.0,
            grade: Grade::A,
        }
    }

    /// Length-weighted average of several scores.
    ///
    /// Each entry pairs a score with the length of the text it covers.
    pub fn weighted_average(scores: &[(QualityScore, usize)], config: &QualityConfig) -> Self {
        let total: usize = scores.iter().map(|(_, len)| (*len).max(1)).sum();
        if scores.is_empty() || total == 0 {
            return Self::perfect();
        }

        let mut fluency = 0.0;
        let mut accuracy = 0.0;
        let mut consistency = 0.0;
        let mut overall = 0.0;

        for (score, len) in scores {
            let w = (*len).max(1) as f32 / total as f32;
            fluency += score.fluency * w;
            accuracy += score.accuracy * w;
            consistency += score.consistency * w;
            overall += score.overall * w;
        }

        let overall = overall.clamp(0.0, 1.0);
        Self {
            fluency: fluency.clamp(0.0, 1.0),
            accuracy: accuracy.clamp(0.0, 1.0),
            consistency: consistency.clamp(0.0, 1.0),
            overall,
            grade: config.grades.grade_for(overall),
        }
    }

    /// Whether the grade is at least `minimum`
    pub fn meets(&self, minimum: Grade) -> bool {
        !self.grade.is_below(minimum)
    }

    /// Get the lowest scoring dimension.
    pub fn weakest_dimension(&self) -> &'static str {
        let scores = [
            (self.fluency, "fluency"),
            (self.accuracy, "accuracy"),
            (self.consistency, "consistency"),
        ];

        scores
            .iter()
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, name)| *name)
            .unwrap_or("unknown")
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Quality: {:.1}% (Grade: {}) fluency {:.2}, accuracy {:.2}, consistency {:.2}",
            self.overall * 100.0,
            self.grade,
            self.fluency,
            self.accuracy,
            self.consistency
        )
    }
}

fn sanitize(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
