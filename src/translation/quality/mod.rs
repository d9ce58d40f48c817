/*!
 * Quality assessment for translated chunks.
 *
 * - **Metrics**: scores, grades and their configuration
 * - **Assessor**: fluency and accuracy heuristics
 * - **Consistency**: cross-chunk terminology, name and style tracking
 * - **Language pairs**: expected length ratios per language pair
 * - **Features**: surface features shared by the heuristics
 */

pub mod assessor;
pub mod consistency;
pub mod features;
pub mod language_pairs;
pub mod metrics;

pub use assessor::QualityAssessor;
pub use consistency::{ConsistencyReport, Glossary, StyleIssue, StyleProfile};
pub use language_pairs::{LanguagePairThresholds, Script};
pub use metrics::{Grade, GradeThresholds, QualityConfig, QualityScore, QualityWeights};
