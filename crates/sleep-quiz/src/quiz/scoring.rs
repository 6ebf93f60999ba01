use serde::{Deserialize, Serialize};

use super::answers::AnswerStore;
use super::catalog::QuestionCatalog;

/// Normalization scheme used to turn answers into a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Weighted sum over answered questions only, rounded half-up, with the
    /// display score projected onto `display_scale`.
    Weighted { display_scale: u32 },
    /// Flat sum against the full catalog maximum, truncated toward zero.
    Unweighted,
}

impl ScoringPolicy {
    pub const fn weighted(display_scale: u32) -> Self {
        Self::Weighted { display_scale }
    }
}

/// Outcome of scoring a finished questionnaire. Computed once at submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreResult {
    pub raw_weighted_sum: f64,
    pub max_possible_sum: f64,
    pub percentage: u8,
    pub display_score: u32,
}

/// Stateless scorer parameterized by a [`ScoringPolicy`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringEngine {
    policy: ScoringPolicy,
}

impl ScoringEngine {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ScoringPolicy {
        self.policy
    }

    pub fn score(&self, catalog: &QuestionCatalog, answers: &AnswerStore) -> ScoreResult {
        match self.policy {
            ScoringPolicy::Weighted { display_scale } => {
                score_weighted(catalog, answers, display_scale)
            }
            ScoringPolicy::Unweighted => score_unweighted(catalog, answers),
        }
    }
}

fn score_weighted(
    catalog: &QuestionCatalog,
    answers: &AnswerStore,
    display_scale: u32,
) -> ScoreResult {
    let (raw_weighted_sum, max_possible_sum) = catalog
        .questions()
        .iter()
        .filter_map(|question| {
            answers.get(&question.id).map(|value| {
                (
                    value * question.weight,
                    f64::from(question.scale_max) * question.weight,
                )
            })
        })
        .fold((0.0, 0.0), |(raw, max), (value, ceiling)| {
            (raw + value, max + ceiling)
        });

    let percentage = clamp_percentage(ratio_percent(raw_weighted_sum, max_possible_sum).round());
    let display_score = (f64::from(percentage) * f64::from(display_scale) / 100.0).round() as u32;

    ScoreResult {
        raw_weighted_sum,
        max_possible_sum,
        percentage,
        display_score,
    }
}

fn score_unweighted(catalog: &QuestionCatalog, answers: &AnswerStore) -> ScoreResult {
    let raw_weighted_sum: f64 = catalog
        .questions()
        .iter()
        .filter_map(|question| answers.get(&question.id))
        .sum();
    let max_possible_sum: f64 = catalog
        .questions()
        .iter()
        .map(|question| f64::from(question.scale_max))
        .sum();

    let percentage = clamp_percentage(ratio_percent(raw_weighted_sum, max_possible_sum).floor());
    let display_score = (f64::from(percentage) * max_possible_sum / 100.0).floor() as u32;

    ScoreResult {
        raw_weighted_sum,
        max_possible_sum,
        percentage,
        display_score,
    }
}

// Multiplying before dividing keeps integral ratios exact so floor() does not
// drop a point on values like 29/100.
fn ratio_percent(raw: f64, max: f64) -> f64 {
    if max > 0.0 {
        raw * 100.0 / max
    } else {
        0.0
    }
}

fn clamp_percentage(value: f64) -> u8 {
    if value.is_nan() {
        0
    } else {
        value.clamp(0.0, 100.0) as u8
    }
}
