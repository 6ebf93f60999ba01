use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::answers::{AnswerError, AnswerParsing, AnswerStore};
use super::catalog::{QuestionCatalog, QuestionId};
use super::category::{Category, CategoryBasis, CategoryTable};
use super::recommendations::{Recommendation, RecommendationEngine};
use super::scoring::{ScoreResult, ScoringEngine, ScoringPolicy};

/// Built-in questionnaires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizVariant {
    /// Twelve weighted questions with recommendations.
    Assessment,
    /// Six-question flat-sum check-up.
    Check,
}

impl FromStr for QuizVariant {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "assessment" | "weighted" => Ok(Self::Assessment),
            "check" | "simple" | "unweighted" => Ok(Self::Check),
            other => Err(format!("unknown quiz variant '{other}'")),
        }
    }
}

/// Everything needed to score and classify one questionnaire.
#[derive(Debug, Clone)]
pub struct QuizDefinition {
    title: String,
    catalog: QuestionCatalog,
    parsing: AnswerParsing,
    scoring: ScoringEngine,
    categories: CategoryTable,
    basis: CategoryBasis,
    recommendations: Option<RecommendationEngine>,
}

/// Final view model handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizResult {
    pub score: ScoreResult,
    pub category: Category,
    pub recommendations: Vec<Recommendation>,
}

impl QuizDefinition {
    /// Percentage-basis categories, real-valued answers and no recommendations
    /// until configured otherwise.
    pub fn new(title: impl Into<String>, catalog: QuestionCatalog, policy: ScoringPolicy) -> Self {
        Self {
            title: title.into(),
            catalog,
            parsing: AnswerParsing::Real,
            scoring: ScoringEngine::new(policy),
            categories: CategoryTable::sleep_percentage(),
            basis: CategoryBasis::Percentage,
            recommendations: None,
        }
    }

    pub fn with_parsing(mut self, parsing: AnswerParsing) -> Self {
        self.parsing = parsing;
        self
    }

    pub fn with_categories(mut self, categories: CategoryTable, basis: CategoryBasis) -> Self {
        self.categories = categories;
        self.basis = basis;
        self
    }

    pub fn with_recommendations(mut self, engine: RecommendationEngine) -> Self {
        self.recommendations = Some(engine);
        self
    }

    pub fn sleep_assessment() -> Self {
        Self::new(
            "Sleep Quality Assessment",
            QuestionCatalog::sleep_assessment(),
            ScoringPolicy::weighted(60),
        )
        .with_parsing(AnswerParsing::Integer)
        .with_categories(
            CategoryTable::sleep_display_score(),
            CategoryBasis::DisplayScore,
        )
        .with_recommendations(RecommendationEngine::sleep_assessment())
    }

    pub fn sleep_check() -> Self {
        Self::new(
            "Sleep Check",
            QuestionCatalog::sleep_check(),
            ScoringPolicy::Unweighted,
        )
    }

    pub fn for_variant(variant: QuizVariant) -> Self {
        match variant {
            QuizVariant::Assessment => Self::sleep_assessment(),
            QuizVariant::Check => Self::sleep_check(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn parsing(&self) -> AnswerParsing {
        self.parsing
    }

    pub fn policy(&self) -> ScoringPolicy {
        self.scoring.policy()
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    pub fn category_basis(&self) -> CategoryBasis {
        self.basis
    }

    pub fn recommendations(&self) -> Option<&RecommendationEngine> {
        self.recommendations.as_ref()
    }

    pub fn score(&self, answers: &AnswerStore) -> ScoreResult {
        self.scoring.score(&self.catalog, answers)
    }

    pub fn classify(&self, score: &ScoreResult) -> &Category {
        self.categories.classify(self.basis.value_of(score))
    }

    pub fn evaluate(&self, answers: &AnswerStore) -> QuizResult {
        let score = self.score(answers);
        let category = self.classify(&score).clone();
        let recommendations = self
            .recommendations
            .as_ref()
            .map(|engine| engine.recommend(answers))
            .unwrap_or_default();

        QuizResult {
            score,
            category,
            recommendations,
        }
    }

    /// Normalizes numeric answers with this definition's parsing rule,
    /// validates them against the catalog and evaluates them.
    pub fn evaluate_values<I>(&self, values: I) -> Result<QuizResult, AnswerError>
    where
        I: IntoIterator<Item = (QuestionId, f64)>,
    {
        let answers = AnswerStore::from_values(&self.catalog, self.parsing, values)?;
        Ok(self.evaluate(&answers))
    }
}
