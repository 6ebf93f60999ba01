use serde::{Deserialize, Serialize};

use super::answers::AnswerStore;
use super::catalog::{QuestionCatalog, QuestionId};

/// Answers at or below this value trigger a rule.
pub const DEFAULT_TRIGGER_THRESHOLD: f64 = 2.0;

/// Remediation tip shown alongside the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
}

impl Recommendation {
    fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

/// Emits its recommendation when the answer to `question_id` is low.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRule {
    pub question_id: QuestionId,
    pub threshold: f64,
    pub recommendation: Recommendation,
}

impl RecommendationRule {
    pub fn new(question_id: &str, title: &str, description: &str) -> Self {
        Self {
            question_id: QuestionId::new(question_id),
            threshold: DEFAULT_TRIGGER_THRESHOLD,
            recommendation: Recommendation::new(title, description),
        }
    }

    /// Unanswered questions never trigger.
    pub fn triggers(&self, answers: &AnswerStore) -> bool {
        answers
            .get(&self.question_id)
            .map(|value| value <= self.threshold)
            .unwrap_or(false)
    }
}

/// Ordered rule list plus the entry returned when nothing triggers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationEngine {
    rules: Vec<RecommendationRule>,
    fallback: Recommendation,
}

impl RecommendationEngine {
    pub fn new(
        catalog: &QuestionCatalog,
        rules: Vec<RecommendationRule>,
        fallback: Recommendation,
    ) -> Result<Self, RecommendationError> {
        if let Some(rule) = rules.iter().find(|rule| !catalog.contains(&rule.question_id)) {
            return Err(RecommendationError::UnknownQuestion(rule.question_id.clone()));
        }
        Ok(Self { rules, fallback })
    }

    pub fn sleep_assessment() -> Self {
        Self {
            rules: sleep_assessment_rules(),
            fallback: maintain_current_habits(),
        }
    }

    pub fn rules(&self) -> &[RecommendationRule] {
        &self.rules
    }

    /// Triggered recommendations in rule order, or the fallback entry when no
    /// rule fires. An engine without rules yields nothing so callers can hide
    /// the recommendations section.
    pub fn recommend(&self, answers: &AnswerStore) -> Vec<Recommendation> {
        if self.rules.is_empty() {
            return Vec::new();
        }

        let triggered: Vec<Recommendation> = self
            .rules
            .iter()
            .filter(|rule| rule.triggers(answers))
            .map(|rule| rule.recommendation.clone())
            .collect();

        if triggered.is_empty() {
            vec![self.fallback.clone()]
        } else {
            triggered
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecommendationError {
    #[error("recommendation rule references unknown question '{0}'")]
    UnknownQuestion(QuestionId),
}

pub fn maintain_current_habits() -> Recommendation {
    Recommendation::new(
        "Maintain Current Habits",
        "Your sleep habits are good. Continue your current routine and consider professional monitoring for optimization.",
    )
}

fn sleep_assessment_rules() -> Vec<RecommendationRule> {
    vec![
        RecommendationRule::new(
            "sleep_duration",
            "Optimize Sleep Duration",
            "Aim for 7-9 hours of sleep per night. Create a consistent bedtime routine to ensure adequate rest.",
        ),
        RecommendationRule::new(
            "room_temp",
            "Improve Room Temperature",
            "Keep your bedroom between 60-67°F (15-19°C) for optimal sleep. Consider a fan or air conditioning.",
        ),
        RecommendationRule::new(
            "light_exposure",
            "Reduce Light Exposure",
            "Use blackout curtains or an eye mask. Avoid bright lights 1 hour before bedtime.",
        ),
        RecommendationRule::new(
            "noise_level",
            "Minimize Noise",
            "Use earplugs or white noise machines. Consider soundproofing your bedroom.",
        ),
        RecommendationRule::new(
            "air_quality",
            "Improve Air Quality",
            "Ensure proper ventilation. Consider an air purifier and regular cleaning to reduce allergens.",
        ),
        RecommendationRule::new(
            "tech_use",
            "Limit Technology Use",
            "Avoid screens 1 hour before bed. Keep devices out of the bedroom or use blue light filters.",
        ),
        RecommendationRule::new(
            "stress_level",
            "Manage Stress",
            "Practice relaxation techniques like meditation or deep breathing before bedtime.",
        ),
        RecommendationRule::new(
            "sleep_consistency",
            "Maintain Consistent Schedule",
            "Go to bed and wake up at the same time every day, even on weekends.",
        ),
    ]
}
