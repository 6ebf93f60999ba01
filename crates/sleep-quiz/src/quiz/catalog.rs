use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Upper bound of the answer scale shared by every built-in question.
pub const DEFAULT_SCALE_MAX: u8 = 5;

/// Identifier wrapper for catalog questions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub String);

impl QuestionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single-choice quiz item answered on a `1..=scale_max` scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    pub weight: f64,
    pub scale_max: u8,
}

impl Question {
    pub fn new(id: &str, prompt: &str, weight: f64) -> Self {
        Self {
            id: QuestionId::new(id),
            prompt: prompt.to_string(),
            weight,
            scale_max: DEFAULT_SCALE_MAX,
        }
    }

    /// Whether `value` lies on this question's answer scale.
    pub fn accepts(&self, value: f64) -> bool {
        value.is_finite() && value >= 1.0 && value <= f64::from(self.scale_max)
    }
}

/// Ordered, immutable list of questions defined at configuration time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    pub fn new(questions: Vec<Question>) -> Result<Self, CatalogError> {
        if questions.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for question in &questions {
            if !seen.insert(question.id.clone()) {
                return Err(CatalogError::DuplicateId(question.id.clone()));
            }
            if !(question.weight.is_finite() && question.weight > 0.0) {
                return Err(CatalogError::NonPositiveWeight {
                    id: question.id.clone(),
                    weight: question.weight,
                });
            }
            if question.scale_max == 0 {
                return Err(CatalogError::EmptyScale(question.id.clone()));
            }
        }

        Ok(Self { questions })
    }

    /// Twelve weighted questions covering habits, environment and lifestyle.
    pub fn sleep_assessment() -> Self {
        Self {
            questions: sleep_assessment_questions(),
        }
    }

    /// Six equally weighted questions for the short check-up.
    pub fn sleep_check() -> Self {
        Self {
            questions: sleep_check_questions(),
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| &question.id == id)
    }

    pub fn contains(&self, id: &QuestionId) -> bool {
        self.get(id).is_some()
    }

    /// Looks up a question by its 1-based position.
    pub fn at_position(&self, position: usize) -> Option<&Question> {
        position
            .checked_sub(1)
            .and_then(|index| self.questions.get(index))
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CatalogError {
    #[error("a quiz needs at least one question")]
    Empty,
    #[error("question id '{0}' is defined more than once")]
    DuplicateId(QuestionId),
    #[error("question '{id}' has non-positive weight {weight}")]
    NonPositiveWeight { id: QuestionId, weight: f64 },
    #[error("question '{0}' has an empty answer scale")]
    EmptyScale(QuestionId),
}

fn sleep_assessment_questions() -> Vec<Question> {
    vec![
        Question::new(
            "sleep_duration",
            "How many hours of sleep do you usually get per night?",
            1.2,
        ),
        Question::new(
            "sleep_quality",
            "How would you rate the overall quality of your sleep?",
            1.5,
        ),
        Question::new(
            "sleep_onset",
            "How easily do you fall asleep once you go to bed?",
            1.0,
        ),
        Question::new(
            "night_wakings",
            "How rarely do you wake up during the night?",
            1.3,
        ),
        Question::new(
            "morning_energy",
            "How energized do you feel when you wake up?",
            1.4,
        ),
        Question::new(
            "room_temp",
            "How comfortable is the temperature of your bedroom at night?",
            0.8,
        ),
        Question::new(
            "light_exposure",
            "How dark is your bedroom while you sleep?",
            0.9,
        ),
        Question::new(
            "noise_level",
            "How quiet is your sleeping environment?",
            0.9,
        ),
        Question::new(
            "air_quality",
            "How fresh and clean is the air in your bedroom?",
            0.8,
        ),
        Question::new(
            "stress_level",
            "How relaxed do you feel in the evening before bed?",
            1.1,
        ),
        Question::new(
            "tech_use",
            "How well do you avoid screens in the hour before bed?",
            0.7,
        ),
        Question::new(
            "sleep_consistency",
            "How consistent are your bedtime and wake-up time?",
            1.0,
        ),
    ]
}

fn sleep_check_questions() -> Vec<Question> {
    vec![
        Question::new("q1", "How rested do you feel most mornings?", 1.0),
        Question::new("q2", "How quickly do you fall asleep?", 1.0),
        Question::new("q3", "How seldom do you wake up during the night?", 1.0),
        Question::new("q4", "How regular is your sleep schedule?", 1.0),
        Question::new("q5", "How alert are you during the afternoon?", 1.0),
        Question::new("q6", "How comfortable is your sleep environment?", 1.0),
    ]
}
