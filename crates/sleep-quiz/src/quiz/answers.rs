use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::catalog::{QuestionCatalog, QuestionId};

/// How a renderer-reported option value is turned into a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerParsing {
    /// Leading integer digits only; `"4"` and `"4.7"` both record 4.
    Integer,
    /// Full decimal value.
    Real,
}

impl AnswerParsing {
    pub fn parse(self, raw: &str) -> Option<f64> {
        let raw = raw.trim();
        match self {
            AnswerParsing::Integer => parse_leading_integer(raw),
            AnswerParsing::Real => raw.parse::<f64>().ok().filter(|value| value.is_finite()),
        }
    }

    /// Applies the same rule to an already-numeric answer, so `2.5` scores
    /// as 2 under [`AnswerParsing::Integer`] just like the option text would.
    pub fn normalize(self, value: f64) -> f64 {
        match self {
            AnswerParsing::Integer => value.trunc(),
            AnswerParsing::Real => value,
        }
    }
}

fn parse_leading_integer(raw: &str) -> Option<f64> {
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let end = digits
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<f64>().ok().map(|value| sign * value)
}

/// Per-session record of answered questions. Unanswered questions are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnswerStore {
    values: BTreeMap<QuestionId, f64>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the parsed value for `question_id`, replacing any earlier answer.
    ///
    /// `None` means the renderer reported no selection; nothing is stored and
    /// `Ok(None)` is returned.
    pub fn record_answer(
        &mut self,
        catalog: &QuestionCatalog,
        parsing: AnswerParsing,
        question_id: &QuestionId,
        raw_value: Option<&str>,
    ) -> Result<Option<f64>, AnswerError> {
        let Some(raw_value) = raw_value else {
            return Ok(None);
        };

        let question = catalog
            .get(question_id)
            .ok_or_else(|| AnswerError::UnknownQuestion(question_id.clone()))?;

        let value = parsing
            .parse(raw_value)
            .ok_or_else(|| AnswerError::Unparseable {
                id: question_id.clone(),
                raw: raw_value.to_string(),
            })?;

        if !question.accepts(value) {
            return Err(AnswerError::OutOfRange {
                id: question_id.clone(),
                value,
                scale_max: question.scale_max,
            });
        }

        let previous = self.values.insert(question_id.clone(), value);
        debug!(question = %question_id, value, ?previous, "answer recorded");
        Ok(Some(value))
    }

    /// Builds a store from already-numeric answers, normalizing each entry
    /// with `parsing` before validating it.
    pub fn from_values<I>(
        catalog: &QuestionCatalog,
        parsing: AnswerParsing,
        values: I,
    ) -> Result<Self, AnswerError>
    where
        I: IntoIterator<Item = (QuestionId, f64)>,
    {
        let mut store = Self::new();
        for (id, value) in values {
            if !value.is_finite() {
                return Err(AnswerError::Unparseable {
                    id,
                    raw: value.to_string(),
                });
            }
            let value = parsing.normalize(value);
            let question = catalog
                .get(&id)
                .ok_or_else(|| AnswerError::UnknownQuestion(id.clone()))?;
            if !question.accepts(value) {
                return Err(AnswerError::OutOfRange {
                    id,
                    value,
                    scale_max: question.scale_max,
                });
            }
            store.values.insert(id, value);
        }
        Ok(store)
    }

    pub fn get(&self, question_id: &QuestionId) -> Option<f64> {
        self.values.get(question_id).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, f64)> {
        self.values.iter().map(|(id, value)| (id, *value))
    }

    /// JSON object of `id -> value`, as forwarded to the form relay. Whole
    /// values are written as integers.
    pub fn to_json_string(&self) -> String {
        let values: serde_json::Map<String, serde_json::Value> = self
            .values
            .iter()
            .map(|(id, value)| (id.to_string(), json_number(*value)))
            .collect();
        serde_json::Value::Object(values).to_string()
    }
}

fn json_number(value: f64) -> serde_json::Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        serde_json::Value::from(value as i64)
    } else {
        serde_json::Value::from(value)
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AnswerError {
    #[error("question '{0}' is not part of this quiz")]
    UnknownQuestion(QuestionId),
    #[error("answer '{raw}' for question '{id}' is not a number")]
    Unparseable { id: QuestionId, raw: String },
    #[error("answer {value} for question '{id}' is outside 1..={scale_max}")]
    OutOfRange {
        id: QuestionId,
        value: f64,
        scale_max: u8,
    },
}
