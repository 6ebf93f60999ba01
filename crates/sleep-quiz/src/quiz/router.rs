use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::catalog::{Question, QuestionId};
use super::category::{Category, CategoryBasis};
use super::definition::QuizDefinition;
use super::scoring::ScoringPolicy;

/// Read-only description of the configured questionnaire.
#[derive(Debug, Serialize)]
pub struct QuizView<'a> {
    pub title: &'a str,
    pub policy: ScoringPolicy,
    pub category_basis: CategoryBasis,
    pub questions: &'a [Question],
    pub categories: &'a [Category],
}

impl<'a> QuizView<'a> {
    pub fn of(definition: &'a QuizDefinition) -> Self {
        Self {
            title: definition.title(),
            policy: definition.policy(),
            category_basis: definition.category_basis(),
            questions: definition.catalog().questions(),
            categories: definition.categories().entries(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub answers: BTreeMap<QuestionId, f64>,
}

/// Stateless endpoints over a quiz definition: catalog lookup and scoring.
pub fn quiz_router(definition: Arc<QuizDefinition>) -> Router {
    Router::new()
        .route("/api/v1/quiz", get(catalog_handler))
        .route("/api/v1/quiz/score", post(score_handler))
        .with_state(definition)
}

pub(crate) async fn catalog_handler(State(definition): State<Arc<QuizDefinition>>) -> Response {
    (StatusCode::OK, axum::Json(QuizView::of(&definition))).into_response()
}

pub(crate) async fn score_handler(
    State(definition): State<Arc<QuizDefinition>>,
    axum::Json(request): axum::Json<ScoreRequest>,
) -> Response {
    match definition.evaluate_values(request.answers) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => {
            debug!(%error, "score request rejected");
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
    }
}
