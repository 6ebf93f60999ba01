use serde::Serialize;

use super::catalog::{Question, QuestionId};
use super::definition::QuizResult;
use super::email::EmailError;
use super::navigation::NavigationControls;
use super::recommendations::Recommendation;

/// Progress indicator state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressView {
    pub position: usize,
    pub total: usize,
    pub fraction: f64,
    pub label: String,
}

/// Presentation layer driven by a quiz session.
///
/// The session only reads back the currently selected option; everything
/// else flows one way, from the session into the renderer.
pub trait Renderer {
    fn show_question(&mut self, position: usize, question: &Question);
    fn update_progress(&mut self, progress: &ProgressView);
    fn update_navigation_controls(&mut self, controls: NavigationControls);
    /// Raw value of the option currently selected for `question_id`.
    fn selected_option(&self, question_id: &QuestionId) -> Option<String>;
    fn show_email_gate(&mut self);
    /// The address was rejected; focus should return to the email input.
    fn email_rejected(&mut self, error: &EmailError);
    fn show_results(&mut self, result: &QuizResult);
    fn show_recommendations(&mut self, recommendations: &[Recommendation]);
}
