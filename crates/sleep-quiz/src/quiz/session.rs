use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::answers::{AnswerError, AnswerStore};
use super::clock::{Clock, PendingAdvance, SystemClock};
use super::definition::{QuizDefinition, QuizResult};
use super::email::{EmailAddress, EmailError, EmailStore, NoEmailStore};
use super::navigation::{Navigation, NavigationError};
use super::renderer::{ProgressView, Renderer};
use super::submission::{PageContext, SubmissionOutcome, SubmissionPayload, Submitter};
use crate::config::{QuizConfig, RelayConfig};

/// Behavior switches for a single quiz session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub auto_advance_delay: Duration,
    pub email_gate: bool,
    pub submission_timeout: Duration,
    pub page: PageContext,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            auto_advance_delay: Duration::from_millis(500),
            email_gate: true,
            submission_timeout: Duration::from_secs(10),
            page: PageContext::default(),
        }
    }
}

impl SessionSettings {
    pub fn from_config(quiz: &QuizConfig, relay: &RelayConfig, page: PageContext) -> Self {
        Self {
            auto_advance_delay: quiz.auto_advance_delay,
            email_gate: quiz.email_gate,
            submission_timeout: relay.timeout,
            page,
        }
    }
}

/// Where the visitor is in the widget flow.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    Answering,
    AwaitingEmail,
    Revealed(QuizResult),
}

impl SessionPhase {
    fn label(&self) -> &'static str {
        match self {
            SessionPhase::Answering => "answering",
            SessionPhase::AwaitingEmail => "awaiting email",
            SessionPhase::Revealed(_) => "showing results",
        }
    }
}

/// One visitor's pass through a questionnaire.
///
/// Owns its answers and position exclusively; the renderer and submitter
/// are injected capabilities. All methods run to completion before the next
/// UI event is handled, so no interior locking is needed.
pub struct QuizSession<R, S> {
    definition: Arc<QuizDefinition>,
    renderer: R,
    submitter: S,
    email_store: Arc<dyn EmailStore>,
    clock: Arc<dyn Clock>,
    settings: SessionSettings,
    answers: AnswerStore,
    navigation: Navigation,
    pending_advance: Option<PendingAdvance>,
    phase: SessionPhase,
}

impl<R, S> QuizSession<R, S>
where
    R: Renderer,
    S: Submitter,
{
    pub fn new(
        definition: Arc<QuizDefinition>,
        renderer: R,
        submitter: S,
        settings: SessionSettings,
    ) -> Result<Self, QuizError> {
        let navigation = Navigation::new(definition.catalog().len())?;
        Ok(Self {
            definition,
            renderer,
            submitter,
            email_store: Arc::new(NoEmailStore),
            clock: Arc::new(SystemClock::new()),
            settings,
            answers: AnswerStore::new(),
            navigation,
            pending_advance: None,
            phase: SessionPhase::Answering,
        })
    }

    pub fn with_email_store(mut self, store: Arc<dyn EmailStore>) -> Self {
        self.email_store = store;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn definition(&self) -> &QuizDefinition {
        &self.definition
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn pending_advance(&self) -> Option<PendingAdvance> {
        self.pending_advance
    }

    pub fn result(&self) -> Option<&QuizResult> {
        match &self.phase {
            SessionPhase::Revealed(result) => Some(result),
            _ => None,
        }
    }

    /// Renders the first question.
    pub fn start(&mut self) {
        self.render_position();
    }

    /// Handles an option change event by scheduling the auto-advance
    /// continuation. With a zero delay the continuation runs immediately.
    pub fn option_selected(&mut self) -> Result<(), QuizError> {
        self.ensure_phase("select an option", SessionPhase::is_answering)?;

        let due = self.clock.now() + self.settings.auto_advance_delay;
        self.pending_advance = Some(PendingAdvance {
            due,
            position: self.navigation.current(),
        });
        debug!(position = self.navigation.current(), ?due, "auto-advance scheduled");

        if self.settings.auto_advance_delay.is_zero() {
            self.tick();
        }
        Ok(())
    }

    /// Fires the pending auto-advance if its due time has passed. Returns
    /// whether a continuation ran.
    pub fn tick(&mut self) -> bool {
        let Some(pending) = self.pending_advance else {
            return false;
        };
        if !pending.is_due(self.clock.now()) {
            return false;
        }
        self.pending_advance = None;

        if !self.phase.is_answering() || pending.position != self.navigation.current() {
            debug!(position = pending.position, "stale auto-advance dropped");
            return false;
        }

        if self.navigation.is_last() {
            let mut controls = self.navigation.controls();
            controls.show_submit = true;
            self.renderer.update_navigation_controls(controls);
        } else {
            self.next();
        }
        true
    }

    /// Saves the current selection and moves forward. No-op at the last
    /// question or outside the answering phase.
    pub fn next(&mut self) -> bool {
        if !self.phase.is_answering() || self.navigation.is_last() {
            return false;
        }
        self.save_current_answer();
        self.pending_advance = None;
        self.navigation.advance();
        self.render_position();
        true
    }

    /// Saves the current selection and moves back. No-op at the first
    /// question or outside the answering phase.
    pub fn previous(&mut self) -> bool {
        if !self.phase.is_answering() || self.navigation.is_first() {
            return false;
        }
        self.save_current_answer();
        self.pending_advance = None;
        self.navigation.retreat();
        self.render_position();
        true
    }

    /// Finishes the questionnaire. With the email gate enabled this only
    /// shows the gate and returns `None`; otherwise results are revealed.
    pub fn submit(&mut self) -> Result<Option<QuizResult>, QuizError> {
        self.ensure_phase("submit", SessionPhase::is_answering)?;
        if !self.navigation.is_last() {
            return Err(QuizError::NotAtLastQuestion {
                position: self.navigation.current(),
                total: self.navigation.total(),
            });
        }

        self.save_current_answer();
        self.pending_advance = None;

        if self.settings.email_gate {
            self.phase = SessionPhase::AwaitingEmail;
            self.renderer.show_email_gate();
            return Ok(None);
        }

        let result = self.definition.evaluate(&self.answers);
        Ok(Some(self.reveal(result)))
    }

    /// Validates the address, caches it, forwards the answers and reveals the
    /// results. Only an invalid address keeps the gate closed; relay
    /// failures and timeouts are logged and the results shown anyway.
    pub async fn submit_email(&mut self, raw_email: &str) -> Result<QuizResult, QuizError> {
        self.ensure_phase("submit an email", |phase| {
            matches!(phase, SessionPhase::AwaitingEmail)
        })?;

        let email = match EmailAddress::parse(raw_email.trim()) {
            Ok(email) => email,
            Err(err) => {
                debug!(%err, "email rejected at gate");
                self.renderer.email_rejected(&err);
                return Err(err.into());
            }
        };

        if let Err(err) = self.email_store.remember(&email) {
            debug!(%err, "email cache unavailable");
        }

        let result = self.definition.evaluate(&self.answers);
        let payload = SubmissionPayload {
            email,
            percentage: result.score.percentage,
            display_score: result.score.display_score,
            category: result.category.title.clone(),
            answers: self.answers.clone(),
            page: self.settings.page.clone(),
            submitted_at: Utc::now(),
        };

        let outcome = match tokio::time::timeout(
            self.settings.submission_timeout,
            self.submitter.submit(&payload),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => SubmissionOutcome::TimedOut,
        };
        log_outcome(&outcome);

        Ok(self.reveal(result))
    }

    fn save_current_answer(&mut self) {
        let Some(question) = self
            .definition
            .catalog()
            .at_position(self.navigation.current())
        else {
            return;
        };
        let selected = self.renderer.selected_option(&question.id);
        let recorded = self.answers.record_answer(
            self.definition.catalog(),
            self.definition.parsing(),
            &question.id,
            selected.as_deref(),
        );
        if let Err(err) = recorded {
            warn!(%err, "selected option ignored");
        }
    }

    fn render_position(&mut self) {
        let position = self.navigation.current();
        if let Some(question) = self.definition.catalog().at_position(position) {
            self.renderer.show_question(position, question);
        }
        self.renderer.update_progress(&ProgressView {
            position,
            total: self.navigation.total(),
            fraction: self.navigation.progress_fraction(),
            label: self.navigation.progress_label(),
        });
        self.renderer
            .update_navigation_controls(self.navigation.controls());
    }

    fn reveal(&mut self, result: QuizResult) -> QuizResult {
        info!(
            quiz = self.definition.title(),
            answered = self.answers.len(),
            percentage = result.score.percentage,
            display_score = result.score.display_score,
            category = %result.category.title,
            "quiz results revealed"
        );
        self.renderer.show_results(&result);
        if !result.recommendations.is_empty() {
            self.renderer.show_recommendations(&result.recommendations);
        }
        self.phase = SessionPhase::Revealed(result.clone());
        result
    }

    fn ensure_phase(
        &self,
        action: &'static str,
        allowed: impl Fn(&SessionPhase) -> bool,
    ) -> Result<(), QuizError> {
        if allowed(&self.phase) {
            Ok(())
        } else {
            Err(QuizError::WrongPhase {
                action,
                phase: self.phase.label(),
            })
        }
    }
}

impl SessionPhase {
    fn is_answering(&self) -> bool {
        matches!(self, SessionPhase::Answering)
    }
}

fn log_outcome(outcome: &SubmissionOutcome) {
    match outcome {
        SubmissionOutcome::Delivered => info!("quiz submission delivered"),
        SubmissionOutcome::Skipped => debug!("quiz submission skipped, relay not configured"),
        SubmissionOutcome::NetworkError(message) => {
            error!(%message, "quiz submission failed")
        }
        SubmissionOutcome::NonSuccessResponse { status, message } => {
            warn!(status, ?message, "quiz submission not accepted by relay")
        }
        SubmissionOutcome::TimedOut => warn!("quiz submission timed out"),
    }
}

/// Error raised by quiz session operations.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum QuizError {
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    InvalidEmail(#[from] EmailError),
    #[error("cannot {action} while {phase}")]
    WrongPhase {
        action: &'static str,
        phase: &'static str,
    },
    #[error("results can only be submitted from the last question ({position} of {total})")]
    NotAtLastQuestion { position: usize, total: usize },
}
