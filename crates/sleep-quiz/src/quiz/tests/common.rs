use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::quiz::catalog::{Question, QuestionId};
use crate::quiz::clock::ManualClock;
use crate::quiz::definition::{QuizDefinition, QuizResult};
use crate::quiz::email::{
    EmailAddress, EmailError, EmailStore, EmailStoreError, MemoryEmailStore,
};
use crate::quiz::navigation::NavigationControls;
use crate::quiz::recommendations::Recommendation;
use crate::quiz::renderer::{ProgressView, Renderer};
use crate::quiz::session::{QuizSession, SessionSettings};
use crate::quiz::submission::{SubmissionOutcome, SubmissionPayload, Submitter};

#[derive(Debug, Clone, PartialEq)]
pub(super) enum RenderEvent {
    Question(usize, QuestionId),
    Progress(ProgressView),
    Controls(NavigationControls),
    EmailGate,
    EmailRejected(String),
    Results(QuizResult),
    Recommendations(Vec<Recommendation>),
}

/// Records every render call and serves selections set by the test.
#[derive(Debug, Default)]
pub(super) struct RecordingRenderer {
    pub(super) events: Vec<RenderEvent>,
    selections: HashMap<QuestionId, String>,
}

impl RecordingRenderer {
    pub(super) fn select(&mut self, question_id: &str, value: &str) {
        self.selections
            .insert(QuestionId::from(question_id), value.to_string());
    }

    pub(super) fn last_controls(&self) -> Option<NavigationControls> {
        self.events.iter().rev().find_map(|event| match event {
            RenderEvent::Controls(controls) => Some(*controls),
            _ => None,
        })
    }

    pub(super) fn last_progress(&self) -> Option<&ProgressView> {
        self.events.iter().rev().find_map(|event| match event {
            RenderEvent::Progress(progress) => Some(progress),
            _ => None,
        })
    }

    pub(super) fn count(&self, matches: impl Fn(&RenderEvent) -> bool) -> usize {
        self.events.iter().filter(|event| matches(event)).count()
    }
}

impl Renderer for RecordingRenderer {
    fn show_question(&mut self, position: usize, question: &Question) {
        self.events
            .push(RenderEvent::Question(position, question.id.clone()));
    }

    fn update_progress(&mut self, progress: &ProgressView) {
        self.events.push(RenderEvent::Progress(progress.clone()));
    }

    fn update_navigation_controls(&mut self, controls: NavigationControls) {
        self.events.push(RenderEvent::Controls(controls));
    }

    fn selected_option(&self, question_id: &QuestionId) -> Option<String> {
        self.selections.get(question_id).cloned()
    }

    fn show_email_gate(&mut self) {
        self.events.push(RenderEvent::EmailGate);
    }

    fn email_rejected(&mut self, error: &EmailError) {
        self.events.push(RenderEvent::EmailRejected(error.to_string()));
    }

    fn show_results(&mut self, result: &QuizResult) {
        self.events.push(RenderEvent::Results(result.clone()));
    }

    fn show_recommendations(&mut self, recommendations: &[Recommendation]) {
        self.events
            .push(RenderEvent::Recommendations(recommendations.to_vec()));
    }
}

/// Returns a fixed outcome and keeps every payload it was handed.
#[derive(Debug, Clone)]
pub(super) struct ScriptedSubmitter {
    outcome: SubmissionOutcome,
    payloads: Arc<Mutex<Vec<SubmissionPayload>>>,
}

impl ScriptedSubmitter {
    pub(super) fn new(outcome: SubmissionOutcome) -> Self {
        Self {
            outcome,
            payloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(super) fn payloads(&self) -> Vec<SubmissionPayload> {
        self.payloads.lock().expect("payload mutex poisoned").clone()
    }
}

#[async_trait]
impl Submitter for ScriptedSubmitter {
    async fn submit(&self, payload: &SubmissionPayload) -> SubmissionOutcome {
        self.payloads
            .lock()
            .expect("payload mutex poisoned")
            .push(payload.clone());
        self.outcome.clone()
    }
}

/// Never settles.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct HangingSubmitter;

#[async_trait]
impl Submitter for HangingSubmitter {
    async fn submit(&self, _payload: &SubmissionPayload) -> SubmissionOutcome {
        std::future::pending::<SubmissionOutcome>().await
    }
}

/// Email cache whose writes always fail.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct FailingEmailStore;

impl EmailStore for FailingEmailStore {
    fn remember(&self, _email: &EmailAddress) -> Result<(), EmailStoreError> {
        Err(EmailStoreError::Unavailable("storage disabled".to_string()))
    }

    fn recall(&self) -> Result<Option<EmailAddress>, EmailStoreError> {
        Err(EmailStoreError::Unavailable("storage disabled".to_string()))
    }
}

pub(super) fn settings(email_gate: bool) -> SessionSettings {
    SessionSettings {
        auto_advance_delay: Duration::from_millis(500),
        email_gate,
        submission_timeout: Duration::from_secs(5),
        ..SessionSettings::default()
    }
}

pub(super) struct Harness<S> {
    pub(super) session: QuizSession<RecordingRenderer, S>,
    pub(super) clock: Arc<ManualClock>,
    pub(super) emails: Arc<MemoryEmailStore>,
}

pub(super) fn harness<S: Submitter>(
    definition: QuizDefinition,
    submitter: S,
    settings: SessionSettings,
) -> Harness<S> {
    let clock = Arc::new(ManualClock::new());
    let emails = Arc::new(MemoryEmailStore::default());
    let mut session = QuizSession::new(
        Arc::new(definition),
        RecordingRenderer::default(),
        submitter,
        settings,
    )
    .expect("session builds")
    .with_clock(clock.clone())
    .with_email_store(emails.clone());
    session.start();
    Harness {
        session,
        clock,
        emails,
    }
}

/// Selects `value` on the current question and moves on with the next
/// control, leaving the session on the question after it.
pub(super) fn answer_and_next<S: Submitter>(
    session: &mut QuizSession<RecordingRenderer, S>,
    value: &str,
) {
    let position = session.navigation().current();
    let id = session
        .definition()
        .catalog()
        .at_position(position)
        .expect("question at position")
        .id
        .clone();
    session.renderer_mut().select(id.as_str(), value);
    session.next();
}

/// Selects one value per question, ending on the last question with its
/// selection in place but not yet saved.
pub(super) fn answer_all<S: Submitter>(
    session: &mut QuizSession<RecordingRenderer, S>,
    values: &[&str],
) {
    let last = values.len() - 1;
    for value in &values[..last] {
        answer_and_next(session, value);
    }
    let id = session
        .definition()
        .catalog()
        .at_position(session.navigation().current())
        .expect("last question")
        .id
        .clone();
    session.renderer_mut().select(id.as_str(), values[last]);
}
