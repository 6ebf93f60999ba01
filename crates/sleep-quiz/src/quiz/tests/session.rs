use super::common::*;
use std::sync::Arc;
use std::time::Duration;

use crate::quiz::catalog::QuestionId;
use crate::quiz::definition::QuizDefinition;
use crate::quiz::email::{EmailAddress, EmailStore};
use crate::quiz::navigation::NavigationControls;
use crate::quiz::session::{QuizError, SessionPhase};
use crate::quiz::submission::SubmissionOutcome;

fn delivered() -> ScriptedSubmitter {
    ScriptedSubmitter::new(SubmissionOutcome::Delivered)
}

#[test]
fn start_renders_first_question_and_controls() {
    let Harness { session, .. } = harness(QuizDefinition::sleep_check(), delivered(), settings(false));
    let renderer = session.renderer();

    assert_eq!(
        renderer.events.first(),
        Some(&RenderEvent::Question(1, QuestionId::from("q1")))
    );
    let progress = renderer.last_progress().expect("progress rendered");
    assert_eq!(progress.label, "Question 1 of 6");
    assert_eq!(progress.total, 6);
    assert_eq!(
        renderer.last_controls(),
        Some(NavigationControls {
            show_previous: false,
            show_next: true,
            show_submit: false,
        })
    );
}

#[test]
fn option_selection_advances_after_delay() {
    let Harness {
        mut session, clock, ..
    } = harness(QuizDefinition::sleep_check(), delivered(), settings(false));

    session.renderer_mut().select("q1", "4");
    session.option_selected().expect("answering");
    assert!(session.pending_advance().is_some());

    clock.advance(Duration::from_millis(499));
    assert!(!session.tick(), "continuation fired early");
    assert_eq!(session.navigation().current(), 1);

    clock.advance(Duration::from_millis(1));
    assert!(session.tick());
    assert_eq!(session.navigation().current(), 2);
    assert_eq!(session.answers().get(&QuestionId::from("q1")), Some(4.0));
    assert!(session.pending_advance().is_none());
}

#[test]
fn zero_delay_advances_immediately() {
    let mut config = settings(false);
    config.auto_advance_delay = Duration::ZERO;
    let Harness { mut session, .. } = harness(QuizDefinition::sleep_check(), delivered(), config);

    session.renderer_mut().select("q1", "2");
    session.option_selected().expect("answering");

    assert_eq!(session.navigation().current(), 2);
    assert_eq!(session.answers().get(&QuestionId::from("q1")), Some(2.0));
}

#[test]
fn manual_navigation_cancels_pending_advance() {
    let Harness {
        mut session, clock, ..
    } = harness(QuizDefinition::sleep_check(), delivered(), settings(false));

    session.renderer_mut().select("q1", "3");
    session.option_selected().expect("answering");
    assert!(session.next());

    clock.advance(Duration::from_secs(1));
    assert!(!session.tick());
    assert_eq!(session.navigation().current(), 2);
}

#[test]
fn selection_on_last_question_reveals_submit() {
    let Harness {
        mut session, clock, ..
    } = harness(QuizDefinition::sleep_check(), delivered(), settings(false));
    answer_all(&mut session, &["5", "5", "5", "5", "5", "5"]);
    assert!(session.navigation().is_last());

    session.option_selected().expect("answering");
    clock.advance(Duration::from_millis(500));
    assert!(session.tick());

    assert_eq!(session.navigation().current(), 6);
    assert_eq!(
        session.renderer().last_controls(),
        Some(NavigationControls {
            show_previous: true,
            show_next: false,
            show_submit: true,
        })
    );
    assert_eq!(session.phase(), &SessionPhase::Answering);
}

#[test]
fn previous_saves_current_selection() {
    let Harness { mut session, .. } = harness(QuizDefinition::sleep_check(), delivered(), settings(false));
    answer_and_next(&mut session, "5");
    session.renderer_mut().select("q2", "4");

    assert!(session.previous());
    assert_eq!(session.navigation().current(), 1);
    assert_eq!(session.answers().get(&QuestionId::from("q2")), Some(4.0));
    assert!(!session.previous(), "already at first question");
}

#[test]
fn next_is_noop_on_last_question() {
    let Harness { mut session, .. } = harness(QuizDefinition::sleep_check(), delivered(), settings(false));
    answer_all(&mut session, &["1", "1", "1", "1", "1", "1"]);
    assert!(!session.next());
    assert_eq!(session.navigation().current(), 6);
}

#[test]
fn unparseable_selection_is_ignored() {
    let Harness { mut session, .. } = harness(QuizDefinition::sleep_check(), delivered(), settings(false));
    session.renderer_mut().select("q1", "often");
    assert!(session.next());

    assert!(session.answers().is_empty());
    assert_eq!(session.navigation().current(), 2);
}

#[test]
fn submit_requires_last_question() {
    let Harness { mut session, .. } = harness(QuizDefinition::sleep_check(), delivered(), settings(false));
    let err = session.submit().expect_err("not at last question");
    assert_eq!(
        err,
        QuizError::NotAtLastQuestion {
            position: 1,
            total: 6,
        }
    );
}

#[test]
fn ungated_check_reveals_on_submit() {
    let Harness { mut session, .. } = harness(QuizDefinition::sleep_check(), delivered(), settings(false));
    answer_all(&mut session, &["5", "5", "5", "1", "1", "1"]);

    let result = session
        .submit()
        .expect("submit succeeds")
        .expect("results revealed without gate");

    assert_eq!(result.score.percentage, 60);
    assert_eq!(result.category.title, "Fair Sleep Quality");
    assert_eq!(session.result(), Some(&result));
    let renderer = session.renderer();
    assert_eq!(
        renderer.count(|event| matches!(event, RenderEvent::Results(_))),
        1
    );
    assert_eq!(
        renderer.count(|event| matches!(event, RenderEvent::Recommendations(_))),
        0,
        "check has no recommendation table"
    );
}

#[test]
fn revealed_session_rejects_further_input() {
    let Harness { mut session, .. } = harness(QuizDefinition::sleep_check(), delivered(), settings(false));
    answer_all(&mut session, &["3", "3", "3", "3", "3", "3"]);
    session.submit().expect("submit succeeds");

    assert!(matches!(
        session.option_selected(),
        Err(QuizError::WrongPhase { .. })
    ));
    assert!(!session.previous());
    assert!(matches!(
        session.submit(),
        Err(QuizError::WrongPhase { .. })
    ));
}

#[tokio::test]
async fn gated_assessment_forwards_answers_and_reveals() {
    let submitter = delivered();
    let Harness {
        mut session,
        emails,
        ..
    } = harness(
        QuizDefinition::sleep_assessment(),
        submitter.clone(),
        settings(true),
    );
    answer_all(&mut session, &["3"; 12]);

    assert_eq!(session.submit().expect("gate shown"), None);
    assert_eq!(session.phase(), &SessionPhase::AwaitingEmail);
    assert!(session
        .renderer()
        .events
        .contains(&RenderEvent::EmailGate));

    let result = session
        .submit_email(" visitor@example.com ")
        .await
        .expect("valid email");

    assert_eq!(result.score.percentage, 60);
    assert_eq!(result.score.display_score, 36);
    assert_eq!(result.category.title, "Fair Sleep Quality");
    assert_eq!(result.recommendations.len(), 1);

    let payloads = submitter.payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].email.as_str(), "visitor@example.com");
    assert_eq!(payloads[0].percentage, 60);
    assert_eq!(payloads[0].category, "Fair Sleep Quality");
    assert_eq!(payloads[0].answers.len(), 12);

    assert_eq!(
        emails.recall().expect("store readable"),
        Some(EmailAddress::parse("visitor@example.com").expect("valid"))
    );
    assert_eq!(
        session
            .renderer()
            .count(|event| matches!(event, RenderEvent::Recommendations(_))),
        1
    );
}

#[tokio::test]
async fn invalid_email_keeps_gate_closed() {
    let submitter = delivered();
    let Harness { mut session, .. } =
        harness(QuizDefinition::sleep_check(), submitter.clone(), settings(true));
    answer_all(&mut session, &["4", "4", "4", "4", "4", "4"]);
    session.submit().expect("gate shown");

    let err = session
        .submit_email("not-an-email")
        .await
        .expect_err("invalid email");

    assert!(matches!(err, QuizError::InvalidEmail(_)));
    assert_eq!(session.phase(), &SessionPhase::AwaitingEmail);
    assert_eq!(
        session
            .renderer()
            .count(|event| matches!(event, RenderEvent::EmailRejected(_))),
        1
    );
    assert!(submitter.payloads().is_empty());
}

#[tokio::test]
async fn relay_failure_still_reveals_results() {
    let submitter = ScriptedSubmitter::new(SubmissionOutcome::NonSuccessResponse {
        status: 400,
        message: Some("invalid access key".to_string()),
    });
    let Harness { mut session, .. } =
        harness(QuizDefinition::sleep_check(), submitter, settings(true));
    answer_all(&mut session, &["2", "2", "2", "2", "2", "2"]);
    session.submit().expect("gate shown");

    let result = session
        .submit_email("a@b.co")
        .await
        .expect("results revealed");

    assert_eq!(result.score.percentage, 40);
    assert_eq!(result.category.title, "Poor Sleep Quality");
    assert!(matches!(session.phase(), SessionPhase::Revealed(_)));
}

#[tokio::test]
async fn network_error_still_reveals_results() {
    let submitter = ScriptedSubmitter::new(SubmissionOutcome::NetworkError(
        "connection refused".to_string(),
    ));
    let Harness { mut session, .. } =
        harness(QuizDefinition::sleep_check(), submitter.clone(), settings(true));
    answer_all(&mut session, &["3", "3", "3", "3", "3", "3"]);
    session.submit().expect("gate shown");

    let result = session
        .submit_email("a@b.co")
        .await
        .expect("results revealed");

    assert_eq!(result.score.percentage, 60);
    assert_eq!(submitter.payloads().len(), 1);
    assert!(matches!(session.phase(), SessionPhase::Revealed(_)));
    assert_eq!(
        session
            .renderer()
            .count(|event| matches!(event, RenderEvent::Results(_))),
        1
    );
}

#[tokio::test]
async fn email_cache_failure_does_not_block_results() {
    let submitter = delivered();
    let Harness { session, .. } =
        harness(QuizDefinition::sleep_check(), submitter.clone(), settings(true));
    let mut session = session.with_email_store(Arc::new(FailingEmailStore));
    answer_all(&mut session, &["4", "4", "4", "4", "4", "4"]);
    session.submit().expect("gate shown");

    let result = session
        .submit_email("visitor@example.com")
        .await
        .expect("results revealed");

    assert_eq!(result.score.percentage, 80);
    let payloads = submitter.payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].email.as_str(), "visitor@example.com");
    assert!(matches!(session.phase(), SessionPhase::Revealed(_)));
}

#[tokio::test]
async fn hanging_relay_times_out_and_reveals() {
    let mut config = settings(true);
    config.submission_timeout = Duration::from_millis(20);
    let Harness { mut session, .. } =
        harness(QuizDefinition::sleep_check(), HangingSubmitter, config);
    answer_all(&mut session, &["5", "5", "5", "5", "5", "5"]);
    session.submit().expect("gate shown");

    let result = session
        .submit_email("a@b.co")
        .await
        .expect("results revealed after timeout");

    assert_eq!(result.score.percentage, 100);
    assert_eq!(result.category.title, "Excellent Sleep Quality");
}

#[tokio::test]
async fn email_outside_gate_is_wrong_phase() {
    let Harness { mut session, .. } = harness(QuizDefinition::sleep_check(), delivered(), settings(true));
    let err = session
        .submit_email("a@b.co")
        .await
        .expect_err("gate not shown yet");
    assert_eq!(
        err,
        QuizError::WrongPhase {
            action: "submit an email",
            phase: "answering",
        }
    );
}
