use crate::infra::{email_store, parse_answer, parse_variant};
use clap::Args;
use sleep_quiz::config::AppConfig;
use sleep_quiz::error::AppError;
use sleep_quiz::quiz::{
    EmailError, NavigationControls, PageContext, ProgressView, Question, QuestionId,
    QuizDefinition, QuizError, QuizResult, QuizSession, QuizVariant, Recommendation, RelayClient,
    Renderer, SessionPhase, SessionSettings, Submitter,
};
use sleep_quiz::telemetry;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::debug;

#[derive(Args, Debug, Default)]
pub(crate) struct TakeArgs {
    /// Questionnaire to take (assessment or check). Defaults to QUIZ_VARIANT.
    #[arg(long, value_parser = parse_variant)]
    pub(crate) variant: Option<QuizVariant>,
    /// Reveal results without asking for an email address
    #[arg(long)]
    pub(crate) skip_email: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Questionnaire the answers belong to (assessment or check)
    #[arg(long, value_parser = parse_variant, default_value = "assessment")]
    pub(crate) variant: QuizVariant,
    /// Print the result as JSON
    #[arg(long)]
    pub(crate) json: bool,
    /// Answers as `id=value`, e.g. `sleep_quality=4`
    #[arg(value_parser = parse_answer)]
    pub(crate) answers: Vec<(QuestionId, f64)>,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        variant,
        json,
        answers,
    } = args;

    let definition = QuizDefinition::for_variant(variant);
    let result = definition.evaluate_values(answers)?;

    if json {
        let body = serde_json::to_string_pretty(&result).map_err(std::io::Error::other)?;
        println!("{body}");
    } else {
        let mut stdout = std::io::stdout().lock();
        write_result(&mut stdout, definition.title(), &result)?;
    }
    Ok(())
}

pub(crate) async fn run_take(args: TakeArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let variant = args.variant.unwrap_or(config.quiz.variant);
    let definition = Arc::new(QuizDefinition::for_variant(variant));
    let relay = RelayClient::new(config.relay.clone())?;
    if !relay.enabled() {
        debug!("RELAY_ACCESS_KEY not set; submissions will be skipped");
    }

    let page = PageContext {
        page_url: "cli://take".to_string(),
        user_agent: format!("sleep-quiz-api/{}", env!("CARGO_PKG_VERSION")),
    };
    let mut settings = SessionSettings::from_config(&config.quiz, &config.relay, page);
    if args.skip_email {
        settings.email_gate = false;
    }

    let mut session = QuizSession::new(
        definition,
        TerminalRenderer::new(std::io::stdout()),
        relay,
        settings,
    )?
    .with_email_store(email_store(&config.quiz));

    let stdin = std::io::stdin();
    drive(&mut session, stdin.lock()).await
}

/// Feeds terminal input into a session until results are shown or input
/// runs out.
///
/// A digit selects that option and lets the auto-advance delay elapse;
/// `n`, `p` and `s` press next, previous and submit; `q` quits.
pub(crate) async fn drive<W, S, I>(
    session: &mut QuizSession<TerminalRenderer<W>, S>,
    input: I,
) -> Result<(), AppError>
where
    W: Write,
    S: Submitter,
    I: BufRead,
{
    session.start();
    session.renderer_mut().prompt();
    let delay = session.settings().auto_advance_delay;

    for line in input.lines() {
        let line = line?;
        let command = line.trim();

        match session.phase() {
            SessionPhase::AwaitingEmail => match session.submit_email(command).await {
                Ok(_) => return Ok(()),
                Err(QuizError::InvalidEmail(_)) => {}
                Err(other) => return Err(other.into()),
            },
            SessionPhase::Revealed(_) => return Ok(()),
            SessionPhase::Answering => match command {
                "q" | "quit" => return Ok(()),
                "n" | "next" => {
                    session.next();
                }
                "p" | "prev" | "previous" => {
                    session.previous();
                }
                "s" | "submit" => match session.submit() {
                    Ok(Some(_)) => return Ok(()),
                    Ok(None) => {}
                    Err(QuizError::NotAtLastQuestion { .. }) => {
                        session
                            .renderer_mut()
                            .notice("Answer the remaining questions first.");
                    }
                    Err(other) => return Err(other.into()),
                },
                choice
                    if accepts_choice(
                        session.definition(),
                        session.navigation().current(),
                        choice,
                    ) =>
                {
                    session.renderer_mut().choose(choice);
                    session.option_selected()?;
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    session.tick();
                }
                other => {
                    session
                        .renderer_mut()
                        .notice(&format!("'{other}' is not an option here."));
                }
            },
        }
        session.renderer_mut().prompt();
    }

    Ok(())
}

fn accepts_choice(definition: &QuizDefinition, position: usize, raw: &str) -> bool {
    definition
        .catalog()
        .at_position(position)
        .zip(definition.parsing().parse(raw))
        .is_some_and(|(question, value)| question.accepts(value))
}

/// Line-oriented rendition of the quiz widget.
pub(crate) struct TerminalRenderer<W> {
    out: W,
    current: Option<QuestionId>,
    selection: Option<(QuestionId, String)>,
    gate_open: bool,
    submit_visible: bool,
}

impl<W: Write> TerminalRenderer<W> {
    pub(crate) fn new(out: W) -> Self {
        Self {
            out,
            current: None,
            selection: None,
            gate_open: false,
            submit_visible: false,
        }
    }

    fn choose(&mut self, raw: &str) {
        if let Some(id) = &self.current {
            self.selection = Some((id.clone(), raw.to_string()));
        }
    }

    fn notice(&mut self, text: &str) {
        self.line(text);
    }

    fn prompt(&mut self) {
        let text = if self.gate_open {
            "Enter your email to see your results:".to_string()
        } else if self.submit_visible {
            "[1-5] answer  [p] previous  [s] submit  [q] quit".to_string()
        } else {
            "[1-5] answer  [n] next  [p] previous  [q] quit".to_string()
        };
        self.line(&text);
    }

    fn line(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{text}") {
            debug!(%err, "terminal write failed");
        }
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn show_question(&mut self, position: usize, question: &Question) {
        self.current = Some(question.id.clone());
        self.line("");
        self.line(&format!("{position}. {}", question.prompt));
        self.line(&format!("   (1 = worst ... {} = best)", question.scale_max));
    }

    fn update_progress(&mut self, progress: &ProgressView) {
        self.line(&format!(
            "   {} [{:.0}%]",
            progress.label,
            progress.fraction * 100.0
        ));
    }

    fn update_navigation_controls(&mut self, controls: NavigationControls) {
        self.submit_visible = controls.show_submit;
    }

    fn selected_option(&self, question_id: &QuestionId) -> Option<String> {
        self.selection
            .as_ref()
            .filter(|(id, _)| id == question_id)
            .map(|(_, raw)| raw.clone())
    }

    fn show_email_gate(&mut self) {
        self.gate_open = true;
        self.line("");
        self.line("Your results are ready.");
    }

    fn email_rejected(&mut self, error: &EmailError) {
        self.line(&format!("{error}. Please try again."));
    }

    fn show_results(&mut self, result: &QuizResult) {
        self.gate_open = false;
        self.line("");
        if let Err(err) = write_summary(&mut self.out, result) {
            debug!(%err, "terminal write failed");
        }
    }

    fn show_recommendations(&mut self, recommendations: &[Recommendation]) {
        if let Err(err) = write_recommendations(&mut self.out, recommendations) {
            debug!(%err, "terminal write failed");
        }
    }
}

fn write_result<W: Write>(out: &mut W, title: &str, result: &QuizResult) -> std::io::Result<()> {
    writeln!(out, "{title}")?;
    write_summary(out, result)?;
    if !result.recommendations.is_empty() {
        write_recommendations(out, &result.recommendations)?;
    }
    Ok(())
}

fn write_summary<W: Write>(out: &mut W, result: &QuizResult) -> std::io::Result<()> {
    writeln!(
        out,
        "Score: {}% (display score {})",
        result.score.percentage, result.score.display_score
    )?;
    writeln!(out, "{}", result.category.title)?;
    writeln!(out, "  {}", result.category.description)
}

fn write_recommendations<W: Write>(
    out: &mut W,
    recommendations: &[Recommendation],
) -> std::io::Result<()> {
    writeln!(out, "\nRecommendations:")?;
    for recommendation in recommendations {
        writeln!(out, "- {}: {}", recommendation.title, recommendation.description)?;
    }
    Ok(())
}
