use metrics_exporter_prometheus::PrometheusHandle;
use sleep_quiz::config::QuizConfig;
use sleep_quiz::quiz::{EmailStore, FileEmailStore, NoEmailStore, QuestionId, QuizVariant};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// File-backed cache when `QUIZ_EMAIL_CACHE` is set, otherwise nothing is kept.
pub(crate) fn email_store(config: &QuizConfig) -> Arc<dyn EmailStore> {
    match &config.email_cache {
        Some(path) => Arc::new(FileEmailStore::new(path.clone())),
        None => Arc::new(NoEmailStore),
    }
}

pub(crate) fn parse_variant(raw: &str) -> Result<QuizVariant, String> {
    raw.parse::<QuizVariant>()
}

/// Parses an `id=value` command-line answer.
pub(crate) fn parse_answer(raw: &str) -> Result<(QuestionId, f64), String> {
    let (id, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected id=value, got '{raw}'"))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("missing question id in '{raw}'"));
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("failed to parse '{value}' as a number ({err})"))?;
    Ok((QuestionId::new(id), value))
}
