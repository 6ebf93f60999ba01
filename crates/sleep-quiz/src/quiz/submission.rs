use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::answers::AnswerStore;
use super::email::EmailAddress;
use crate::config::RelayConfig;

/// Where the quiz was taken from, forwarded with each submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    pub page_url: String,
    pub user_agent: String,
}

/// Data captured by the email gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionPayload {
    pub email: EmailAddress,
    pub percentage: u8,
    pub display_score: u32,
    pub category: String,
    pub answers: AnswerStore,
    pub page: PageContext,
    pub submitted_at: DateTime<Utc>,
}

/// Settled state of a submission attempt. None of these block the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Delivered,
    /// No relay is configured.
    Skipped,
    NetworkError(String),
    NonSuccessResponse {
        status: u16,
        message: Option<String>,
    },
    TimedOut,
}

impl SubmissionOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SubmissionOutcome::Delivered)
    }
}

/// Delivers gated quiz answers to an external endpoint.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, payload: &SubmissionPayload) -> SubmissionOutcome;
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("relay is not configured")]
    Disabled,
    #[error("relay transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("relay declined submission with status {status}")]
    Declined {
        status: StatusCode,
        message: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    access_key: &'a str,
    recipient: &'a str,
    subject: &'a str,
    from_name: &'static str,
    email: &'a str,
    score_percentage: u8,
    display_score: u32,
    category: &'a str,
    answers: String,
    page_url: &'a str,
    user_agent: &'a str,
    submitted_at: String,
}

#[derive(Debug, Deserialize)]
struct RelayResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
}

/// JSON client for a Web3Forms-style form relay.
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: Client,
    config: RelayConfig,
}

impl RelayClient {
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn enabled(&self) -> bool {
        self.config.access_key.is_some()
    }

    /// Posts the payload and checks the relay's `success` flag.
    pub async fn deliver(&self, payload: &SubmissionPayload) -> Result<(), RelayError> {
        let access_key = self
            .config
            .access_key
            .as_deref()
            .ok_or(RelayError::Disabled)?;

        let body = RelayRequest {
            access_key,
            recipient: &self.config.recipient,
            subject: &self.config.subject,
            from_name: "Sleep Quality Assessment",
            email: payload.email.as_str(),
            score_percentage: payload.percentage,
            display_score: payload.display_score,
            category: &payload.category,
            answers: payload.answers.to_json_string(),
            page_url: &payload.page.page_url,
            user_agent: &payload.page.user_agent,
            submitted_at: payload.submitted_at.to_rfc3339(),
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let parsed = response.json::<RelayResponse>().await;
        match parsed {
            Ok(RelayResponse {
                success: Some(true),
                ..
            }) if status.is_success() => Ok(()),
            Ok(RelayResponse { message, .. }) => Err(RelayError::Declined { status, message }),
            Err(err) => Err(RelayError::Declined {
                status,
                message: Some(format!("unreadable relay response: {err}")),
            }),
        }
    }
}

#[async_trait]
impl Submitter for RelayClient {
    async fn submit(&self, payload: &SubmissionPayload) -> SubmissionOutcome {
        match self.deliver(payload).await {
            Ok(()) => SubmissionOutcome::Delivered,
            Err(RelayError::Disabled) => SubmissionOutcome::Skipped,
            Err(RelayError::Transport(err)) if err.is_timeout() => SubmissionOutcome::TimedOut,
            Err(RelayError::Transport(err)) => SubmissionOutcome::NetworkError(err.to_string()),
            Err(RelayError::Declined { status, message }) => {
                SubmissionOutcome::NonSuccessResponse {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }
}
