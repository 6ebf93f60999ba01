use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::quiz::QuizVariant;

pub const DEFAULT_RELAY_ENDPOINT: &str = "https://api.web3forms.com/submit";
pub const DEFAULT_RELAY_SUBJECT: &str = "New Sleep Assessment Submission";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub quiz: QuizConfig,
    pub relay: RelayConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let variant = match env::var("QUIZ_VARIANT") {
            Ok(raw) => raw
                .parse::<QuizVariant>()
                .map_err(|_| ConfigError::InvalidVariant(raw))?,
            Err(_) => QuizVariant::Assessment,
        };
        let auto_advance_delay = Duration::from_millis(read_number("QUIZ_AUTO_ADVANCE_MS", 500)?);
        let email_gate = read_flag("QUIZ_EMAIL_GATE", true)?;
        let email_cache = env::var("QUIZ_EMAIL_CACHE")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let relay = RelayConfig {
            endpoint: env::var("RELAY_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_RELAY_ENDPOINT.to_string()),
            access_key: env::var("RELAY_ACCESS_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            recipient: env::var("RELAY_RECIPIENT").unwrap_or_default(),
            subject: env::var("RELAY_SUBJECT")
                .unwrap_or_else(|_| DEFAULT_RELAY_SUBJECT.to_string()),
            timeout: Duration::from_secs(read_number("RELAY_TIMEOUT_SECS", 10)?),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            quiz: QuizConfig {
                variant,
                auto_advance_delay,
                email_gate,
                email_cache,
            },
            relay,
        })
    }
}

fn read_number(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

fn read_flag(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(raw) = env::var(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { key }),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Which questionnaire to run and how the widget flow behaves.
#[derive(Debug, Clone)]
pub struct QuizConfig {
    pub variant: QuizVariant,
    pub auto_advance_delay: Duration,
    pub email_gate: bool,
    pub email_cache: Option<PathBuf>,
}

/// Third-party form relay receiving gated submissions.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub endpoint: String,
    /// Submissions are skipped when no key is configured.
    pub access_key: Option<String>,
    pub recipient: String,
    pub subject: String,
    pub timeout: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidVariant(String),
    InvalidNumber { key: &'static str },
    InvalidFlag { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidVariant(value) => write!(
                f,
                "QUIZ_VARIANT '{}' must be 'assessment' or 'check'",
                value
            ),
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative integer")
            }
            ConfigError::InvalidFlag { key } => write!(f, "{key} must be true or false"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidVariant(_)
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidFlag { .. } => None,
        }
    }
}
