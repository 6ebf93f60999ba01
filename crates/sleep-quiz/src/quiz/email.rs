use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

/// Loosely validated address: `local@domain.tld` with no whitespace and a
/// single `@`. Not RFC 5322.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        if is_valid_email(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(EmailError::Invalid(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_valid_email(&value) {
            Ok(Self(value))
        } else {
            Err(EmailError::Invalid(value))
        }
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

pub fn is_valid_email(raw: &str) -> bool {
    if raw.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Some dot must have at least one character on each side.
    domain
        .char_indices()
        .any(|(index, ch)| ch == '.' && index > 0 && index + 1 < domain.len())
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("'{0}' is not a valid email address")]
    Invalid(String),
}

/// Best-effort cache of the address a visitor entered at the gate.
pub trait EmailStore: Send + Sync {
    fn remember(&self, email: &EmailAddress) -> Result<(), EmailStoreError>;
    fn recall(&self) -> Result<Option<EmailAddress>, EmailStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EmailStoreError {
    #[error("email cache io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("email cache is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("email cache unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedEmail {
    email: EmailAddress,
    saved_at: DateTime<Utc>,
}

/// Stores the last address as a small JSON document on disk.
#[derive(Debug, Clone)]
pub struct FileEmailStore {
    path: PathBuf,
}

impl FileEmailStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EmailStore for FileEmailStore {
    fn remember(&self, email: &EmailAddress) -> Result<(), EmailStoreError> {
        let entry = CachedEmail {
            email: email.clone(),
            saved_at: Utc::now(),
        };
        let body = serde_json::to_vec_pretty(&entry)?;
        std::fs::write(&self.path, body)?;
        Ok(())
    }

    fn recall(&self) -> Result<Option<EmailAddress>, EmailStoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => {
                let entry: CachedEmail = serde_json::from_slice(&bytes)?;
                Ok(Some(entry.email))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryEmailStore {
    email: Mutex<Option<EmailAddress>>,
}

impl EmailStore for MemoryEmailStore {
    fn remember(&self, email: &EmailAddress) -> Result<(), EmailStoreError> {
        let mut guard = self
            .email
            .lock()
            .map_err(|_| EmailStoreError::Unavailable("email mutex poisoned".to_string()))?;
        *guard = Some(email.clone());
        Ok(())
    }

    fn recall(&self) -> Result<Option<EmailAddress>, EmailStoreError> {
        let guard = self
            .email
            .lock()
            .map_err(|_| EmailStoreError::Unavailable("email mutex poisoned".to_string()))?;
        Ok(guard.clone())
    }
}

/// Used when no cache is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEmailStore;

impl EmailStore for NoEmailStore {
    fn remember(&self, _email: &EmailAddress) -> Result<(), EmailStoreError> {
        Ok(())
    }

    fn recall(&self) -> Result<Option<EmailAddress>, EmailStoreError> {
        Ok(None)
    }
}
