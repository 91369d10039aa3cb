//! Domain-specific error types for crew-digest

use std::fmt;

use thiserror::Error;

use crate::clients::traits::ChatError;
use crate::services::ServiceInfo;

/// How a transport failure surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Unreachable,
    RateLimited,
    Unavailable,
    Http,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransportKind::Unreachable => "unreachable",
            TransportKind::RateLimited => "rate limited",
            TransportKind::Unavailable => "unavailable",
            TransportKind::Http => "http",
        };
        f.write_str(label)
    }
}

/// Main error type for crew-digest
#[derive(Error, Debug)]
pub enum CrewDigestError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Transport error ({kind}): {message}")]
    Transport { kind: TransportKind, message: String },

    #[error("Authentication error: {message}")]
    Auth { message: String },

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CrewDigestError {
    /// Classify for remediation. Typed variants map directly; the rest fall
    /// back to matching on the rendered message.
    pub fn failure_class(&self) -> FailureClass {
        match self {
            CrewDigestError::Transport {
                kind: TransportKind::Unreachable,
                ..
            } => FailureClass::ServiceUnreachable,
            CrewDigestError::Auth { .. } => FailureClass::InvalidCredentials,
            other => FailureClass::from_message(&other.to_string()),
        }
    }
}

/// User-facing classification of a failed invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    ServiceUnreachable,
    InvalidCredentials,
    Other,
}

impl FailureClass {
    /// Classify free error text, e.g. from a transport layer we do not own
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if message.contains("Failed to fetch")
            || message.contains("NetworkError")
            || lower.contains("network")
        {
            FailureClass::ServiceUnreachable
        } else if message.contains("Invalid Groq API key")
            || message.contains("invalid_api_key")
            || message.contains("401")
        {
            FailureClass::InvalidCredentials
        } else {
            FailureClass::Other
        }
    }

    /// Remediation text shown to the user for a failed crew call
    pub fn remediation(&self, service: &ServiceInfo, host: &str, detail: &str) -> String {
        self.remediation_at(&service.url(host), service.id.as_str(), detail)
    }

    /// Remediation for any endpoint, crew or chat backend
    pub fn remediation_at(&self, url: &str, name: &str, detail: &str) -> String {
        match self {
            FailureClass::ServiceUnreachable => format!(
                "Could not reach the backend at {}.\nMake sure the {} service is running and that network settings allow the request.",
                url, name
            ),
            FailureClass::InvalidCredentials => {
                "Invalid Groq API key. Update GROQ_API_KEY and retry.".to_string()
            }
            FailureClass::Other => format!("Error: {}", detail),
        }
    }
}

impl From<anyhow::Error> for CrewDigestError {
    fn from(err: anyhow::Error) -> Self {
        CrewDigestError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CrewDigestError {
    fn from(err: serde_json::Error) -> Self {
        CrewDigestError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for CrewDigestError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_connect() || err.is_timeout() {
            TransportKind::Unreachable
        } else {
            TransportKind::Http
        };
        CrewDigestError::Transport {
            kind,
            message: format!("HTTP request failed: {}", err),
        }
    }
}

impl From<ChatError> for CrewDigestError {
    fn from(err: ChatError) -> Self {
        let message = err.to_string();
        match err {
            ChatError::MissingApiKey | ChatError::Unauthorized => {
                CrewDigestError::Auth { message }
            }
            ChatError::RateLimited => CrewDigestError::Transport {
                kind: TransportKind::RateLimited,
                message,
            },
            ChatError::Unavailable { .. } => CrewDigestError::Transport {
                kind: TransportKind::Unavailable,
                message,
            },
            ChatError::Network(_) => CrewDigestError::Transport {
                kind: TransportKind::Unreachable,
                message,
            },
            ChatError::Http { .. } => CrewDigestError::Transport {
                kind: TransportKind::Http,
                message,
            },
            ChatError::EmptyResponse | ChatError::ParseError(_) => {
                CrewDigestError::Parse { message }
            }
        }
    }
}

/// Result type alias for crew-digest operations
pub type Result<T> = std::result::Result<T, CrewDigestError>;
