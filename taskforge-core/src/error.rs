use serde_json::Value;
use thiserror::Error;

/// Failure taxonomy shared by every layer of the client.
#[derive(Debug, Error)]
pub enum Error {
    /// Generic misuse: bad arguments, bad route template, unknown method name.
    #[error("{0}")]
    Failure(String),

    /// Malformed or non-representable credentials, or a temporary-credential
    /// construction violation.
    #[error("authentication failure: {0}")]
    Auth(String),

    /// Server-reported HTTP error, raised once retries are exhausted (or
    /// immediately for non-retriable 4xx responses). Carries the parsed
    /// response body so callers can diagnose without retrying blindly.
    ///
    /// Note: the services report insufficient scopes through this variant
    /// (HTTP 403), not through [`Error::Auth`]. That mirrors the upstream
    /// protocol even though it sits oddly next to `Auth`'s role.
    #[error("{message} (HTTP {status})")]
    Rest {
        message: String,
        status: u16,
        body: Value,
    },

    /// Network-level failure after retries are exhausted.
    #[error("connection failure: {0}")]
    Connection(String),

    /// Conflicting or malformed routing-key-pattern arguments.
    #[error("topic exchange failure: {0}")]
    TopicExchange(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn failure(message: impl Into<String>) -> Self {
        Error::Failure(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Error::Auth(message.into())
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Error::Connection(message.into())
    }

    pub fn topic_exchange(message: impl Into<String>) -> Self {
        Error::TopicExchange(message.into())
    }

    pub fn rest(message: impl Into<String>, status: u16, body: Value) -> Self {
        Error::Rest {
            message: message.into(),
            status,
            body,
        }
    }

    /// HTTP status code, for `Rest` failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Rest { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-provided response body, for `Rest` failures.
    pub fn body(&self) -> Option<&Value> {
        match self {
            Error::Rest { body, .. } => Some(body),
            _ => None,
        }
    }
}
