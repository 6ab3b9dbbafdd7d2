// Error types for playwright-rs-harness

use std::path::PathBuf;

use thiserror::Error;

use crate::credentials::Role;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing or driving an end-to-end session
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is missing or invalid
    ///
    /// Raised before any browser interaction: a missing credential variable,
    /// an unparsable base URL, an unknown role label, and so on.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No persisted session exists for the role
    ///
    /// The setup phase has not been run (or its output was deleted).
    #[error(
        "No persisted session for role '{role}' at {}.\n\n\
        Run the setup phase first:\n  \
        cargo xtask setup-auth --role {role}",
        path.display()
    )]
    MissingSession { role: Role, path: PathBuf },

    /// A bounded wait expired
    ///
    /// Contains what was being waited for and the bound.
    #[error("Timeout after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    /// Observed application state does not match the expectation
    #[error("Assertion failed: {0}")]
    Assertion(String),

    /// Error reported by playwright-rs
    #[error("Browser error: {0}")]
    Browser(#[from] playwright_rs::Error),

    /// The application answered a direct API call with a non-success status
    #[error("HTTP {status} from {method} {url}: {body}")]
    Http {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// Transport-level failure of a direct API call
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error with additional context
    #[error("{0}: {1}")]
    Context(String, #[source] Box<Error>),
}

impl Error {
    /// Adds context to the error
    pub fn context(self, msg: impl Into<String>) -> Self {
        Error::Context(msg.into(), Box::new(self))
    }

    /// Creates a timeout error for a wait bounded by `timeout`
    pub fn timeout(what: impl Into<String>, timeout: std::time::Duration) -> Self {
        Error::Timeout {
            what: what.into(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Returns true when the error (or the error it wraps) is an expired wait.
    ///
    /// Playwright's own timeout variants count as timeouts; its assertion
    /// timeouts count as assertions.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::Browser(playwright_rs::Error::Timeout(_))
            | Error::Browser(playwright_rs::Error::NavigationTimeout { .. }) => true,
            Error::Context(_, inner) => inner.is_timeout(),
            _ => false,
        }
    }

    /// Returns true when the error is a configuration problem, including a
    /// missing session file.
    pub fn is_config(&self) -> bool {
        match self {
            Error::Config(_) | Error::MissingSession { .. } => true,
            Error::Context(_, inner) => inner.is_config(),
            _ => false,
        }
    }
}
