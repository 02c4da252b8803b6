//! Error taxonomy for BitQiu operations
//!
//! Every failure surfaced by this crate is one of the variants below, so
//! callers (library users and the MCP layer alike) can branch on the kind
//! without inspecting message text.

use std::fmt;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for authentication, API and transport failures
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No valid session, QR ticket expired/denied, or the QR wait timed out
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The provider reported the session as expired or invalid.
    ///
    /// This is the single recoverable outcome: the session store has already
    /// been cleared, and the facade may re-authenticate and retry the same
    /// operation exactly once before escalating to [`Error::Authentication`].
    #[error("session expired - reauthentication required")]
    SessionExpired,

    /// The provider rejected the operation for a reason other than session
    /// expiry; code and message are passed through verbatim
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },

    /// Transport-level failure: connection error, timeout, or a response
    /// body that could not be parsed as the provider envelope
    #[error("network error: {0}")]
    Network(String),

    /// A request was rejected locally before any network call was made
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Shorthand for an [`Error::Authentication`] with a formatted reason
    pub fn auth(reason: impl Into<String>) -> Self {
        Self::Authentication(reason.into())
    }

    /// Shorthand for an [`Error::Api`] with the provider's code and message
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
        }
    }

    /// A malformed provider response, classified as a network failure
    pub fn malformed(detail: impl fmt::Display) -> Self {
        Self::Network(format!("malformed response: {detail}"))
    }

    /// Stable machine-readable kind, used for structured tool errors
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "authentication",
            Self::SessionExpired => "session_expired",
            Self::Api { .. } => "api",
            Self::Network(_) => "network",
            Self::InvalidArgument(_) => "invalid_argument",
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::auth("QR ticket denied");
        assert_eq!(err.to_string(), "authentication failed: QR ticket denied");

        let err = Error::api("10404", "directory not found");
        assert_eq!(err.to_string(), "API error 10404: directory not found");

        let err = Error::malformed("missing data field");
        assert_eq!(
            err.to_string(),
            "network error: malformed response: missing data field"
        );
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::SessionExpired.kind(), "session_expired");
        assert_eq!(Error::auth("x").kind(), "authentication");
        assert_eq!(Error::api("1", "m").kind(), "api");
        assert_eq!(Error::Network("down".into()).kind(), "network");
        assert_eq!(Error::InvalidArgument("bad".into()).kind(), "invalid_argument");
    }
}
