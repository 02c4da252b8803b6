//! Provider response envelope and outcome classification
//!
//! Every BitQiu response carries a `code`, a `message` and an optional
//! `data` payload. The mapping from code to outcome lives here and nowhere
//! else; endpoint wrappers never interpret codes themselves.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Code the provider uses for a successful call
pub const SUCCESS_CODE: &str = "10200";

/// Code the provider uses when the session is expired or invalid
pub const SESSION_EXPIRED_CODE: &str = "10401";

/// Classification of a provider response code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The call succeeded; the payload is usable
    Success,
    /// The session is no longer valid; recoverable via reauthentication
    SessionExpired,
    /// Any other provider rejection; fatal for this call
    Failure,
}

/// Classify a provider status code into an [`Outcome`]
#[must_use]
pub fn classify(code: &str) -> Outcome {
    match code {
        SUCCESS_CODE => Outcome::Success,
        SESSION_EXPIRED_CODE => Outcome::SessionExpired,
        _ => Outcome::Failure,
    }
}

/// A parsed provider response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
    /// Cookies set by the response; the login handshake hands session
    /// credentials back this way. Populated by the transport, not serde.
    #[serde(skip)]
    pub cookies: HashMap<String, String>,
}

impl ApiEnvelope {
    /// Classify this envelope's status code
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        classify(&self.code)
    }

    /// Take the payload, substituting an empty object when absent
    #[must_use]
    pub fn into_data(self) -> Value {
        self.data.unwrap_or_else(|| Value::Object(serde_json::Map::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_table() {
        assert_eq!(classify("10200"), Outcome::Success);
        assert_eq!(classify("10401"), Outcome::SessionExpired);
        assert_eq!(classify("10404"), Outcome::Failure);
        assert_eq!(classify(""), Outcome::Failure);
        assert_eq!(classify("HTTP 502"), Outcome::Failure);
    }

    #[test]
    fn test_envelope_parsing_defaults() {
        let envelope: ApiEnvelope =
            serde_json::from_str(r#"{"code": "10200"}"#).unwrap();
        assert_eq!(envelope.outcome(), Outcome::Success);
        assert!(envelope.message.is_empty());
        assert!(envelope.data.is_none());
        assert!(envelope.cookies.is_empty());
        assert_eq!(envelope.into_data(), serde_json::json!({}));
    }

    #[test]
    fn test_envelope_parsing_full() {
        let envelope: ApiEnvelope = serde_json::from_str(
            r#"{"code": "10401", "message": "session invalid", "data": {"x": 1}}"#,
        )
        .unwrap();
        assert_eq!(envelope.outcome(), Outcome::SessionExpired);
        assert_eq!(envelope.message, "session invalid");
        assert_eq!(envelope.into_data(), serde_json::json!({"x": 1}));
    }
}
